//! End-to-end build tests against on-disk content fixtures.
//!
//! Every test lays out a project tree in a temp dir, runs the orchestrator
//! against a recording provisioner, and inspects what was declared.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use std::collections::BTreeMap;
use std::path::Path;

use xaas_common::config::{ConfigSource, ProjectConfig};
use xaas_common::error::XaasError;
use xaas_common::types::HttpMethod;
use xaas_graph::{ExpectedCount, Input, RecordingProvisioner, ResourceKind};
use xaas_stack::descriptor::{facts_stack, images_stack, pats_stack};
use xaas_stack::{
    BuildOptions, BuildPhase, Orchestrator, PackagingMode, PrebuiltPackager, StackRegistry,
};

const ANIMAL: &str = "cat";

struct Project {
    dir: tempfile::TempDir,
    config: ProjectConfig,
}

impl Project {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = ProjectConfig::derive(ANIMAL, dir.path());
        Self { dir, config }
    }

    fn with_facts(self, lines: &str) -> Self {
        std::fs::create_dir_all(&self.config.animal_dir).expect("mkdir");
        std::fs::write(&self.config.facts_file, lines).expect("write facts");
        self
    }

    fn with_images(self, files: &[&str], metadata: Option<&str>) -> Self {
        std::fs::create_dir_all(&self.config.image_dir).expect("mkdir");
        for file in files {
            std::fs::write(self.config.image_dir.join(file), file.as_bytes()).expect("write");
        }
        if let Some(metadata) = metadata {
            std::fs::write(self.config.metadata_path(), metadata).expect("write metadata");
        }
        self
    }

    fn with_artifacts(self, stacks: &[&str]) -> Self {
        for stack in stacks {
            let artifact = self.config.artifact_path(stack);
            std::fs::create_dir_all(artifact.parent().expect("parent")).expect("mkdir");
            std::fs::write(&artifact, b"PK").expect("write artifact");
        }
        self
    }

    fn source(&self) -> ConfigSource {
        ConfigSource::new(self.dir.path()).with_animal(ANIMAL)
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }
}

fn standard() -> Orchestrator {
    Orchestrator::new(StackRegistry::standard(false), Box::new(PrebuiltPackager))
}

fn scenario_project() -> Project {
    Project::new()
        .with_facts("A\nB\nC\n")
        .with_images(
            &["tabby.jpg", "void.jpg"],
            Some(r#"{"images": {"tabby.jpg": {"breed": "tabby"}}}"#),
        )
        .with_artifacts(&["facts", "images", "pats"])
}

fn declared_names(p: &RecordingProvisioner, kind: ResourceKind) -> Vec<String> {
    p.of_kind(kind).map(|d| d.name.to_string()).collect()
}

// ── Scenarios ──────────────────────────────────────────────────────

#[test]
fn facts_and_images_scenario() {
    let project = scenario_project();
    let mut p = RecordingProvisioner::new();
    let output = standard().build(&project.source(), &mut p).expect("build");

    assert_eq!(
        declared_names(&p, ResourceKind::TableItem),
        vec!["caas-ddb-facts-0", "caas-ddb-facts-1", "caas-ddb-facts-2"]
    );

    let objects: Vec<_> = p.of_kind(ResourceKind::BucketObject).collect();
    assert_eq!(objects.len(), 2);
    let tagged = objects
        .iter()
        .find(|d| d.name.as_str() == "caas-s3-assets-tabby.jpg")
        .expect("tabby");
    let untagged = objects
        .iter()
        .find(|d| d.name.as_str() == "caas-s3-assets-void.jpg")
        .expect("void");
    assert_eq!(
        tagged.args["tags"].get("breed").and_then(Input::as_str),
        Some("tabby")
    );
    assert_eq!(tagged.args["tags"], Input::map([("breed", "tabby")]));
    assert_eq!(untagged.args["tags"], Input::map(Vec::<(String, Input)>::new()));

    assert_eq!(output.bundle.count(ResourceKind::Function), 2);
    let routes: Vec<_> = output
        .gateway
        .routes
        .iter()
        .map(|r| (r.method, r.path.as_str()))
        .collect();
    assert_eq!(
        routes,
        vec![(HttpMethod::Get, "/facts"), (HttpMethod::Get, "/images")]
    );

    assert_eq!(p.exports().len(), 1);
    assert_eq!(
        p.resolve(&p.exports()["url"]).as_deref(),
        Some("https://caas-apigw_id.execute-api.localhost/stage/")
    );
}

#[test]
fn empty_content_still_deploys_function_and_routes() {
    let project = Project::new()
        .with_facts("")
        .with_images(&[], Some(r#"{"images": {}}"#))
        .with_artifacts(&["facts", "images"]);
    let mut p = RecordingProvisioner::new();
    let run = standard().run(&project.source(), &mut p);
    let output = run.outcome.expect("build");

    assert_eq!(output.bundle.count(ResourceKind::TableItem), 0);
    assert_eq!(output.bundle.count(ResourceKind::BucketObject), 0);
    assert_eq!(output.bundle.count(ResourceKind::Function), 2);
    assert_eq!(output.gateway.routes.len(), 2);
    assert!(run.report.stacks().iter().all(|s| s.backing_resources == 0));
}

// ── Content properties ─────────────────────────────────────────────

#[test]
fn text_source_yields_one_row_per_line_in_order() {
    let lines: Vec<String> = (0..25).map(|i| format!("fact number {i}")).collect();
    let project = Project::new()
        .with_facts(&lines.join("\n"))
        .with_images(&[], Some("{}"))
        .with_artifacts(&["facts", "images"]);
    let mut p = RecordingProvisioner::new();
    let _ = standard().build(&project.source(), &mut p).expect("build");

    let rows: Vec<_> = p.of_kind(ResourceKind::TableItem).collect();
    assert_eq!(rows.len(), 25);
    for (i, row) in rows.iter().enumerate() {
        assert_eq!(row.name.as_str(), format!("caas-ddb-facts-{i}"));
        let item: serde_json::Value =
            serde_json::from_str(row.args["item"].as_str().expect("item")).expect("json");
        assert_eq!(item["FactId"]["N"], i.to_string());
        assert_eq!(item["Text"]["S"], lines[i]);
    }
}

#[test]
fn directory_source_skips_only_metadata() {
    let project = Project::new()
        .with_facts("x\n")
        .with_images(
            &["a.png", "b.png", "c.png"],
            Some(r#"{"images": {"a.png": {"k": "1"}, "c.png": {"k": "3", "j": "x"}}}"#),
        )
        .with_artifacts(&["facts", "images"]);
    let mut p = RecordingProvisioner::new();
    let output = standard().build(&project.source(), &mut p).expect("build");

    assert_eq!(output.bundle.count(ResourceKind::BucketObject), 3);
    let tag_counts: BTreeMap<String, usize> = p
        .of_kind(ResourceKind::BucketObject)
        .map(|d| {
            let n = match &d.args["tags"] {
                Input::Map(m) => m.len(),
                other => panic!("tags not a map: {other:?}"),
            };
            (d.name.to_string(), n)
        })
        .collect();
    assert_eq!(tag_counts["caas-s3-assets-a.png"], 1);
    assert_eq!(tag_counts["caas-s3-assets-b.png"], 0);
    assert_eq!(tag_counts["caas-s3-assets-c.png"], 2);
    let key = p
        .of_kind(ResourceKind::BucketObject)
        .next()
        .and_then(|d| d.args["key"].as_str().map(str::to_string))
        .expect("key");
    assert_eq!(key, "assets/animals/cat/images/a.png");
}

#[test]
fn identifiers_are_stable_across_runs() {
    let project = scenario_project();
    let mut first = RecordingProvisioner::new();
    let mut second = RecordingProvisioner::new();
    let _ = standard().build(&project.source(), &mut first).expect("first");
    let _ = standard().build(&project.source(), &mut second).expect("second");

    let urns = |p: &RecordingProvisioner| p.declarations().iter().map(|d| d.urn()).collect::<Vec<_>>();
    assert_eq!(urns(&first), urns(&second));
    assert_eq!(first.declarations(), second.declarations());
}

// ── Dependency edges ───────────────────────────────────────────────

#[test]
fn functions_depend_on_all_their_policies() {
    let project = scenario_project();
    let mut p = RecordingProvisioner::new();
    let output = standard().build(&project.source(), &mut p).expect("build");

    for deployment in &output.deployments {
        assert!(!deployment.policies.is_empty());
        let declared = p.get(deployment.function.urn()).expect("function");
        for policy in &deployment.policies {
            assert!(declared.depends_on.contains(policy.urn()));
            assert!(p.graph().depends_on(deployment.function.urn(), policy.urn()));
        }
        assert!(p.graph().depends_on(deployment.function.urn(), deployment.role.urn()));
    }
}

#[test]
fn policies_reference_their_store_arn() {
    let project = scenario_project();
    let mut p = RecordingProvisioner::new();
    let _ = standard().build(&project.source(), &mut p).expect("build");

    let docs: BTreeMap<String, String> = p
        .of_kind(ResourceKind::RolePolicy)
        .map(|d| {
            let doc = p
                .resolve(d.args["policy"].as_output().expect("lazy"))
                .expect("resolve");
            (d.name.to_string(), doc)
        })
        .collect();
    assert!(docs["caas-lambda-facts-ddb-read-policy"].contains("arn:aws:dynamodb:::caas-ddb-facts"));
    let images = &docs["caas-lambda-images-s3-read-policy"];
    assert!(images.contains("\"arn:aws:s3:::caas-s3-assets/*\""), "{images}");
    assert!(images.contains("\"arn:aws:s3:::caas-s3-assets\""), "{images}");
}

#[test]
fn gateway_is_last_in_creation_order() {
    let project = scenario_project();
    let mut p = RecordingProvisioner::new();
    let output = standard().build(&project.source(), &mut p).expect("build");

    let order = p.graph().resolve_order().expect("acyclic");
    let pos = |urn: &xaas_graph::Urn| order.iter().position(|u| u == urn).expect("in graph");
    let gateway = pos(output.gateway.handle.urn());
    for deployment in &output.deployments {
        assert!(pos(deployment.function.urn()) < gateway);
        for policy in &deployment.policies {
            assert!(pos(policy.urn()) < pos(deployment.function.urn()));
        }
    }
}

#[test]
fn gateway_routes_concatenate_in_registration_order() {
    let project = scenario_project();
    let mut registry = StackRegistry::new();
    registry.register(images_stack()).expect("images");
    registry.register(pats_stack()).expect("pats");
    registry.register(facts_stack()).expect("facts");
    let orchestrator = Orchestrator::new(registry, Box::new(PrebuiltPackager));
    let mut p = RecordingProvisioner::new();
    let output = orchestrator.build(&project.source(), &mut p).expect("build");

    let routes: Vec<_> = output
        .gateway
        .routes
        .iter()
        .map(|r| format!("{} {}", r.method, r.path))
        .collect();
    assert_eq!(
        routes,
        vec!["GET /images", "POST /pats", "DELETE /pats", "GET /facts"]
    );
    let expected: usize = orchestrator.registry().iter().map(|s| s.routes.len()).sum();
    assert_eq!(output.gateway.routes.len(), expected);
}

// ── Failures ───────────────────────────────────────────────────────

#[test]
fn missing_metadata_aborts_before_images_function() {
    let project = Project::new()
        .with_facts("A\n")
        .with_images(&["a.jpg"], None)
        .with_artifacts(&["facts", "images"]);
    let mut p = RecordingProvisioner::new();
    let run = standard().run(&project.source(), &mut p);

    assert!(matches!(run.outcome, Err(XaasError::ContentLoad { .. })));
    assert_eq!(
        run.report.failed_at(),
        Some(&BuildPhase::Ingesting { stack: "images".into() })
    );
    assert!(declared_names(&p, ResourceKind::BucketObject).is_empty());
    assert!(declared_names(&p, ResourceKind::Bucket).is_empty());
    assert_eq!(declared_names(&p, ResourceKind::Function), vec!["caas-lambda-facts"]);
    assert!(declared_names(&p, ResourceKind::RestApi).is_empty());
}

#[test]
fn missing_fact_file_aborts_whole_build() {
    let project = Project::new()
        .with_images(&["a.jpg"], Some("{}"))
        .with_artifacts(&["facts", "images"]);
    let mut p = RecordingProvisioner::new();
    let run = standard().run(&project.source(), &mut p);

    assert!(matches!(run.outcome, Err(XaasError::ContentLoad { .. })));
    assert!(p.declarations().is_empty());
    assert!(!run.report.is_done());
}

#[test]
fn provisioner_rejection_is_resource_creation_error() {
    let project = scenario_project();
    let mut p = RecordingProvisioner::failing_on(ResourceKind::RestApi);
    let run = standard().run(&project.source(), &mut p);

    assert!(matches!(run.outcome, Err(XaasError::ResourceCreation { .. })));
    assert_eq!(run.report.failed_at(), Some(&BuildPhase::GatewayComposing));
    assert_eq!(declared_names(&p, ResourceKind::Function).len(), 2);
    assert!(p.exports().is_empty());
}

#[test]
fn missing_artifact_is_build_error() {
    let project = Project::new()
        .with_facts("A\n")
        .with_images(&[], Some("{}"))
        .with_artifacts(&["facts"]);
    let mut p = RecordingProvisioner::new();
    let run = standard().run(&project.source(), &mut p);

    match run.outcome {
        Err(XaasError::Build { stack, .. }) => assert_eq!(stack, "images"),
        other => panic!("expected build error, got {other:?}"),
    }
    assert_eq!(
        run.report.failed_at(),
        Some(&BuildPhase::Deploying { stack: "images".into() })
    );
}

#[test]
fn invalid_animal_is_configuration_error() {
    let project = scenario_project();
    let source = ConfigSource::new(project.root()).with_animal("../etc");
    let mut p = RecordingProvisioner::new();
    let run = standard().run(&source, &mut p);

    assert!(matches!(run.outcome, Err(XaasError::Configuration { .. })));
    assert_eq!(run.report.failed_at(), Some(&BuildPhase::ResolvingConfig));
    assert!(p.declarations().is_empty());
}

// ── Post-hoc validation ────────────────────────────────────────────

#[test]
fn bundle_matches_expected_counts_and_naming() {
    let project = scenario_project();
    let options = BuildOptions {
        include_token_stack: true,
        packaging: PackagingMode::Prebuilt,
    };
    let mut p = RecordingProvisioner::new();
    let output = Orchestrator::from_options(options)
        .build(&project.source(), &mut p)
        .expect("build");

    let expected = BTreeMap::from([
        (ResourceKind::Table, ExpectedCount::Exactly(2)),
        (ResourceKind::TableItem, ExpectedCount::Dynamic),
        (ResourceKind::Bucket, ExpectedCount::Exactly(1)),
        (ResourceKind::BucketPublicAccessBlock, ExpectedCount::Exactly(1)),
        (ResourceKind::BucketPolicy, ExpectedCount::Exactly(1)),
        (ResourceKind::BucketObject, ExpectedCount::Dynamic),
        (ResourceKind::Role, ExpectedCount::Exactly(3)),
        (ResourceKind::RolePolicy, ExpectedCount::Exactly(3)),
        (ResourceKind::RolePolicyAttachment, ExpectedCount::Exactly(3)),
        (ResourceKind::Function, ExpectedCount::Exactly(3)),
        (ResourceKind::RestApi, ExpectedCount::Exactly(1)),
    ]);
    assert_eq!(StackRegistry::standard(true).expected_counts(), expected);
    let report = output.bundle.count_report(&expected);
    assert!(report.is_clean(), "\n{report}");
    assert!(output.bundle.name_violations().is_empty());
    assert_eq!(output.bundle.total(), p.declarations().len());
}

#[test]
fn uppercase_animal_still_yields_lowercase_names() {
    let project = Project::new();
    let config = ProjectConfig::derive("Cat", project.root());
    std::fs::create_dir_all(&config.image_dir).expect("mkdir");
    std::fs::write(&config.facts_file, "A\n").expect("facts");
    std::fs::write(config.image_dir.join("Big Cat.JPG"), "x").expect("image");
    std::fs::write(config.metadata_path(), "{}").expect("meta");
    for stack in ["facts", "images"] {
        let artifact = config.artifact_path(stack);
        std::fs::create_dir_all(artifact.parent().expect("parent")).expect("mkdir");
        std::fs::write(&artifact, b"PK").expect("artifact");
    }

    let source = ConfigSource::new(project.root()).with_animal("Cat");
    let mut p = RecordingProvisioner::new();
    let output = standard().build(&source, &mut p).expect("build");
    assert!(output.bundle.name_violations().is_empty());
    assert_eq!(
        declared_names(&p, ResourceKind::BucketObject),
        vec!["caas-s3-assets-big-cat.jpg"]
    );
}
