//! Function deployment: role, baseline attachment, packaged code, role
//! policies, the function itself, and its gateway routes.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;
use xaas_common::constants;
use xaas_common::error::Result;
use xaas_common::types::HttpMethod;
use xaas_graph::{Declaration, Input, Output, ResourceHandle, ResourceKind};

use crate::context::BuildContext;
use crate::descriptor::ServedRoute;
use crate::packager::Packager;
use crate::policy::PolicyDocument;

/// A route bound to the function that serves it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteDefinition {
    /// Request path.
    pub path: String,
    /// Request method.
    pub method: HttpMethod,
    /// Serving function.
    pub target: ResourceHandle,
}

/// Everything one deployed function consists of.
#[derive(Debug, Clone, Serialize)]
pub struct FunctionDeployment {
    /// Stack name.
    pub stack: String,
    /// Execution role.
    pub role: ResourceHandle,
    /// Baseline execution policy attachment.
    pub baseline: ResourceHandle,
    /// Attached role policies.
    pub policies: Vec<ResourceHandle>,
    /// The function.
    pub function: ResourceHandle,
    /// Packaged code artifact.
    pub artifact: PathBuf,
    /// Gateway-ready routes targeting the function.
    pub routes: Vec<RouteDefinition>,
}

/// Inputs of one deployment.
#[derive(Debug, Clone)]
pub struct FunctionRequest<'a> {
    /// Stack name.
    pub stack: &'a str,
    /// Composed policy documents.
    pub policies: Vec<PolicyDocument>,
    /// Environment variables.
    pub env: BTreeMap<String, Output>,
    /// Routes to bind to the function.
    pub routes: &'a [ServedRoute],
}

/// Deploys one function.
///
/// The function declaration depends explicitly on every role policy, so
/// it is never complete before its policies are.
///
/// # Errors
///
/// Returns [`xaas_common::error::XaasError::Build`] if packaging fails, or
/// [`xaas_common::error::XaasError::ResourceCreation`] if any declaration
/// is rejected.
pub fn deploy(
    ctx: &mut BuildContext<'_>,
    packager: &dyn Packager,
    request: FunctionRequest<'_>,
) -> Result<FunctionDeployment> {
    let prefix = ctx.name(&["lambda", request.stack]);

    let role = ctx.declare(
        Declaration::new(ResourceKind::Role, prefix.child("exec-role"))
            .arg("assumeRolePolicy", constants::ASSUME_ROLE_POLICY),
    )?;

    let baseline = ctx.declare(
        Declaration::new(
            ResourceKind::RolePolicyAttachment,
            role.name().child("cwpolicy"),
        )
        .arg("role", role.attr("name"))
        .arg("policyArn", constants::BASELINE_EXECUTION_POLICY_ARN),
    )?;

    let artifact = packager.compile(request.stack, ctx.config())?;

    let mut policies = Vec::with_capacity(request.policies.len());
    for policy in request.policies {
        policies.push(ctx.declare(
            Declaration::new(ResourceKind::RolePolicy, prefix.child(&policy.name_suffix))
                .arg("role", role.attr("name"))
                .arg("policy", policy.document),
        )?);
    }

    let variables = Input::map(request.env);
    let function = ctx.declare(
        Declaration::new(ResourceKind::Function, prefix)
            .arg("handler", constants::FUNCTION_HANDLER)
            .arg("role", role.arn())
            .arg("runtime", constants::FUNCTION_RUNTIME)
            .arg(
                "code",
                Input::map([("archive", artifact.display().to_string())]),
            )
            .arg("environment", Input::map([("variables", variables)]))
            .depends_on(&policies),
    )?;
    tracing::info!(
        stack = request.stack,
        function = %function.name(),
        policies = policies.len(),
        "function declared"
    );

    let routes = request
        .routes
        .iter()
        .map(|r| RouteDefinition {
            path: r.path.clone(),
            method: r.method,
            target: function.clone(),
        })
        .collect();

    Ok(FunctionDeployment {
        stack: request.stack.to_string(),
        role,
        baseline,
        policies,
        function,
        artifact,
        routes,
    })
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use xaas_common::config::ProjectConfig;
    use xaas_common::error::XaasError;
    use xaas_graph::RecordingProvisioner;

    use super::*;

    struct FixedPackager;

    impl Packager for FixedPackager {
        fn compile(&self, stack: &str, config: &ProjectConfig) -> Result<PathBuf> {
            Ok(config.artifact_path(stack))
        }
    }

    struct BrokenPackager;

    impl Packager for BrokenPackager {
        fn compile(&self, stack: &str, _config: &ProjectConfig) -> Result<PathBuf> {
            Err(XaasError::Build {
                stack: stack.to_string(),
                message: "compiler exploded".into(),
            })
        }
    }

    fn routes() -> Vec<ServedRoute> {
        vec![ServedRoute {
            path: "/facts".into(),
            method: HttpMethod::Get,
        }]
    }

    fn policy(suffix: &str) -> PolicyDocument {
        PolicyDocument {
            name_suffix: suffix.into(),
            document: Output::literal("{}"),
        }
    }

    #[test]
    fn function_depends_on_every_policy() {
        let config = ProjectConfig::derive("cat", Path::new("/proj"));
        let mut p = RecordingProvisioner::new();
        let mut ctx = BuildContext::new(&config, &mut p);
        let routes = routes();
        let deployment = deploy(
            &mut ctx,
            &FixedPackager,
            FunctionRequest {
                stack: "facts",
                policies: vec![policy("ddb-read-policy"), policy("extra-policy")],
                env: BTreeMap::from([("FACTS_TABLE_NAME".into(), Output::literal("t"))]),
                routes: &routes,
            },
        )
        .expect("deploy");
        drop(ctx);

        assert_eq!(deployment.role.name().as_str(), "caas-lambda-facts-exec-role");
        assert_eq!(
            deployment.baseline.name().as_str(),
            "caas-lambda-facts-exec-role-cwpolicy"
        );
        assert_eq!(deployment.function.name().as_str(), "caas-lambda-facts");
        assert_eq!(deployment.policies.len(), 2);
        for policy in &deployment.policies {
            assert!(p.graph().depends_on(deployment.function.urn(), policy.urn()));
        }
        assert_eq!(deployment.routes.len(), 1);
        assert_eq!(deployment.routes[0].target, deployment.function);

        let function = p.get(deployment.function.urn()).expect("declared");
        assert_eq!(function.args["runtime"].as_str(), Some("go1.x"));
        let vars = function.args["environment"].get("variables").expect("vars");
        assert_eq!(
            vars.get("FACTS_TABLE_NAME").and_then(Input::as_output),
            Some(&Output::literal("t"))
        );
    }

    #[test]
    fn packaging_failure_stops_before_function() {
        let config = ProjectConfig::derive("cat", Path::new("/proj"));
        let mut p = RecordingProvisioner::new();
        let mut ctx = BuildContext::new(&config, &mut p);
        let routes = routes();
        let err = deploy(
            &mut ctx,
            &BrokenPackager,
            FunctionRequest {
                stack: "facts",
                policies: vec![policy("ddb-read-policy")],
                env: BTreeMap::new(),
                routes: &routes,
            },
        )
        .expect_err("build error");
        assert!(matches!(err, XaasError::Build { .. }));
        let bundle = ctx.into_bundle();
        assert_eq!(bundle.count(ResourceKind::Function), 0);
        assert_eq!(bundle.count(ResourceKind::RolePolicy), 0);
        assert_eq!(bundle.count(ResourceKind::Role), 1);
    }

    #[test]
    fn rejected_role_is_resource_creation_error() {
        let config = ProjectConfig::derive("cat", Path::new("/proj"));
        let mut p = RecordingProvisioner::failing_on(ResourceKind::Role);
        let mut ctx = BuildContext::new(&config, &mut p);
        let err = deploy(
            &mut ctx,
            &FixedPackager,
            FunctionRequest {
                stack: "facts",
                policies: Vec::new(),
                env: BTreeMap::new(),
                routes: &[],
            },
        )
        .expect_err("rejected");
        assert!(matches!(err, XaasError::ResourceCreation { .. }));
    }
}
