//! Build orchestration.
//!
//! A build walks a fixed state machine:
//!
//! ```text
//! Init -> ResolvingConfig
//!      -> per stack: Ingesting -> Synthesizing -> PolicyComposing -> Deploying
//!      -> Aggregating -> GatewayComposing -> Done
//! ```
//!
//! Any failure moves to `Failed` and stops all further declarations. The
//! error is returned unchanged; nothing is retried.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use xaas_common::config::{ConfigSource, ProjectConfig};
use xaas_common::error::Result;
use xaas_graph::{InfrastructureBundle, Output, Provisioner};

use crate::context::BuildContext;
use crate::descriptor::{EnvValue, StackDescriptor, StackRegistry};
use crate::function::{self, FunctionDeployment, FunctionRequest};
use crate::gateway::{self, Gateway, RouteAggregator};
use crate::packager::{Packager, PackagingMode};
use crate::policy::PolicyDocument;
use crate::synthesizer::{self, BackingStore};

/// One state of the build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum BuildPhase {
    /// Nothing has happened yet.
    Init,
    /// Resolving project configuration.
    ResolvingConfig,
    /// Loading a stack's content.
    Ingesting {
        /// Stack name.
        stack: String,
    },
    /// Declaring a stack's store and backing resources.
    Synthesizing {
        /// Stack name.
        stack: String,
    },
    /// Binding a stack's policy templates.
    PolicyComposing {
        /// Stack name.
        stack: String,
    },
    /// Declaring a stack's function.
    Deploying {
        /// Stack name.
        stack: String,
    },
    /// Collecting routes from every function.
    Aggregating,
    /// Declaring the gateway.
    GatewayComposing,
    /// Build complete.
    Done,
    /// Build aborted.
    Failed {
        /// Phase the failure happened in.
        at: Box<Self>,
    },
}

impl fmt::Display for BuildPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init => write!(f, "init"),
            Self::ResolvingConfig => write!(f, "resolving config"),
            Self::Ingesting { stack } => write!(f, "ingesting {stack}"),
            Self::Synthesizing { stack } => write!(f, "synthesizing {stack}"),
            Self::PolicyComposing { stack } => write!(f, "composing policies for {stack}"),
            Self::Deploying { stack } => write!(f, "deploying {stack}"),
            Self::Aggregating => write!(f, "aggregating routes"),
            Self::GatewayComposing => write!(f, "composing gateway"),
            Self::Done => write!(f, "done"),
            Self::Failed { at } => write!(f, "failed while {at}"),
        }
    }
}

/// Per-stack outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackSummary {
    /// Stack name.
    pub stack: String,
    /// Items ingested.
    pub content_items: usize,
    /// Backing resources declared.
    pub backing_resources: usize,
    /// Routes contributed.
    pub routes: usize,
}

/// Record of a build's state transitions.
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    phases: Vec<BuildPhase>,
    stacks: Vec<StackSummary>,
}

impl Default for BuildReport {
    fn default() -> Self {
        Self {
            phases: vec![BuildPhase::Init],
            stacks: Vec::new(),
        }
    }
}

impl BuildReport {
    fn enter(&mut self, phase: BuildPhase) {
        tracing::debug!(phase = %phase, "build phase");
        self.phases.push(phase);
    }

    fn fail(&mut self) {
        let at = self.current().clone();
        self.phases.push(BuildPhase::Failed { at: Box::new(at) });
    }

    /// Every phase entered, in order.
    #[must_use]
    pub fn phases(&self) -> &[BuildPhase] {
        &self.phases
    }

    /// The latest phase.
    #[must_use]
    pub fn current(&self) -> &BuildPhase {
        self.phases.last().unwrap_or(&BuildPhase::Init)
    }

    /// Phase the build failed in, if it failed.
    #[must_use]
    pub fn failed_at(&self) -> Option<&BuildPhase> {
        match self.current() {
            BuildPhase::Failed { at } => Some(&**at),
            _ => None,
        }
    }

    /// Whether the build reached `Done`.
    #[must_use]
    pub fn is_done(&self) -> bool {
        *self.current() == BuildPhase::Done
    }

    /// Per-stack outcomes of completed stacks.
    #[must_use]
    pub fn stacks(&self) -> &[StackSummary] {
        &self.stacks
    }
}

/// Knobs for a standard build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BuildOptions {
    /// Register the token issuance stack.
    pub include_token_stack: bool,
    /// How function artifacts are obtained.
    pub packaging: PackagingMode,
}

/// Results of a successful build.
#[derive(Debug, Clone, Serialize)]
pub struct BuildOutput {
    /// Resolved configuration.
    pub config: ProjectConfig,
    /// Every declared handle, grouped by kind.
    pub bundle: InfrastructureBundle,
    /// One deployment per stack, in registration order.
    pub deployments: Vec<FunctionDeployment>,
    /// The gateway.
    pub gateway: Gateway,
}

impl BuildOutput {
    /// The exported gateway endpoint.
    #[must_use]
    pub const fn url(&self) -> &Output {
        &self.gateway.url
    }
}

/// A finished build attempt: its report and its outcome.
#[derive(Debug)]
pub struct BuildRun {
    /// State transitions.
    pub report: BuildReport,
    /// The output, or the first error raised.
    pub outcome: Result<BuildOutput>,
}

/// Drives the registered stacks through the build state machine.
pub struct Orchestrator {
    registry: StackRegistry,
    packager: Box<dyn Packager>,
}

impl Orchestrator {
    /// Creates an orchestrator over `registry`.
    #[must_use]
    pub fn new(registry: StackRegistry, packager: Box<dyn Packager>) -> Self {
        Self { registry, packager }
    }

    /// Creates an orchestrator over the standard registry.
    #[must_use]
    pub fn from_options(options: BuildOptions) -> Self {
        Self::new(
            StackRegistry::standard(options.include_token_stack),
            options.packaging.packager(),
        )
    }

    /// Registered stacks.
    #[must_use]
    pub const fn registry(&self) -> &StackRegistry {
        &self.registry
    }

    /// Runs a build and returns its output.
    ///
    /// # Errors
    ///
    /// Returns the first configuration, content, packaging, or resource
    /// creation error raised.
    pub fn build(
        &self,
        source: &ConfigSource,
        provisioner: &mut dyn Provisioner,
    ) -> Result<BuildOutput> {
        self.run(source, provisioner).outcome
    }

    /// Runs a build and returns both its report and its outcome.
    pub fn run(&self, source: &ConfigSource, provisioner: &mut dyn Provisioner) -> BuildRun {
        let mut report = BuildReport::default();
        let outcome = self.drive(source, provisioner, &mut report);
        match &outcome {
            Ok(output) => {
                report.enter(BuildPhase::Done);
                tracing::info!(
                    resources = output.bundle.total(),
                    stacks = output.deployments.len(),
                    "build complete"
                );
            }
            Err(e) => {
                report.fail();
                tracing::error!(
                    error = %e,
                    fatal = e.is_fatal_to_build(),
                    phase = %report.current(),
                    "build aborted"
                );
            }
        }
        BuildRun { report, outcome }
    }

    fn drive(
        &self,
        source: &ConfigSource,
        provisioner: &mut dyn Provisioner,
        report: &mut BuildReport,
    ) -> Result<BuildOutput> {
        report.enter(BuildPhase::ResolvingConfig);
        let config = ProjectConfig::resolve(source)?;
        tracing::info!(
            animal = %config.animal,
            acronym = %config.acronym,
            stacks = ?self.registry.names(),
            "configuration resolved"
        );

        let mut ctx = BuildContext::new(&config, provisioner);
        let mut deployments = Vec::with_capacity(self.registry.len());
        for stack in self.registry.iter() {
            let (deployment, summary) = self.build_stack(&mut ctx, stack, report)?;
            deployments.push(deployment);
            report.stacks.push(summary);
        }

        report.enter(BuildPhase::Aggregating);
        let mut aggregator = RouteAggregator::new();
        for deployment in &deployments {
            aggregator.collect(deployment);
        }

        report.enter(BuildPhase::GatewayComposing);
        let gateway = gateway::compose(&mut ctx, aggregator.into_routes())?;

        let bundle = ctx.into_bundle();
        Ok(BuildOutput {
            config,
            bundle,
            deployments,
            gateway,
        })
    }

    fn build_stack(
        &self,
        ctx: &mut BuildContext<'_>,
        stack: &StackDescriptor,
        report: &mut BuildReport,
    ) -> Result<(FunctionDeployment, StackSummary)> {
        let name = stack.name.clone();

        report.enter(BuildPhase::Ingesting { stack: name.clone() });
        let items = xaas_content::ingest(&stack.content.source(ctx.config()))?;

        report.enter(BuildPhase::Synthesizing { stack: name.clone() });
        let store = synthesizer::declare_store(ctx, stack)?;
        let backing = synthesizer::synthesize(ctx, stack, &store, &items)?;

        report.enter(BuildPhase::PolicyComposing { stack: name.clone() });
        let policies: Vec<PolicyDocument> = stack
            .policies
            .iter()
            .map(|t| PolicyDocument::compose(t, &store.handle))
            .collect();

        report.enter(BuildPhase::Deploying { stack: name.clone() });
        let env = environment(stack, &store, ctx.config());
        let deployment = function::deploy(
            ctx,
            self.packager.as_ref(),
            FunctionRequest {
                stack: &stack.name,
                policies,
                env,
                routes: &stack.routes,
            },
        )?;

        let summary = StackSummary {
            stack: name,
            content_items: items.len(),
            backing_resources: backing.len(),
            routes: deployment.routes.len(),
        };
        Ok((deployment, summary))
    }
}

fn environment(
    stack: &StackDescriptor,
    store: &BackingStore,
    config: &ProjectConfig,
) -> BTreeMap<String, Output> {
    stack
        .env
        .iter()
        .map(|binding| {
            let value = match &binding.value {
                EnvValue::StoreName => store.physical_name.clone(),
                EnvValue::ObjectKeyPrefix => Output::literal(config.object_key_prefix.as_str()),
                EnvValue::Acronym => Output::literal(config.acronym.as_str()),
                EnvValue::Literal(text) => Output::literal(text.as_str()),
            };
            (binding.key.clone(), value)
        })
        .collect()
}
