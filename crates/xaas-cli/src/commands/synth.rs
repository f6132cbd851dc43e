//! `xaas synth`: emit the resource graph as JSON for a provisioning engine.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use serde::Serialize;
use xaas_common::config::ProjectConfig;
use xaas_graph::{Declaration, Output, RecordingProvisioner, Urn};
use xaas_stack::Orchestrator;

use super::BuildArgs;

/// Arguments for the `synth` command.
#[derive(Args, Debug)]
pub struct SynthArgs {
    /// Build flags.
    #[command(flatten)]
    pub build: BuildArgs,

    /// Write the document here instead of stdout.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

/// The synthesized document.
#[derive(Debug, Serialize)]
struct Synthesis<'a> {
    config: &'a ProjectConfig,
    resources: &'a [Declaration],
    order: Vec<Urn>,
    exports: &'a BTreeMap<String, Output>,
}

/// Executes the `synth` command.
///
/// # Errors
///
/// Returns an error if the build fails or the document cannot be written.
pub fn execute(args: &SynthArgs) -> anyhow::Result<()> {
    let orchestrator = Orchestrator::from_options(args.build.options());
    let mut provisioner = RecordingProvisioner::new();
    let built = orchestrator.build(&args.build.config.source(), &mut provisioner)?;

    let document = Synthesis {
        config: &built.config,
        resources: provisioner.declarations(),
        order: provisioner.graph().resolve_order()?,
        exports: provisioner.exports(),
    };
    let json = serde_json::to_string_pretty(&document)?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), resources = document.resources.len(), "synthesized");
        }
        None => println!("{json}"),
    }
    Ok(())
}
