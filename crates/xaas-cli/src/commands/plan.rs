//! `xaas plan`: display the resources a deployment would create.

use clap::Args;
use xaas_graph::RecordingProvisioner;
use xaas_stack::{BuildOutput, Orchestrator};

use super::BuildArgs;
use crate::output;

/// Arguments for the `plan` command.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Build flags.
    #[command(flatten)]
    pub build: BuildArgs,
}

/// Executes the `plan` command.
///
/// Runs a full build against the recording provisioner, then prints the
/// resources in creation order with their dependencies, a per-kind count
/// check, and the gateway endpoint.
///
/// # Errors
///
/// Returns an error if any build phase fails.
pub fn execute(args: &PlanArgs) -> anyhow::Result<()> {
    let orchestrator = Orchestrator::from_options(args.build.options());
    let mut provisioner = RecordingProvisioner::new();
    let run = orchestrator.run(&args.build.config.source(), &mut provisioner);

    let built = match run.outcome {
        Ok(built) => built,
        Err(e) => {
            if let Some(phase) = run.report.failed_at() {
                println!("Build {phase}.");
            }
            return Err(e.into());
        }
    };

    println!(
        "Deployment Plan for: {} ({})",
        built.config.animal, built.config.acronym
    );
    println!("{}", output::rule());
    println!();

    let graph = provisioner.graph();
    let order = graph.resolve_order()?;
    for urn in &order {
        println!("  + {:<24} {}", urn.kind.to_string(), urn.name);
        let deps = graph.direct_dependencies(urn);
        if !deps.is_empty() {
            let names: Vec<String> = deps.iter().map(|d| d.name.to_string()).collect();
            println!("      after: {}", names.join(", "));
        }
    }

    println!();
    println!("  Stacks:");
    for summary in run.report.stacks() {
        println!(
            "    {:<8} {} item(s), {} backing resource(s), {} route(s)",
            summary.stack, summary.content_items, summary.backing_resources, summary.routes
        );
    }

    println!();
    let report = built
        .bundle
        .count_report(&orchestrator.registry().expected_counts());
    print!("{report}");
    for row in report.mismatches() {
        tracing::warn!(kind = %row.kind, actual = row.actual, "unexpected resource count");
    }
    for handle in built.bundle.name_violations() {
        tracing::warn!(name = %handle.name(), "resource name is not sanitized");
    }

    println!();
    println!("  Endpoint: {}", endpoint(&built));
    println!("  {} resource(s) will be created.", order.len());

    Ok(())
}

/// The gateway endpoint as the plan shows it, unresolved.
fn endpoint(built: &BuildOutput) -> String {
    output::describe_output(built.url())
}
