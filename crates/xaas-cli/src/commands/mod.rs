//! CLI command definitions and dispatch.

pub mod invoke;
pub mod pat;
pub mod plan;
pub mod synth;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use xaas_common::config::ConfigSource;
use xaas_common::constants;
use xaas_stack::{BuildOptions, PackagingMode};

/// xaas: resource-graph orchestrator for a small serverless API.
#[derive(Parser, Debug)]
#[command(name = "xaas", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Log output format (filter with `RUST_LOG`).
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

/// Log output format.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per line.
    Json,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the resource graph and print it in creation order.
    Plan(plan::PlanArgs),
    /// Build the resource graph and emit it as JSON.
    Synth(synth::SynthArgs),
    /// Generate personal access tokens.
    Pat(pat::PatArgs),
    /// Run one function's handler locally against ingested content.
    Invoke(invoke::InvokeArgs),
}

/// Where the project and its product line come from.
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Product line to deploy.
    #[arg(long, env = constants::ANIMAL_ENV_VAR)]
    pub animal: Option<String>,

    /// Stack configuration file with an `animal` key.
    #[arg(long)]
    pub stack_file: Option<PathBuf>,

    /// Directory containing `assets/`.
    #[arg(long, default_value = ".")]
    pub project_root: PathBuf,
}

impl ConfigArgs {
    /// Converts the flags into a resolver source.
    pub fn source(&self) -> ConfigSource {
        let mut source = ConfigSource::new(&self.project_root);
        if let Some(animal) = &self.animal {
            source = source.with_animal(animal);
        }
        if let Some(path) = &self.stack_file {
            source = source.with_stack_file(path);
        }
        source
    }
}

/// Flags shared by commands that run a build.
#[derive(Args, Debug, Clone)]
pub struct BuildArgs {
    /// Project configuration.
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Also build the token issuance stack.
    #[arg(long)]
    pub with_pats: bool,

    /// Use existing function artifacts instead of running `make build`.
    #[arg(long)]
    pub prebuilt: bool,
}

impl BuildArgs {
    /// Converts the flags into build options.
    pub const fn options(&self) -> BuildOptions {
        BuildOptions {
            include_token_stack: self.with_pats,
            packaging: if self.prebuilt {
                PackagingMode::Prebuilt
            } else {
                PackagingMode::Make
            },
        }
    }
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Plan(args) => plan::execute(&args),
        Command::Synth(args) => synth::execute(&args),
        Command::Pat(args) => pat::execute(&args),
        Command::Invoke(args) => invoke::execute(&args),
    }
}
