//! `xaas invoke`: run one stack's function locally.
//!
//! The handler runs against an in-memory store seeded from the same
//! content a build would ingest, so responses reflect what a fresh
//! deployment would serve.

use clap::Args;
use xaas_common::config::ProjectConfig;
use xaas_common::types::HttpMethod;
use xaas_functions::store::{MemoryFactStore, MemoryObjectStore, MemoryTokenStore};
use xaas_functions::{
    FactsHandler, FunctionSettings, Handler, ImagesHandler, PatsHandler, Request, Response,
};
use xaas_stack::StackRegistry;
use xaas_stack::descriptor::{Backing, ContentLocation, StackDescriptor};

use super::ConfigArgs;
use crate::output;

/// Arguments for the `invoke` command.
#[derive(Args, Debug)]
pub struct InvokeArgs {
    /// Stack whose function to run (`facts`, `images`, `pats`).
    pub stack: String,

    /// Request method.
    #[arg(long, short = 'X', default_value = "GET", value_parser = parse_method)]
    pub method: HttpMethod,

    /// Query parameter, `KEY=VALUE`. Repeatable.
    #[arg(long = "query", short = 'q', value_parser = output::parse_pair)]
    pub query: Vec<(String, String)>,

    /// Request header, `KEY=VALUE`. Repeatable.
    #[arg(long = "header", short = 'H', value_parser = output::parse_pair)]
    pub headers: Vec<(String, String)>,

    /// Project configuration.
    #[command(flatten)]
    pub config: ConfigArgs,
}

fn parse_method(raw: &str) -> Result<HttpMethod, String> {
    raw.parse().map_err(|e: xaas_common::error::XaasError| e.to_string())
}

/// Executes the `invoke` command.
///
/// # Errors
///
/// Returns an error if the stack is unknown, the configuration cannot be
/// resolved, or its content cannot be loaded.
pub fn execute(args: &InvokeArgs) -> anyhow::Result<()> {
    let registry = StackRegistry::standard(true);
    let Some(stack) = registry.get(&args.stack) else {
        anyhow::bail!(
            "unknown stack \"{}\" (expected one of: {})",
            args.stack,
            registry.names().join(", ")
        );
    };
    let config = ProjectConfig::resolve(&args.config.source())?;

    let mut request = Request::new(args.method);
    for (key, value) in &args.query {
        request = request.with_query(key, value);
    }
    for (key, value) in &args.headers {
        request = request.with_header(key, value);
    }

    let settings = settings(stack, &config, |key| std::env::var(key).ok());
    tracing::debug!(?settings, "function settings");
    let response = invoke(stack, &config, &settings, &request)?;
    tracing::debug!(stack = %stack.name, status = response.status, "invoked");
    println!("{} {}", response.status, args.method);
    println!("{}", response.body);
    Ok(())
}

/// Settings the stack's function would see when deployed from `config`.
///
/// Values from `env` win; unset names fall back to the stack's
/// config-derived environment, then to the documented defaults.
fn settings<F>(stack: &StackDescriptor, config: &ProjectConfig, env: F) -> FunctionSettings
where
    F: Fn(&str) -> Option<String>,
{
    let derived = stack.local_environment(config);
    FunctionSettings::from_lookup(|key| {
        env(key)
            .filter(|v| !v.is_empty())
            .or_else(|| derived.get(key).cloned())
    })
}

/// Seeds the store a stack's function reads and handles one request.
fn invoke(
    stack: &StackDescriptor,
    config: &ProjectConfig,
    settings: &FunctionSettings,
    request: &Request,
) -> anyhow::Result<Response> {
    let items = xaas_content::ingest(&stack.content.source(config))?;
    let mut rng = rand::thread_rng();
    let response = match (&stack.backing, &stack.content) {
        (Backing::Table { .. }, ContentLocation::None) => {
            PatsHandler::new(MemoryTokenStore::new(), &settings.acronym).handle(request, &mut rng)
        }
        (Backing::Table { .. }, _) => {
            FactsHandler::new(MemoryFactStore::from_items(&items)).handle(request, &mut rng)
        }
        (Backing::PublicBucket { .. }, _) => {
            let store = MemoryObjectStore::from_items(&settings.images_prefix, &items);
            ImagesHandler::new(store, &settings.images_bucket, &settings.images_prefix)
                .handle(request, &mut rng)
        }
    };
    Ok(response)
}
