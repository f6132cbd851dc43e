//! Route aggregation and the gateway declaration.

use serde::Serialize;
use xaas_common::error::Result;
use xaas_graph::{Declaration, Input, Output, ResourceHandle, ResourceKind};

use crate::context::BuildContext;
use crate::function::{FunctionDeployment, RouteDefinition};

/// Name of the gateway endpoint export.
pub const URL_EXPORT: &str = "url";

/// Collects routes from deployed functions in registration order.
#[derive(Debug, Clone, Default)]
pub struct RouteAggregator {
    routes: Vec<RouteDefinition>,
}

impl RouteAggregator {
    /// Creates an empty aggregator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends every route of `deployment`.
    pub fn collect(&mut self, deployment: &FunctionDeployment) {
        self.routes.extend(deployment.routes.iter().cloned());
    }

    /// Collected routes.
    #[must_use]
    pub fn routes(&self) -> &[RouteDefinition] {
        &self.routes
    }

    /// Number of collected routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether nothing was collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Consumes the aggregator.
    #[must_use]
    pub fn into_routes(self) -> Vec<RouteDefinition> {
        self.routes
    }
}

/// The declared gateway.
#[derive(Debug, Clone, Serialize)]
pub struct Gateway {
    /// Gateway resource.
    pub handle: ResourceHandle,
    /// Public endpoint, resolved later.
    pub url: Output,
    /// Routes served, in aggregation order.
    pub routes: Vec<RouteDefinition>,
}

/// Declares `<acronym>-apigw` over `routes` and exports its URL.
///
/// Each route references its target function's ARN, so the gateway
/// depends on every function it routes to.
///
/// # Errors
///
/// Returns [`xaas_common::error::XaasError::ResourceCreation`] if the
/// gateway or its export is rejected.
pub fn compose(ctx: &mut BuildContext<'_>, routes: Vec<RouteDefinition>) -> Result<Gateway> {
    if routes.is_empty() {
        tracing::warn!("gateway has no routes");
    }
    let entries: Vec<Input> = routes
        .iter()
        .map(|r| {
            Input::map([
                ("path", Input::from(r.path.as_str())),
                ("method", Input::from(r.method.as_str())),
                ("eventHandler", Input::from(r.target.arn())),
            ])
        })
        .collect();

    let name = ctx.name(&["apigw"]);
    let handle = ctx.declare(Declaration::new(ResourceKind::RestApi, name).arg("routes", entries))?;
    let url = handle.attr(URL_EXPORT);
    ctx.export(URL_EXPORT, url.clone())?;
    tracing::info!(gateway = %handle.name(), routes = routes.len(), "gateway declared");

    Ok(Gateway {
        handle,
        url,
        routes,
    })
}
