//! Dependency graph management using `petgraph`.
//!
//! Nodes are resource addresses. Edges point from a dependency to its
//! dependent so that a topological sort yields creation order.

use std::collections::HashMap;

use petgraph::graph::NodeIndex;
use xaas_common::error::{Result, XaasError};

use crate::output::Urn;

/// A dependency graph of declared resources.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    graph: petgraph::Graph<Urn, ()>,
    nodes: HashMap<Urn, NodeIndex>,
}

impl DependencyGraph {
    /// Creates an empty dependency graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a resource node, returning the existing node if already present.
    pub fn add_resource(&mut self, urn: Urn) -> NodeIndex {
        if let Some(&idx) = self.nodes.get(&urn) {
            return idx;
        }
        let idx = self.graph.add_node(urn.clone());
        let _ = self.nodes.insert(urn, idx);
        idx
    }

    /// Adds a dependency edge: `dependent` depends on `dependency`.
    ///
    /// Both nodes are created if missing.
    pub fn add_dependency(&mut self, dependent: &Urn, dependency: &Urn) {
        let to = self.add_resource(dependent.clone());
        let from = self.add_resource(dependency.clone());
        let _ = self.graph.update_edge(from, to, ());
    }

    /// Number of resources in the graph.
    #[must_use]
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Whether the graph has no resources.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Whether `dependent` transitively depends on `dependency`.
    #[must_use]
    pub fn depends_on(&self, dependent: &Urn, dependency: &Urn) -> bool {
        match (self.nodes.get(dependency), self.nodes.get(dependent)) {
            (Some(&from), Some(&to)) if from != to => {
                petgraph::algo::has_path_connecting(&self.graph, from, to, None)
            }
            _ => false,
        }
    }

    /// Direct dependencies of `urn`.
    #[must_use]
    pub fn direct_dependencies(&self, urn: &Urn) -> Vec<&Urn> {
        let Some(&idx) = self.nodes.get(urn) else {
            return Vec::new();
        };
        let mut deps: Vec<&Urn> = self
            .graph
            .neighbors_directed(idx, petgraph::Direction::Incoming)
            .filter_map(|n| self.graph.node_weight(n))
            .collect();
        deps.sort();
        deps
    }

    /// Returns a creation order: dependencies before their dependents.
    ///
    /// # Errors
    ///
    /// Returns an error if the graph contains cycles.
    pub fn resolve_order(&self) -> Result<Vec<Urn>> {
        match petgraph::algo::toposort(&self.graph, None) {
            Ok(indices) => Ok(indices
                .iter()
                .filter_map(|&idx| self.graph.node_weight(idx).cloned())
                .collect()),
            Err(cycle) => Err(XaasError::config(format!(
                "cyclic dependency detected in resource graph at {}",
                self.graph
                    .node_weight(cycle.node_id())
                    .map_or_else(|| "?".to_string(), ToString::to_string)
            ))),
        }
    }
}
