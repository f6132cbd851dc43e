//! # xaas-graph
//!
//! Primitives for describing a graph of cloud resources without creating
//! any of them.
//!
//! Handles:
//! - **Kind**: the closed set of resource types the stacks declare.
//! - **Output**: references whose value only the provisioning engine can
//!   resolve, and the argument trees built from them.
//! - **Provisioner**: the boundary to the external provisioning engine,
//!   plus an in-memory recording implementation.
//! - **Graph**: dependency graph construction and topological ordering.
//! - **Bundle**: per-kind accumulator of every declared handle, with
//!   post-hoc validation helpers.

pub mod bundle;
pub mod graph;
pub mod kind;
pub mod output;
pub mod provisioner;

pub use bundle::{CountReport, ExpectedCount, InfrastructureBundle};
pub use graph::DependencyGraph;
pub use kind::ResourceKind;
pub use output::{Input, Output, Urn};
pub use provisioner::{Declaration, Provisioner, RecordingProvisioner, ResourceHandle};
