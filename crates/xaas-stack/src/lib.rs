//! # xaas-stack
//!
//! Turns registered stack descriptors and their external content into a
//! dependency-ordered graph of cloud resources.
//!
//! Handles:
//! - **Descriptor**: data-driven registry of stacks.
//! - **Synthesizer**: one backing resource per content item.
//! - **Policy**: access documents bound to a store's lazily resolved ARN.
//! - **Packager**: the boundary to function code compilation.
//! - **Function**: role, policies, function, and route entries per stack.
//! - **Gateway**: route aggregation and the single HTTP entry point.
//! - **Orchestrator**: the build state machine.

pub mod context;
pub mod descriptor;
pub mod function;
pub mod gateway;
pub mod orchestrator;
pub mod packager;
pub mod policy;
pub mod synthesizer;

pub use context::BuildContext;
pub use descriptor::{StackDescriptor, StackRegistry};
pub use orchestrator::{BuildOptions, BuildOutput, BuildPhase, BuildReport, BuildRun, Orchestrator};
pub use packager::{MakePackager, Packager, PackagingMode, PrebuiltPackager};
