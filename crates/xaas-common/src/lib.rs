//! # xaas-common
//!
//! Shared types, error definitions, configuration resolution, and
//! constants used across the entire xaas workspace.
//!
//! This crate is the leaf of the dependency graph: it depends on no other
//! internal crate and provides the primitives every other crate builds on.

pub mod config;
pub mod constants;
pub mod error;
pub mod types;
