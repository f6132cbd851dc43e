//! # xaas-content
//!
//! Loads the external content that backs each stack.
//!
//! Handles:
//! - **Item**: the [`ContentItem`](item::ContentItem) unit handed to the synthesizer.
//! - **Text**: one item per line of a UTF-8 text file.
//! - **Directory**: one item per file, tagged from a JSON sidecar mapping.
//! - **Source**: the descriptor selecting one of the above.
//!
//! Ingestion is all-or-nothing: a failure anywhere in a source yields an
//! error and no items.

pub mod directory;
pub mod item;
pub mod source;
pub mod text;

pub use item::{ContentItem, ContentKey, Payload, Tags};
pub use source::{ContentSource, ingest};
