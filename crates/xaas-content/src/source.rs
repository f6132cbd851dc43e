//! Content source descriptors.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use xaas_common::error::Result;

use crate::item::ContentItem;
use crate::{directory, text};

/// Where a stack's content comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentSource {
    /// One item per line of a UTF-8 text file.
    Lines {
        /// Path of the text file.
        path: PathBuf,
    },
    /// One item per file in a directory, tagged from a sidecar mapping.
    Directory {
        /// Directory to list.
        path: PathBuf,
        /// Name of the sidecar metadata file inside `path`.
        metadata_file: String,
    },
    /// The stack has no external content.
    None,
}

impl ContentSource {
    /// Short label used in logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Lines { .. } => "lines",
            Self::Directory { .. } => "directory",
            Self::None => "none",
        }
    }
}

/// Loads every item of `source`, in source order.
///
/// # Errors
///
/// Returns [`xaas_common::error::XaasError::ContentLoad`] if any part of
/// the source is missing or malformed; no partial result is returned.
pub fn ingest(source: &ContentSource) -> Result<Vec<ContentItem>> {
    let items = match source {
        ContentSource::Lines { path } => text::read_lines(path)?,
        ContentSource::Directory {
            path,
            metadata_file,
        } => directory::read_directory(path, metadata_file)?,
        ContentSource::None => Vec::new(),
    };
    tracing::info!(source = source.kind(), count = items.len(), "content ingested");
    Ok(items)
}
