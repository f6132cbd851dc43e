//! Content items produced by ingestion.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use xaas_common::types::Sha256Hash;

/// Tag mapping attached to a content item.
pub type Tags = BTreeMap<String, String>;

/// Identity of an item within its source.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ContentKey {
    /// Zero-based line ordinal of a text source.
    Index(usize),
    /// File name relative to a directory source.
    File(String),
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "{i}"),
            Self::File(name) => write!(f, "{name}"),
        }
    }
}

/// The data carried by an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Payload {
    /// One line of text, without its terminator.
    Text(String),
    /// A file on disk, referenced by path and content digest.
    File {
        /// Absolute or project-relative path of the file.
        path: PathBuf,
        /// SHA-256 of the file contents.
        digest: Sha256Hash,
    },
}

/// One unit of external input, materialized later as exactly one
/// backing resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    /// Position or file name within the source.
    pub key: ContentKey,
    /// Item data.
    pub payload: Payload,
    /// Tags from the sidecar metadata; empty when none apply.
    pub tags: Tags,
}

impl ContentItem {
    /// Builds a text item at line `index`.
    #[must_use]
    pub fn line(index: usize, text: impl Into<String>) -> Self {
        Self {
            key: ContentKey::Index(index),
            payload: Payload::Text(text.into()),
            tags: Tags::new(),
        }
    }

    /// Returns the text of a line item.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match &self.payload {
            Payload::Text(t) => Some(t),
            Payload::File { .. } => None,
        }
    }

    /// Returns the file name of a directory item.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        match &self.key {
            ContentKey::File(name) => Some(name),
            ContentKey::Index(_) => None,
        }
    }
}
