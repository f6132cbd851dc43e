//! Directory sources with a JSON sidecar tag mapping.
//!
//! The sidecar has the shape `{"images": {"<file>": {"<tag>": "<value>"}}}`.
//! It is loaded once per directory and is never itself a content item.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use xaas_common::constants::IMAGE_METADATA_ROOT_KEY;
use xaas_common::error::{Result, XaasError};
use xaas_common::types::Sha256Hash;

use crate::item::{ContentItem, ContentKey, Payload, Tags};

/// Parsed sidecar mapping: file name to tag mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Metadata {
    #[serde(rename = "images", default)]
    entries: BTreeMap<String, Tags>,
}

impl Metadata {
    /// Tags for `file_name`, or an empty mapping.
    #[must_use]
    pub fn tags_for(&self, file_name: &str) -> Tags {
        self.entries.get(file_name).cloned().unwrap_or_default()
    }

    /// Number of files the sidecar describes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the sidecar describes no files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Loads the sidecar metadata file.
///
/// # Errors
///
/// Returns [`XaasError::ContentLoad`] if the file is missing or is not a
/// valid mapping.
pub fn load_metadata(path: &Path) -> Result<Metadata> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| XaasError::content(path, format!("cannot load metadata file: {e}")))?;
    let metadata: Metadata = serde_json::from_str(&raw).map_err(|e| {
        XaasError::content(
            path,
            format!("malformed metadata (expected {{\"{IMAGE_METADATA_ROOT_KEY}\": {{file: {{tag: value}}}}}}): {e}"),
        )
    })?;
    tracing::debug!(path = %path.display(), entries = metadata.len(), "loaded metadata");
    Ok(metadata)
}

/// Lists `dir` and returns one item per regular file except the sidecar.
///
/// Items are sorted by file name. Sub-directories are ignored.
///
/// # Errors
///
/// Returns [`XaasError::ContentLoad`] if the directory cannot be listed,
/// the sidecar is missing or malformed, a file name is not UTF-8, or a
/// file cannot be hashed.
pub fn read_directory(dir: &Path, metadata_file: &str) -> Result<Vec<ContentItem>> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| XaasError::content(dir, format!("cannot list directory: {e}")))?;
    let metadata = load_metadata(&dir.join(metadata_file))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry =
            entry.map_err(|e| XaasError::content(dir, format!("cannot list directory: {e}")))?;
        let path = entry.path();
        if !path.is_file() {
            tracing::debug!(path = %path.display(), "skipping non-file entry");
            continue;
        }
        let name = entry
            .file_name()
            .into_string()
            .map_err(|raw| XaasError::content(&path, format!("file name {raw:?} is not UTF-8")))?;
        if name == metadata_file {
            continue;
        }
        files.push((name, path));
    }
    files.sort_by(|a, b| a.0.cmp(&b.0));

    let items = files
        .into_iter()
        .map(|(name, path)| {
            let digest = Sha256Hash::of_file(&path)
                .map_err(|e| XaasError::content(&path, e.to_string()))?;
            Ok(ContentItem {
                tags: metadata.tags_for(&name),
                key: ContentKey::File(name),
                payload: Payload::File { path, digest },
            })
        })
        .collect::<Result<Vec<_>>>()?;

    tracing::debug!(dir = %dir.display(), count = items.len(), "read directory content");
    Ok(items)
}
