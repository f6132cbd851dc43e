//! Line-delimited text sources.

use std::io::{BufRead, BufReader};
use std::path::Path;

use xaas_common::error::{Result, XaasError};

use crate::item::ContentItem;

/// Reads `path` and returns one item per line, indexed from zero.
///
/// Line terminators (`\n` or `\r\n`) are stripped. A trailing newline does
/// not produce an extra empty item; blank lines in the middle do.
///
/// # Errors
///
/// Returns [`XaasError::ContentLoad`] if the file cannot be opened or a
/// line cannot be read (including invalid UTF-8). No items are returned
/// in that case.
pub fn read_lines(path: &Path) -> Result<Vec<ContentItem>> {
    let file = std::fs::File::open(path)
        .map_err(|e| XaasError::content(path, format!("cannot open text file: {e}")))?;

    let items = BufReader::new(file)
        .lines()
        .enumerate()
        .map(|(index, line)| {
            line.map(|text| ContentItem::line(index, text)).map_err(|e| {
                XaasError::content(path, format!("read failed at line {}: {e}", index + 1))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    tracing::debug!(path = %path.display(), count = items.len(), "read text content");
    Ok(items)
}
