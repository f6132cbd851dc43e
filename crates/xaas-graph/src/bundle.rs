//! Per-kind accumulator of every declared resource handle.
//!
//! The bundle is threaded through the build by reference and returned at
//! the end. Nothing in the provisioning path reads it back; it exists for
//! post-hoc validation.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::kind::ResourceKind;
use crate::provisioner::ResourceHandle;

/// All handles created during one build, grouped by kind.
#[derive(Debug, Clone, Default, Serialize)]
pub struct InfrastructureBundle {
    handles: BTreeMap<ResourceKind, Vec<ResourceHandle>>,
}

impl InfrastructureBundle {
    /// Creates an empty bundle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a handle under its kind.
    pub fn record(&mut self, handle: ResourceHandle) {
        self.handles.entry(handle.kind()).or_default().push(handle);
    }

    /// Handles of one kind, in declaration order.
    #[must_use]
    pub fn handles(&self, kind: ResourceKind) -> &[ResourceHandle] {
        self.handles.get(&kind).map_or(&[], Vec::as_slice)
    }

    /// Number of handles of one kind.
    #[must_use]
    pub fn count(&self, kind: ResourceKind) -> usize {
        self.handles(kind).len()
    }

    /// Number of handles across all kinds.
    #[must_use]
    pub fn total(&self) -> usize {
        self.handles.values().map(Vec::len).sum()
    }

    /// Kinds with at least one handle, and their handles.
    pub fn iter(&self) -> impl Iterator<Item = (ResourceKind, &[ResourceHandle])> {
        self.handles.iter().map(|(k, v)| (*k, v.as_slice()))
    }

    /// Handles whose logical name falls outside `[a-z0-9.-]`.
    ///
    /// Names minted by `ResourceName::new` always pass. This guards
    /// handles whose names were deserialized rather than built.
    #[must_use]
    pub fn name_violations(&self) -> Vec<&ResourceHandle> {
        self.handles
            .values()
            .flatten()
            .filter(|h| !h.name().is_sanitized())
            .collect()
    }

    /// Compares actual per-kind counts against `expected`.
    ///
    /// Kinds present in the bundle but absent from `expected` are reported
    /// as unexpected.
    #[must_use]
    pub fn count_report(&self, expected: &BTreeMap<ResourceKind, ExpectedCount>) -> CountReport {
        let mut rows: Vec<CountRow> = expected
            .iter()
            .map(|(&kind, &expected)| CountRow {
                kind,
                expected: Some(expected),
                actual: self.count(kind),
            })
            .collect();
        rows.extend(
            self.handles
                .keys()
                .filter(|k| !expected.contains_key(*k))
                .map(|&kind| CountRow {
                    kind,
                    expected: None,
                    actual: self.count(kind),
                }),
        );
        rows.sort_by_key(|r| r.kind);
        CountReport { rows }
    }
}

/// Expected number of resources of one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExpectedCount {
    /// Exactly this many.
    Exactly(usize),
    /// Depends on external content; any count is accepted.
    Dynamic,
}

impl ExpectedCount {
    /// Whether `actual` satisfies the expectation.
    #[must_use]
    pub const fn accepts(self, actual: usize) -> bool {
        match self {
            Self::Exactly(n) => n == actual,
            Self::Dynamic => true,
        }
    }
}

impl fmt::Display for ExpectedCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exactly(n) => write!(f, "{n}"),
            Self::Dynamic => write!(f, "dynamic"),
        }
    }
}

/// One line of a [`CountReport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CountRow {
    /// Resource kind.
    pub kind: ResourceKind,
    /// Expectation, or `None` if the kind was not expected at all.
    pub expected: Option<ExpectedCount>,
    /// Number of handles recorded.
    pub actual: usize,
}

impl CountRow {
    /// Whether the row matches its expectation.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        match self.expected {
            Some(expected) => expected.accepts(self.actual),
            None => false,
        }
    }
}

/// Expected versus actual resource counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountReport {
    rows: Vec<CountRow>,
}

impl CountReport {
    /// All rows, ordered by kind.
    #[must_use]
    pub fn rows(&self) -> &[CountRow] {
        &self.rows
    }

    /// Rows that do not match.
    pub fn mismatches(&self) -> impl Iterator<Item = &CountRow> {
        self.rows.iter().filter(|r| !r.is_ok())
    }

    /// Whether every row matches.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.mismatches().next().is_none()
    }
}

impl fmt::Display for CountReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<26} {:>9} {:>7}", "KIND", "EXPECTED", "ACTUAL")?;
        for row in &self.rows {
            let expected = row
                .expected
                .map_or_else(|| "-".to_string(), |e| e.to_string());
            let marker = if row.is_ok() { "" } else { "  !" };
            writeln!(
                f,
                "{:<26} {:>9} {:>7}{marker}",
                row.kind.to_string(),
                expected,
                row.actual
            )?;
        }
        Ok(())
    }
}
