//! Lazily resolved resource references.
//!
//! Declaring a resource returns immediately, but its concrete attributes
//! (identifier, ARN, URL) are only known once the provisioning engine has
//! created it. An [`Output`] stands in for such a value. Graph building
//! only wires outputs into arguments and never branches on their value.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;
use xaas_common::types::ResourceName;

use crate::kind::ResourceKind;

/// Unique address of a declared resource: its kind plus logical name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Urn {
    /// Resource kind.
    pub kind: ResourceKind,
    /// Logical name, unique within the kind.
    pub name: ResourceName,
}

impl Urn {
    /// Creates an address.
    #[must_use]
    pub const fn new(kind: ResourceKind, name: ResourceName) -> Self {
        Self { kind, name }
    }
}

impl fmt::Display for Urn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "urn:xaas:{}::{}", self.kind.type_token(), self.name)
    }
}

impl Serialize for Urn {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A string value that may depend on not-yet-created resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "output", rename_all = "snake_case")]
pub enum Output {
    /// A value known at declaration time.
    Literal {
        /// The value.
        value: String,
    },
    /// An attribute of another resource.
    Attribute {
        /// Resource the attribute belongs to.
        urn: Urn,
        /// Attribute name (`id`, `arn`, `name`, ...).
        attribute: String,
    },
    /// Concatenation of other outputs.
    Concat {
        /// Parts, joined without separator.
        parts: Vec<Self>,
    },
}

impl Output {
    /// A value known now.
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal {
            value: value.into(),
        }
    }

    /// An attribute of `urn`, resolved later.
    pub fn attribute(urn: Urn, attribute: impl Into<String>) -> Self {
        Self::Attribute {
            urn,
            attribute: attribute.into(),
        }
    }

    /// Splices `value` into `template` at every occurrence of `placeholder`.
    #[must_use]
    pub fn interpolate(template: &str, placeholder: &str, value: &Self) -> Self {
        let mut parts = Vec::new();
        for (i, chunk) in template.split(placeholder).enumerate() {
            if i > 0 {
                parts.push(value.clone());
            }
            if !chunk.is_empty() {
                parts.push(Self::literal(chunk));
            }
        }
        match parts.len() {
            0 => Self::literal(""),
            1 => parts.remove(0),
            _ => Self::Concat { parts },
        }
    }

    /// Every resource this value depends on.
    #[must_use]
    pub fn references(&self) -> BTreeSet<&Urn> {
        let mut refs = BTreeSet::new();
        self.collect_references(&mut refs);
        refs
    }

    fn collect_references<'a>(&'a self, refs: &mut BTreeSet<&'a Urn>) {
        match self {
            Self::Literal { .. } => {}
            Self::Attribute { urn, .. } => {
                let _ = refs.insert(urn);
            }
            Self::Concat { parts } => {
                for part in parts {
                    part.collect_references(refs);
                }
            }
        }
    }

    /// Whether the value is known without any resource being created.
    #[must_use]
    pub fn is_known(&self) -> bool {
        self.references().is_empty()
    }

    /// Resolves the value given a lookup for resource attributes.
    ///
    /// Returns `None` if any referenced attribute is unknown.
    pub fn resolve<F>(&self, lookup: &F) -> Option<String>
    where
        F: Fn(&Urn, &str) -> Option<String>,
    {
        match self {
            Self::Literal { value } => Some(value.clone()),
            Self::Attribute { urn, attribute } => lookup(urn, attribute),
            Self::Concat { parts } => parts.iter().map(|p| p.resolve(lookup)).collect(),
        }
    }
}

impl From<&str> for Output {
    fn from(value: &str) -> Self {
        Self::literal(value)
    }
}

impl From<String> for Output {
    fn from(value: String) -> Self {
        Self::literal(value)
    }
}

/// A resource argument: plain data, a lazy output, or a tree of either.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Input {
    /// Plain JSON data known now.
    Value(serde_json::Value),
    /// A lazily resolved string.
    Output(Output),
    /// A list of inputs.
    List(Vec<Self>),
    /// A string-keyed map of inputs.
    Map(BTreeMap<String, Self>),
}

impl Input {
    /// Builds a map input from key/value pairs.
    pub fn map<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Self>,
    {
        Self::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Every resource this argument depends on.
    #[must_use]
    pub fn references(&self) -> BTreeSet<&Urn> {
        let mut refs = BTreeSet::new();
        self.collect_references(&mut refs);
        refs
    }

    fn collect_references<'a>(&'a self, refs: &mut BTreeSet<&'a Urn>) {
        match self {
            Self::Value(_) => {}
            Self::Output(output) => output.collect_references(refs),
            Self::List(items) => {
                for item in items {
                    item.collect_references(refs);
                }
            }
            Self::Map(entries) => {
                for item in entries.values() {
                    item.collect_references(refs);
                }
            }
        }
    }

    /// Returns the plain string if this is a known string value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Value(serde_json::Value::String(s)) => Some(s),
            Self::Output(Output::Literal { value }) => Some(value),
            _ => None,
        }
    }

    /// Returns the lazy output if this is one.
    #[must_use]
    pub const fn as_output(&self) -> Option<&Output> {
        match self {
            Self::Output(output) => Some(output),
            _ => None,
        }
    }

    /// Returns the entry under `key` if this is a map.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Self> {
        match self {
            Self::Map(entries) => entries.get(key),
            _ => None,
        }
    }

    /// Returns the items if this is a list.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<Output> for Input {
    fn from(value: Output) -> Self {
        Self::Output(value)
    }
}

impl From<&str> for Input {
    fn from(value: &str) -> Self {
        Self::Value(serde_json::Value::String(value.to_string()))
    }
}

impl From<String> for Input {
    fn from(value: String) -> Self {
        Self::Value(serde_json::Value::String(value))
    }
}

impl From<bool> for Input {
    fn from(value: bool) -> Self {
        Self::Value(serde_json::Value::Bool(value))
    }
}

impl From<u32> for Input {
    fn from(value: u32) -> Self {
        Self::Value(serde_json::Value::from(value))
    }
}

impl From<serde_json::Value> for Input {
    fn from(value: serde_json::Value) -> Self {
        Self::Value(value)
    }
}

impl From<Vec<Input>> for Input {
    fn from(value: Vec<Input>) -> Self {
        Self::List(value)
    }
}
