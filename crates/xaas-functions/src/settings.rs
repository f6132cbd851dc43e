//! Runtime settings of the deployed functions.

use serde::Serialize;
use xaas_common::constants;

/// Store names and prefixes a function reads from its environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionSettings {
    /// Fact table name.
    pub facts_table: String,
    /// Image bucket name.
    pub images_bucket: String,
    /// Image object key prefix.
    pub images_prefix: String,
    /// Token table name.
    pub pat_table: String,
    /// Token prefix.
    pub acronym: String,
}

impl Default for FunctionSettings {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl FunctionSettings {
    /// Reads settings through `lookup`; unset or empty values fall back
    /// to the documented defaults.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        Self {
            facts_table: get(constants::FACTS_TABLE_ENV, constants::FACTS_TABLE_DEFAULT),
            images_bucket: get(constants::IMAGES_BUCKET_ENV, constants::IMAGES_BUCKET_DEFAULT),
            images_prefix: get(constants::IMAGES_PREFIX_ENV, constants::IMAGES_PREFIX_DEFAULT),
            pat_table: get(constants::PAT_TABLE_ENV, constants::PAT_TABLE_DEFAULT),
            acronym: get(constants::ACRONYM_ENV, constants::ACRONYM_DEFAULT),
        }
    }
}
