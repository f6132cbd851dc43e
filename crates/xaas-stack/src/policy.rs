//! Policy composition: pure templating over a lazily resolved ARN.

use serde::Serialize;
use xaas_graph::{Output, ResourceHandle};

use crate::descriptor::PolicyTemplate;

/// Placeholder replaced by the store's ARN.
pub const ARN_PLACEHOLDER: &str = "{arn}";

/// A policy document bound to one store, attached later to a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyDocument {
    /// Suffix used to name the role policy.
    pub name_suffix: String,
    /// Document text with the store reference spliced in.
    pub document: Output,
}

impl PolicyDocument {
    /// Binds `template` to the ARN of `store`.
    ///
    /// The grammar of the resulting document is not checked.
    #[must_use]
    pub fn compose(template: &PolicyTemplate, store: &ResourceHandle) -> Self {
        Self {
            name_suffix: template.name_suffix.clone(),
            document: Output::interpolate(&template.template, ARN_PLACEHOLDER, &store.arn()),
        }
    }
}
