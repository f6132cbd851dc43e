//! Storage seams used by the handlers, plus in-memory implementations.

use std::collections::{BTreeMap, BTreeSet};

use xaas_common::error::Result;
use xaas_content::{ContentItem, ContentKey, Tags};

/// Read access to the fact table.
pub trait FactStore {
    /// Number of stored facts.
    ///
    /// # Errors
    ///
    /// Returns [`xaas_common::error::XaasError::Store`] on backend failure.
    fn count(&self) -> Result<usize>;

    /// Fact text by id.
    ///
    /// # Errors
    ///
    /// Returns [`xaas_common::error::XaasError::Store`] on backend failure.
    fn get(&self, id: usize) -> Result<Option<String>>;
}

/// Read access to the image bucket.
pub trait ObjectStore {
    /// Keys under `prefix`, in key order.
    ///
    /// # Errors
    ///
    /// Returns [`xaas_common::error::XaasError::Store`] on backend failure.
    fn list(&self, prefix: &str) -> Result<Vec<String>>;

    /// Tags of one object.
    ///
    /// # Errors
    ///
    /// Returns [`xaas_common::error::XaasError::Store`] on backend failure.
    fn tags(&self, key: &str) -> Result<Tags>;
}

/// Read/write access to the token table.
pub trait TokenStore {
    /// Whether `token` is stored.
    ///
    /// # Errors
    ///
    /// Returns [`xaas_common::error::XaasError::Store`] on backend failure.
    fn contains(&self, token: &str) -> Result<bool>;

    /// Stores `token`.
    ///
    /// # Errors
    ///
    /// Returns [`xaas_common::error::XaasError::Store`] on backend failure.
    fn insert(&mut self, token: &str) -> Result<()>;

    /// Deletes `token`; deleting an absent token is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`xaas_common::error::XaasError::Store`] on backend failure.
    fn remove(&mut self, token: &str) -> Result<()>;
}

/// Facts held in memory, id = position.
#[derive(Debug, Clone, Default)]
pub struct MemoryFactStore {
    facts: Vec<String>,
}

impl MemoryFactStore {
    /// Store over `facts`.
    #[must_use]
    pub const fn new(facts: Vec<String>) -> Self {
        Self { facts }
    }

    /// Store seeded from ingested line items.
    #[must_use]
    pub fn from_items(items: &[ContentItem]) -> Self {
        Self::new(
            items
                .iter()
                .filter_map(|i| i.text().map(str::to_string))
                .collect(),
        )
    }
}

impl FactStore for MemoryFactStore {
    fn count(&self) -> Result<usize> {
        Ok(self.facts.len())
    }

    fn get(&self, id: usize) -> Result<Option<String>> {
        Ok(self.facts.get(id).cloned())
    }
}

/// Objects held in memory: key to tags.
#[derive(Debug, Clone, Default)]
pub struct MemoryObjectStore {
    objects: BTreeMap<String, Tags>,
}

impl MemoryObjectStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an object.
    pub fn insert(&mut self, key: impl Into<String>, tags: Tags) {
        let _ = self.objects.insert(key.into(), tags);
    }

    /// Store seeded from ingested directory items, keyed `<prefix><file>`.
    #[must_use]
    pub fn from_items(prefix: &str, items: &[ContentItem]) -> Self {
        let mut store = Self::new();
        for item in items {
            if let ContentKey::File(name) = &item.key {
                store.insert(format!("{prefix}{name}"), item.tags.clone());
            }
        }
        store
    }
}

impl ObjectStore for MemoryObjectStore {
    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .objects
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn tags(&self, key: &str) -> Result<Tags> {
        Ok(self.objects.get(key).cloned().unwrap_or_default())
    }
}

/// Tokens held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    tokens: BTreeSet<String>,
}

impl MemoryTokenStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether no token is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl TokenStore for MemoryTokenStore {
    fn contains(&self, token: &str) -> Result<bool> {
        Ok(self.tokens.contains(token))
    }

    fn insert(&mut self, token: &str) -> Result<()> {
        let _ = self.tokens.insert(token.to_string());
        Ok(())
    }

    fn remove(&mut self, token: &str) -> Result<()> {
        let _ = self.tokens.remove(token);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fact_store_from_lines() {
        let items = vec![ContentItem::line(0, "a"), ContentItem::line(1, "b")];
        let store = MemoryFactStore::from_items(&items);
        assert_eq!(store.count().expect("count"), 2);
        assert_eq!(store.get(1).expect("get").as_deref(), Some("b"));
        assert_eq!(store.get(2).expect("get"), None);
    }

    #[test]
    fn object_store_filters_by_prefix() {
        let mut store = MemoryObjectStore::new();
        store.insert("animals/cat/images/a.jpg", Tags::new());
        store.insert("other/b.jpg", Tags::new());
        assert_eq!(
            store.list("animals/cat/images/").expect("list"),
            vec!["animals/cat/images/a.jpg"]
        );
    }
}
