use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use qrlink_core::blob::{BlobStore, Result};
use std::collections::BTreeMap;
use std::sync::Arc;

/// [`BlobStore`] over a sharded concurrent map. Clones share the map.
///
/// [`BlobStore::set_if_absent`] is atomic here: the entry API holds the
/// shard lock between the check and the insert.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBlobStore {
    storage: Arc<DashMap<String, Vec<u8>>>,
}

impl InMemoryBlobStore {
    /// Creates a new in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys across all namespaces.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// A sorted copy of every key and blob, for assertions in tests.
    pub fn snapshot(&self) -> BTreeMap<String, Vec<u8>> {
        self.storage
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.storage.get(key).map(|entry| entry.value().clone()))
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        self.storage.insert(key.to_owned(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.storage.remove(key).is_some())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .storage
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| entry.key().clone())
            .collect())
    }

    async fn set_if_absent(&self, key: &str, value: Vec<u8>) -> Result<bool> {
        match self.storage.entry(key.to_owned()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(vacant) => {
                vacant.insert(value);
                Ok(true)
            }
        }
    }
}
