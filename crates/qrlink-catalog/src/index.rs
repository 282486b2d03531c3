use qrlink_core::blob::{self, BlobStore};
use qrlink_core::error::Result;
use qrlink_core::{ConflictField, Lookup, QrError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, trace};

/// Stored value of an index entry: the storage key of the owning record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct IndexEntry {
    key: String,
}

/// Maintains the code -> record and slug -> record uniqueness indexes.
///
/// The manager has no notion of a record: it maps codes and slugs to opaque
/// storage keys. Callers keep the indexes in step with record content.
///
/// Uniqueness relies on [`BlobStore::set_if_absent`]. Whether that is atomic
/// depends on the backend; with the trait's default check-then-set two
/// concurrent reservations of the same code can both succeed, the later one
/// overwriting the earlier entry.
#[derive(Debug)]
pub struct IndexManager<S> {
    store: Arc<S>,
}

impl<S> Clone for IndexManager<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

fn conflict_field(lookup: &Lookup) -> ConflictField {
    match lookup {
        Lookup::ByCode(_) => ConflictField::Code,
        Lookup::BySlug(_) => ConflictField::FriendlySlug,
    }
}

impl<S: BlobStore> IndexManager<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Returns the storage key of the record owning `lookup`, if any.
    pub async fn lookup(&self, lookup: &Lookup) -> Result<Option<String>> {
        trace!(%lookup, "looking up index entry");
        let entry: Option<IndexEntry> = blob::get_json(&*self.store, &lookup.index_key()).await?;
        Ok(entry.map(|entry| entry.key))
    }

    /// Maps `lookup` to `record_key`.
    ///
    /// Fails with [`QrError::Conflict`] if the code or slug is already
    /// mapped, to any record including `record_key` itself.
    pub async fn reserve(&self, lookup: &Lookup, record_key: &str) -> Result<()> {
        let entry = IndexEntry {
            key: record_key.to_owned(),
        };

        if blob::set_json_if_absent(&*self.store, &lookup.index_key(), &entry).await? {
            debug!(%lookup, record_key, "reserved index entry");
            Ok(())
        } else {
            debug!(%lookup, "index entry already taken");
            Err(QrError::conflict(conflict_field(lookup), lookup.as_str()))
        }
    }

    /// Removes the mapping of `lookup`. Releasing an absent entry is a no-op.
    pub async fn release(&self, lookup: &Lookup) -> Result<()> {
        let removed = self.store.delete(&lookup.index_key()).await?;
        debug!(%lookup, removed, "released index entry");
        Ok(())
    }

    /// Removes the mapping of `lookup` only while it points at `record_key`.
    ///
    /// Returns whether an entry was removed. An entry already taken over by
    /// another record is left alone. The check and the delete are separate
    /// calls, with the same race as the default `set_if_absent`.
    pub async fn release_if_held_by(&self, lookup: &Lookup, record_key: &str) -> Result<bool> {
        match self.lookup(lookup).await? {
            Some(key) if key == record_key => {
                let removed = self.store.delete(&lookup.index_key()).await?;
                debug!(%lookup, record_key, removed, "released index entry");
                Ok(removed)
            }
            Some(key) => {
                debug!(%lookup, record_key, holder = %key, "index entry held by another record");
                Ok(false)
            }
            None => Ok(false),
        }
    }
}
