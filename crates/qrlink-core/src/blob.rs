use crate::error::StorageError;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Type alias for blob store results.
pub type Result<T> = std::result::Result<T, StorageError>;

/// A plain key-value blob store.
///
/// This is the only persistence contract the catalog relies on. It offers
/// no transactions, no unique constraints and no secondary indexes; the
/// catalog builds those on top of it. Keys are full storage keys, already
/// carrying their namespace prefix (see [`crate::keys`]).
#[async_trait]
pub trait BlobStore: Send + Sync + 'static {
    /// Reads the blob stored under `key`.
    ///
    /// Returns `Ok(None)` if the key does not exist.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Writes `value` under `key`, replacing any previous blob.
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()>;

    /// Removes the blob stored under `key`.
    ///
    /// Returns `true` if the key existed. It is not an error if it did not.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Lists every key starting with `prefix`, in no particular order.
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;

    /// Writes `value` under `key` only if the key is absent.
    ///
    /// Returns `false` without writing when the key already exists.
    ///
    /// The default implementation is a check-then-set sequence: two
    /// concurrent callers can both observe the key as absent and both write,
    /// the last one winning. Backends with a native insert-if-absent
    /// primitive should override it.
    async fn set_if_absent(&self, key: &str, value: Vec<u8>) -> Result<bool> {
        if self.get(key).await?.is_some() {
            return Ok(false);
        }
        self.set(key, value).await?;
        Ok(true)
    }
}

/// Reads and decodes a JSON blob.
pub async fn get_json<S, T>(store: &S, key: &str) -> Result<Option<T>>
where
    S: BlobStore + ?Sized,
    T: DeserializeOwned,
{
    let Some(bytes) = store.get(key).await? else {
        return Ok(None);
    };

    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| StorageError::InvalidData(format!("invalid value for key '{key}': {e}")))
}

/// Encodes `value` as JSON and writes it under `key`.
pub async fn set_json<S, T>(store: &S, key: &str, value: &T) -> Result<()>
where
    S: BlobStore + ?Sized,
    T: Serialize + ?Sized,
{
    store.set(key, encode_json(key, value)?).await
}

/// Encodes `value` as JSON and writes it under `key` if the key is absent.
pub async fn set_json_if_absent<S, T>(store: &S, key: &str, value: &T) -> Result<bool>
where
    S: BlobStore + ?Sized,
    T: Serialize + ?Sized,
{
    store.set_if_absent(key, encode_json(key, value)?).await
}

fn encode_json<T: Serialize + ?Sized>(key: &str, value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| {
        StorageError::Serialization(format!("failed to encode value for key '{key}': {e}"))
    })
}
