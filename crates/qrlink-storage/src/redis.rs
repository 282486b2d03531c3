use ::redis::aio::MultiplexedConnection;
use ::redis::{AsyncCommands, RedisError};
use async_trait::async_trait;
use qrlink_core::blob::{BlobStore, Result};
use qrlink_core::StorageError;
use tracing::{debug, trace, warn};

const SCAN_BATCH: usize = 500;

/// A Redis-backed implementation of [`BlobStore`].
///
/// Every key is stored under a configurable key prefix, so several
/// deployments can share one Redis instance. Listing uses incremental
/// `SCAN` with a `MATCH` pattern; [`BlobStore::set_if_absent`] maps to
/// `SET NX` and is atomic.
#[derive(Clone)]
pub struct RedisBlobStore {
    conn: MultiplexedConnection,
    key_prefix: String,
}

impl std::fmt::Debug for RedisBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisBlobStore")
            .field("key_prefix", &self.key_prefix)
            .finish_non_exhaustive()
    }
}

fn map_redis_error(operation: &str, err: RedisError) -> StorageError {
    let message = format!("{operation}: {err}");
    if message.to_ascii_lowercase().contains("timed out") {
        StorageError::Timeout(message)
    } else if err.is_io_error() {
        StorageError::Unavailable(message)
    } else {
        StorageError::Query(message)
    }
}

/// Escapes the glob metacharacters understood by `SCAN ... MATCH`.
fn escape_glob(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

impl RedisBlobStore {
    /// Default prefix prepended to every key.
    pub const DEFAULT_KEY_PREFIX: &'static str = "qrlink:";

    /// Creates a new Redis blob store using [`Self::DEFAULT_KEY_PREFIX`].
    ///
    /// # Arguments
    ///
    /// * `conn` - A multiplexed Redis connection
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self::with_prefix(conn, Self::DEFAULT_KEY_PREFIX)
    }

    /// Creates a new Redis blob store with a custom key prefix.
    ///
    /// # Arguments
    ///
    /// * `conn` - A multiplexed Redis connection
    /// * `key_prefix` - Prefix for every stored key (e.g., "myapp:")
    pub fn with_prefix(conn: MultiplexedConnection, key_prefix: impl Into<String>) -> Self {
        Self {
            conn,
            key_prefix: key_prefix.into(),
        }
    }

    /// Opens a client for `redis_url` and creates a store on top of it.
    pub async fn connect(redis_url: &str, key_prefix: impl Into<String>) -> Result<Self> {
        let client = ::redis::Client::open(redis_url)
            .map_err(|e| map_redis_error("failed to create Redis client", e))?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| StorageError::Unavailable(format!("failed to connect to Redis: {e}")))?;
        Ok(Self::with_prefix(conn, key_prefix))
    }

    fn redis_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}

#[async_trait]
impl BlobStore for RedisBlobStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        trace!(key, "Fetching blob from Redis");

        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = conn.get(self.redis_key(key)).await.map_err(|e| {
            warn!(key, error = %e, "Redis error on get");
            map_redis_error("failed to fetch value from Redis", e)
        })?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        trace!(key, "Storing blob in Redis");

        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(self.redis_key(key), value)
            .await
            .map_err(|e| {
                warn!(key, error = %e, "Failed to store blob in Redis");
                map_redis_error("failed to write value to Redis", e)
            })
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        trace!(key, "Removing blob from Redis");

        let mut conn = self.conn.clone();
        let removed: i64 = conn.del(self.redis_key(key)).await.map_err(|e| {
            warn!(key, error = %e, "Failed to remove blob from Redis");
            map_redis_error("failed to delete value from Redis", e)
        })?;
        Ok(removed > 0)
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let pattern = format!("{}*", escape_glob(&self.redis_key(prefix)));
        trace!(%pattern, "Scanning Redis keys");

        let mut conn = self.conn.clone();
        let mut cursor: u64 = 0;
        let mut keys = Vec::new();

        loop {
            let (next, batch): (u64, Vec<String>) = ::redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await
                .map_err(|e| map_redis_error("failed to scan Redis keys", e))?;

            keys.extend(
                batch
                    .into_iter()
                    .filter_map(|key| key.strip_prefix(&self.key_prefix).map(str::to_owned)),
            );

            if next == 0 {
                break;
            }
            cursor = next;
        }

        // SCAN may return a key more than once.
        keys.sort_unstable();
        keys.dedup();

        debug!(prefix, count = keys.len(), "Listed keys from Redis");
        Ok(keys)
    }

    async fn set_if_absent(&self, key: &str, value: Vec<u8>) -> Result<bool> {
        trace!(key, "Storing blob in Redis if absent");

        let mut conn = self.conn.clone();
        let inserted: bool = conn
            .set_nx(self.redis_key(key), value)
            .await
            .map_err(|e| {
                warn!(key, error = %e, "Failed to store blob in Redis");
                map_redis_error("failed to write value to Redis", e)
            })?;
        Ok(inserted)
    }
}
