use qrlink_core::blob::{self, BlobStore};
use qrlink_core::error::Result;
use qrlink_core::keys::{stats_key, visit_key, visit_prefix};
use qrlink_core::{Clock, QrVisit, VisitMeta, VisitStats};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{debug, trace};
use uuid::Uuid;

/// One-way hashing of client IP addresses.
///
/// Produces the lowercase hex SHA-256 of `salt || ip`. Without a salt the
/// digest is the plain SHA-256 of the address.
#[derive(Clone, Default)]
pub struct IpHasher {
    salt: Option<String>,
}

impl std::fmt::Debug for IpHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IpHasher")
            .field("salted", &self.salt.is_some())
            .finish()
    }
}

impl IpHasher {
    pub fn new(salt: Option<String>) -> Self {
        Self {
            salt: salt.filter(|s| !s.is_empty()),
        }
    }

    /// Hashes `ip`; absent or blank addresses hash to `None`.
    pub fn hash(&self, ip: Option<&str>) -> Option<String> {
        let ip = ip.map(str::trim).filter(|ip| !ip.is_empty())?;

        let mut hasher = Sha256::new();
        if let Some(salt) = &self.salt {
            hasher.update(salt.as_bytes());
        }
        hasher.update(ip.as_bytes());
        Some(hex::encode(hasher.finalize()))
    }
}

/// Append-only visit log plus the denormalized per-record counter.
///
/// Every visit writes its own key, so concurrent visits never overwrite
/// each other's log entries. The counter is a read-modify-write without
/// atomicity and may lose increments under concurrency; it is approximate.
///
/// `record` does not check that the record still exists. A visit landing
/// after [`VisitLog::purge`], as a background recording racing a delete
/// can, recreates the counter and one log entry that nothing removes.
pub struct VisitLog<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    hasher: IpHasher,
}

impl<S> Clone for VisitLog<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
            hasher: self.hasher.clone(),
        }
    }
}

impl<S> std::fmt::Debug for VisitLog<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisitLog")
            .field("hasher", &self.hasher)
            .finish_non_exhaustive()
    }
}

impl<S: BlobStore> VisitLog<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, hasher: IpHasher) -> Self {
        Self {
            store,
            clock,
            hasher,
        }
    }

    /// Writes the zero counter of a freshly created record.
    pub async fn init(&self, qr_code_id: &str) -> Result<()> {
        blob::set_json(&*self.store, &stats_key(qr_code_id), &VisitStats::default()).await?;
        Ok(())
    }

    /// Logs one visit and bumps the counter.
    ///
    /// The raw IP in `meta` is hashed before anything is written.
    pub async fn record(&self, qr_code_id: &str, meta: VisitMeta) -> Result<QrVisit> {
        let visited_at = self.clock.now();
        let id = Uuid::new_v4();

        let visit = QrVisit {
            id: id.to_string(),
            qr_code_id: qr_code_id.to_owned(),
            visited_at,
            user_agent: meta.user_agent,
            referrer: meta.referrer,
            ip_hash: self.hasher.hash(meta.ip.as_deref()),
        };

        let key = visit_key(qr_code_id, visited_at, &id.simple().to_string());
        blob::set_json(&*self.store, &key, &visit).await?;

        let visits = self.count(qr_code_id).await? + 1;
        blob::set_json(&*self.store, &stats_key(qr_code_id), &VisitStats { visits }).await?;

        debug!(qr_code_id, visits, "recorded visit");
        Ok(visit)
    }

    /// Returns up to `limit` most recent visits, newest first.
    pub async fn list_recent(&self, qr_code_id: &str, limit: usize) -> Result<Vec<QrVisit>> {
        let mut keys = self.store.list(&visit_prefix(qr_code_id)).await?;
        keys.sort_unstable_by(|a, b| b.cmp(a));
        keys.truncate(limit);
        trace!(qr_code_id, count = keys.len(), "loading recent visits");

        let mut visits = Vec::with_capacity(keys.len());
        for key in keys {
            // Entries listed but gone by now were purged concurrently.
            if let Some(visit) = blob::get_json::<_, QrVisit>(&*self.store, &key).await? {
                visits.push(visit);
            }
        }
        Ok(visits)
    }

    /// Current counter value; `0` when no counter exists.
    pub async fn count(&self, qr_code_id: &str) -> Result<u64> {
        let stats: Option<VisitStats> = blob::get_json(&*self.store, &stats_key(qr_code_id)).await?;
        Ok(stats.unwrap_or_default().visits)
    }

    /// Deletes the counter and every log entry of a record.
    ///
    /// Returns the number of log entries removed.
    pub async fn purge(&self, qr_code_id: &str) -> Result<usize> {
        self.store.delete(&stats_key(qr_code_id)).await?;

        let keys = self.store.list(&visit_prefix(qr_code_id)).await?;
        let mut removed = 0;
        for key in &keys {
            if self.store.delete(key).await? {
                removed += 1;
            }
        }

        debug!(qr_code_id, removed, "purged visit data");
        Ok(removed)
    }
}
