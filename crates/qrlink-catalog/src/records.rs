use crate::config::CatalogConfig;
use crate::index::IndexManager;
use crate::visits::{IpHasher, VisitLog};
use qrlink_core::blob::{self, BlobStore};
use qrlink_core::error::Result;
use qrlink_core::keys::{owner_prefix, OwnedKey};
use qrlink_core::validation::{normalize_identifier, validate_name, validate_target_url};
use qrlink_core::{
    Clock, ConflictField, Lookup, NewQrCode, QrCodeRecord, QrCodeUpdate, QrCodeWithCount, QrError,
    QrVisit, SlugUpdate, SystemClock,
};
use qrlink_generator::{Generator, HexGenerator};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

/// A step that undoes an earlier write of a failed operation.
#[derive(Debug)]
enum Undo<'a> {
    Release(&'a Lookup),
    Delete(&'a str),
}

/// Who holds a code or slug in the index.
#[derive(Debug, PartialEq, Eq)]
enum Holder {
    Free,
    Taken,
    /// The entry points at a record that no longer carries the identifier,
    /// left behind when releasing an old slug failed.
    Stale(String),
}

fn carries(record: &QrCodeRecord, lookup: &Lookup) -> bool {
    match lookup {
        Lookup::ByCode(code) => record.code == *code,
        Lookup::BySlug(slug) => record.friendly_slug.as_deref() == Some(slug.as_str()),
    }
}

/// Owner-scoped CRUD over QR code records.
///
/// Every accessor takes the authenticated user id and derives the record's
/// storage key from it, so a user can only ever reach their own records.
/// The store keeps the code and slug indexes and the visit counter in step
/// with the records it writes. Without transactions it does so by ordering
/// writes and undoing earlier steps when a later one fails.
pub struct RecordStore<S> {
    store: Arc<S>,
    index: IndexManager<S>,
    visits: VisitLog<S>,
    generator: Arc<dyn Generator>,
    clock: Arc<dyn Clock>,
    config: CatalogConfig,
}

impl<S> Clone for RecordStore<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            index: self.index.clone(),
            visits: self.visits.clone(),
            generator: Arc::clone(&self.generator),
            clock: Arc::clone(&self.clock),
            config: self.config.clone(),
        }
    }
}

impl<S> std::fmt::Debug for RecordStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<S: BlobStore> RecordStore<S> {
    /// Creates a store generating random hex codes of the configured length
    /// and stamping records with the system clock.
    pub fn new(store: Arc<S>, config: CatalogConfig) -> Self {
        let generator: Arc<dyn Generator> = Arc::new(HexGenerator::with_length(config.code_length));
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let hasher = IpHasher::new(config.ip_hash_salt.clone());

        Self {
            index: IndexManager::new(Arc::clone(&store)),
            visits: VisitLog::new(Arc::clone(&store), Arc::clone(&clock), hasher),
            store,
            generator,
            clock,
            config,
        }
    }

    /// Replaces the code generator.
    pub fn with_generator(mut self, generator: impl Generator) -> Self {
        self.generator = Arc::new(generator);
        self
    }

    /// Replaces the clock used for record timestamps and visit keys.
    pub fn with_clock(mut self, clock: impl Clock) -> Self {
        self.clock = Arc::new(clock);
        self.visits = VisitLog::new(
            Arc::clone(&self.store),
            Arc::clone(&self.clock),
            IpHasher::new(self.config.ip_hash_salt.clone()),
        );
        self
    }

    pub fn index(&self) -> &IndexManager<S> {
        &self.index
    }

    pub fn visits(&self) -> &VisitLog<S> {
        &self.visits
    }

    /// Every record of `user_id` with its visit count, newest first.
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<QrCodeWithCount>> {
        let prefix = owner_prefix(user_id)?;
        let keys = self.store.list(&prefix).await?;
        trace!(user_id, count = keys.len(), "listing records");

        let mut records = Vec::with_capacity(keys.len());
        for key in keys {
            let Some(record) = blob::get_json::<_, QrCodeRecord>(&*self.store, &key).await? else {
                continue;
            };
            if record.created_by_id != user_id {
                warn!(user_id, %key, owner = %record.created_by_id, "skipping foreign record");
                continue;
            }
            let visits = self.visits.count(&record.id).await?;
            records.push(QrCodeWithCount::new(record, visits));
        }

        records.sort_by(|a, b| b.record.created_at.cmp(&a.record.created_at));
        Ok(records)
    }

    /// The record `id` of `user_id`.
    ///
    /// Missing records and records of other users are both
    /// [`QrError::NotFound`].
    pub async fn get_for_user(&self, user_id: &str, id: &str) -> Result<QrCodeRecord> {
        let key = OwnedKey::new(user_id, id)?;
        self.load(&key).await?.ok_or(QrError::NotFound)
    }

    /// Creates a record for `user_id`.
    ///
    /// Input is validated and both identifiers are checked against the
    /// indexes before the first write; a conflict leaves the store
    /// untouched. Writes then happen in the order code entry, slug entry,
    /// record, counter.
    pub async fn create(&self, user_id: &str, params: NewQrCode) -> Result<QrCodeWithCount> {
        let name = validate_name(&params.name)?;
        let target_url = validate_target_url(&params.target_url)?;
        let requested_code = normalize_identifier("code", params.code.as_deref())?;
        let friendly_slug = normalize_identifier("friendlySlug", params.friendly_slug.as_deref())?;
        let key = OwnedKey::new(user_id, Uuid::new_v4().to_string())?;

        if let Some(slug) = &friendly_slug {
            if self.holder(&Lookup::slug(slug.as_str())).await? == Holder::Taken {
                return Err(QrError::conflict(ConflictField::FriendlySlug, slug.as_str()));
            }
        }
        let code = match requested_code {
            Some(code) => {
                if self.holder(&Lookup::code(code.as_str())).await? == Holder::Taken {
                    return Err(QrError::conflict(ConflictField::Code, code));
                }
                code
            }
            None => self.free_generated_code().await?,
        };

        let now = self.clock.now();
        let record = QrCodeRecord {
            id: key.record_id().to_owned(),
            name,
            code,
            target_url,
            friendly_slug,
            is_active: true,
            created_by_id: user_id.to_owned(),
            created_at: now,
            updated_at: now,
        };
        let storage_key = key.storage_key();
        let code_lookup = Lookup::code(record.code.as_str());
        let slug_lookup = record.friendly_slug.as_deref().map(Lookup::slug);

        self.claim(&code_lookup, &storage_key).await?;

        let mut undo = vec![Undo::Release(&code_lookup)];
        if let Some(slug_lookup) = &slug_lookup {
            if let Err(err) = self.claim(slug_lookup, &storage_key).await {
                return Err(self.rollback(err, &undo).await);
            }
            undo.push(Undo::Release(slug_lookup));
        }

        if let Err(err) = blob::set_json(&*self.store, &storage_key, &record).await {
            return Err(self.rollback(err.into(), &undo).await);
        }
        undo.push(Undo::Delete(&storage_key));

        if let Err(err) = self.visits.init(&record.id).await {
            return Err(self.rollback(err, &undo).await);
        }

        info!(
            user_id,
            id = %record.id,
            code = %record.code,
            slug = ?record.friendly_slug,
            "created qr code"
        );
        Ok(QrCodeWithCount::new(record, 0))
    }

    /// Applies a partial update to the record `id` of `user_id`.
    ///
    /// A new slug is reserved before the record is written and the old one
    /// released afterwards, so a failure never leaves the record pointing
    /// at a slug it does not own. If only the release fails, the old entry
    /// is stale and the next claim of that slug reclaims it.
    pub async fn update(
        &self,
        user_id: &str,
        id: &str,
        update: QrCodeUpdate,
    ) -> Result<QrCodeWithCount> {
        let key = OwnedKey::new(user_id, id)?;
        let current = self.load(&key).await?.ok_or(QrError::NotFound)?;

        let name = update.name.as_deref().map(validate_name).transpose()?;
        let target_url = update
            .target_url
            .as_deref()
            .map(validate_target_url)
            .transpose()?;
        let friendly_slug = match &update.friendly_slug {
            SlugUpdate::Keep => current.friendly_slug.clone(),
            SlugUpdate::Clear => None,
            SlugUpdate::Set(slug) => normalize_identifier("friendlySlug", Some(slug.as_str()))?,
        };

        let storage_key = key.storage_key();
        let slug_changed = friendly_slug != current.friendly_slug;
        let new_slug = friendly_slug
            .as_deref()
            .filter(|_| slug_changed)
            .map(Lookup::slug);
        if let Some(new_slug) = &new_slug {
            self.claim(new_slug, &storage_key).await?;
        }

        let updated = QrCodeRecord {
            name: name.unwrap_or_else(|| current.name.clone()),
            target_url: target_url.unwrap_or_else(|| current.target_url.clone()),
            friendly_slug,
            is_active: update.is_active.unwrap_or(current.is_active),
            updated_at: self.clock.now(),
            ..current.clone()
        };

        if let Err(err) = blob::set_json(&*self.store, &storage_key, &updated).await {
            let undo: Vec<Undo<'_>> = new_slug.iter().map(Undo::Release).collect();
            return Err(self.rollback(err.into(), &undo).await);
        }

        if slug_changed {
            if let Some(old_slug) = &current.friendly_slug {
                self.index
                    .release_if_held_by(&Lookup::slug(old_slug.as_str()), &storage_key)
                    .await?;
            }
        }

        let visits = self.visits.count(id).await?;
        debug!(user_id, id, slug_changed, "updated qr code");
        Ok(QrCodeWithCount::new(updated, visits))
    }

    /// Deletes the record `id` of `user_id` together with its index
    /// entries, counter and visits.
    ///
    /// The record goes last, so a delete that fails halfway can be retried
    /// and finishes the cleanup. Index entries are only released while
    /// they still point at this record.
    ///
    /// Returns `false` when there was nothing to delete.
    pub async fn delete(&self, user_id: &str, id: &str) -> Result<bool> {
        let key = OwnedKey::new(user_id, id)?;
        let Some(record) = self.load(&key).await? else {
            debug!(user_id, id, "nothing to delete");
            return Ok(false);
        };
        let storage_key = key.storage_key();

        let purged = self.visits.purge(id).await?;
        if let Some(slug) = &record.friendly_slug {
            self.index
                .release_if_held_by(&Lookup::slug(slug.as_str()), &storage_key)
                .await?;
        }
        self.index
            .release_if_held_by(&Lookup::code(record.code.as_str()), &storage_key)
            .await?;
        self.store.delete(&storage_key).await?;

        info!(user_id, id, code = %record.code, purged, "deleted qr code");
        Ok(true)
    }

    /// Recent visits of the record `id` of `user_id`, newest first.
    pub async fn list_visits_for_user(
        &self,
        user_id: &str,
        id: &str,
        limit: usize,
    ) -> Result<Vec<QrVisit>> {
        let record = self.get_for_user(user_id, id).await?;
        self.visits.list_recent(&record.id, limit).await
    }

    /// Finds a record through the code or slug index, regardless of owner.
    ///
    /// An index entry whose record is gone, or whose record no longer
    /// carries the looked-up code or slug, counts as absent.
    pub async fn find_by_lookup(&self, lookup: &Lookup) -> Result<Option<QrCodeRecord>> {
        let Some(key) = self.index.lookup(lookup).await? else {
            return Ok(None);
        };
        let Some(record) = blob::get_json::<_, QrCodeRecord>(&*self.store, &key).await? else {
            debug!(%lookup, %key, "index entry points at a missing record");
            return Ok(None);
        };

        if !carries(&record, lookup) {
            debug!(%lookup, %key, "stale index entry");
            return Ok(None);
        }
        Ok(Some(record))
    }

    /// Loads the record behind `key`, provided it was created by the key's
    /// owner.
    async fn load(&self, key: &OwnedKey) -> Result<Option<QrCodeRecord>> {
        let storage_key = key.storage_key();
        let Some(record) = blob::get_json::<_, QrCodeRecord>(&*self.store, &storage_key).await?
        else {
            return Ok(None);
        };
        if record.created_by_id != key.owner_id() {
            warn!(
                key = %storage_key,
                owner = %record.created_by_id,
                "record stored under a foreign owner"
            );
            return Ok(None);
        }
        Ok(Some(record))
    }

    /// Classifies the current index entry of `lookup`.
    ///
    /// An entry whose record is missing stays taken: it may belong to a
    /// create that has reserved its identifiers but not written the record
    /// yet.
    async fn holder(&self, lookup: &Lookup) -> Result<Holder> {
        let Some(key) = self.index.lookup(lookup).await? else {
            return Ok(Holder::Free);
        };
        match blob::get_json::<_, QrCodeRecord>(&*self.store, &key).await? {
            Some(record) if !carries(&record, lookup) => Ok(Holder::Stale(key)),
            _ => Ok(Holder::Taken),
        }
    }

    /// Reserves `lookup` for `record_key`, reclaiming a stale entry first.
    async fn claim(&self, lookup: &Lookup, record_key: &str) -> Result<()> {
        if let Holder::Stale(stale) = self.holder(lookup).await? {
            warn!(%lookup, %stale, "reclaiming stale index entry");
            self.index.release_if_held_by(lookup, &stale).await?;
        }
        self.index.reserve(lookup, record_key).await
    }

    /// Draws generated codes until one is free in the code index.
    async fn free_generated_code(&self) -> Result<String> {
        let mut last = String::new();
        for attempt in 1..=self.config.code_attempts.max(1) {
            let candidate = self.generator.generate();
            if self.holder(&Lookup::code(candidate.as_str())).await? != Holder::Taken {
                return Ok(candidate);
            }
            debug!(attempt, code = %candidate, "generated code already taken");
            last = candidate;
        }

        warn!(
            attempts = self.config.code_attempts,
            "could not generate a free code"
        );
        Err(QrError::conflict(ConflictField::Code, last))
    }

    /// Undoes `steps` in reverse order and hands back `err`.
    ///
    /// Failures while undoing are logged; the original error wins.
    async fn rollback(&self, err: QrError, steps: &[Undo<'_>]) -> QrError {
        warn!(error = %err, steps = steps.len(), "rolling back partial write");

        for step in steps.iter().rev() {
            let result = match step {
                Undo::Release(lookup) => self.index.release(lookup).await,
                Undo::Delete(key) => self.store.delete(key).await.map(drop).map_err(QrError::from),
            };
            if let Err(undo_err) = result {
                warn!(?step, error = %undo_err, "failed to undo write");
            }
        }
        err
    }
}
