use crate::redirector::Redirector;
use async_trait::async_trait;
use qrlink_catalog::{RecordStore, VisitLog};
use qrlink_core::error::Result;
use qrlink_core::{BlobStore, Lookup, QrCodeRecord, QrError, VisitMeta};
use tracing::{debug, trace, warn};

/// When a successful resolution writes its visit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VisitRecording {
    /// Awaited before the record is returned; a failed write fails the
    /// resolution.
    #[default]
    Inline,
    /// Spawned onto the tokio runtime; failures are only logged. Requires a
    /// runtime that outlives the request.
    Background,
}

/// Resolves public lookups and records visits.
#[derive(Debug)]
pub struct RedirectorService<S> {
    records: RecordStore<S>,
    recording: VisitRecording,
}

impl<S> Clone for RedirectorService<S> {
    fn clone(&self) -> Self {
        Self {
            records: self.records.clone(),
            recording: self.recording,
        }
    }
}

impl<S: BlobStore> RedirectorService<S> {
    /// Creates a service that records visits inline.
    pub fn new(records: RecordStore<S>) -> Self {
        Self::with_recording(records, VisitRecording::default())
    }

    pub fn with_recording(records: RecordStore<S>, recording: VisitRecording) -> Self {
        Self { records, recording }
    }

    /// Resolves `lookup` to an active record, logging the visit.
    pub async fn resolve(&self, lookup: &Lookup, meta: VisitMeta) -> Result<QrCodeRecord> {
        Redirector::resolve(self, lookup, meta).await
    }

    async fn record_visit(&self, record: &QrCodeRecord, meta: VisitMeta) -> Result<()> {
        match self.recording {
            VisitRecording::Inline => {
                self.records.visits().record(&record.id, meta).await?;
            }
            VisitRecording::Background => {
                let visits: VisitLog<S> = self.records.visits().clone();
                let id = record.id.clone();
                tokio::spawn(async move {
                    if let Err(e) = visits.record(&id, meta).await {
                        warn!(qr_code_id = %id, error = %e, "failed to record visit");
                    }
                });
            }
        }
        Ok(())
    }
}

#[async_trait]
impl<S: BlobStore> Redirector for RedirectorService<S> {
    async fn resolve(&self, lookup: &Lookup, meta: VisitMeta) -> Result<QrCodeRecord> {
        trace!(%lookup, "resolving");

        let Some(record) = self.records.find_by_lookup(lookup).await? else {
            trace!(%lookup, "nothing mapped");
            return Err(QrError::NotFound);
        };

        if !record.is_active {
            debug!(%lookup, id = %record.id, "record is inactive");
            return Err(QrError::Inactive);
        }

        self.record_visit(&record, meta).await?;

        debug!(%lookup, id = %record.id, target = %record.target_url, "resolved");
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use jiff::Timestamp;
    use qrlink_catalog::CatalogConfig;
    use qrlink_core::{ManualClock, NewQrCode, QrCodeUpdate, StorageError};
    use qrlink_storage::InMemoryBlobStore;
    use std::sync::Arc;
    use std::time::Duration;

    const ALICE: &str = "alice";

    fn records_on<S: BlobStore>(store: S) -> RecordStore<S> {
        let clock = ManualClock::new("2024-05-01T12:00:00Z".parse::<Timestamp>().unwrap());
        RecordStore::new(Arc::new(store), CatalogConfig::default()).with_clock(clock)
    }

    fn setup(
        recording: VisitRecording,
    ) -> (
        RedirectorService<InMemoryBlobStore>,
        RecordStore<InMemoryBlobStore>,
    ) {
        let records = records_on(InMemoryBlobStore::new());
        (
            RedirectorService::with_recording(records.clone(), recording),
            records,
        )
    }

    fn menu() -> NewQrCode {
        NewQrCode::builder()
            .name("Menu")
            .target_url("https://example.com/menu")
            .friendly_slug("menu")
            .build()
    }

    fn visitor() -> VisitMeta {
        VisitMeta {
            user_agent: Some("Mozilla/5.0".to_string()),
            referrer: Some("https://news.example.org".to_string()),
            ip: Some("198.51.100.4".to_string()),
        }
    }

    fn deactivate() -> QrCodeUpdate {
        QrCodeUpdate {
            is_active: Some(false),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn resolves_by_code_and_slug() {
        let (service, records) = setup(VisitRecording::Inline);
        let created = records.create(ALICE, menu()).await.unwrap().record;

        let by_code = service
            .resolve(&Lookup::code(created.code.as_str()), visitor())
            .await
            .unwrap();
        let by_slug = service
            .resolve(&Lookup::slug("menu"), VisitMeta::default())
            .await
            .unwrap();

        assert_eq!(by_code.target_url, "https://example.com/menu");
        assert_eq!(by_slug.id, created.id);
        assert_eq!(records.visits().count(&created.id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn visit_carries_request_metadata() {
        let (service, records) = setup(VisitRecording::Inline);
        let created = records.create(ALICE, menu()).await.unwrap().record;

        service
            .resolve(&Lookup::slug("menu"), visitor())
            .await
            .unwrap();

        let visits = records.visits().list_recent(&created.id, 10).await.unwrap();
        assert_eq!(visits.len(), 1);
        assert_eq!(visits[0].qr_code_id, created.id);
        assert_eq!(visits[0].user_agent.as_deref(), Some("Mozilla/5.0"));
        assert_eq!(
            visits[0].referrer.as_deref(),
            Some("https://news.example.org")
        );
        let ip_hash = visits[0].ip_hash.as_deref().unwrap();
        assert_eq!(ip_hash.len(), 64);
        assert_ne!(ip_hash, "198.51.100.4");
    }

    #[tokio::test]
    async fn unknown_lookups_are_not_found() {
        let (service, _) = setup(VisitRecording::Inline);

        assert!(matches!(
            service.resolve(&Lookup::code("nope"), visitor()).await,
            Err(QrError::NotFound)
        ));
        assert!(matches!(
            service.resolve(&Lookup::slug("nope"), visitor()).await,
            Err(QrError::NotFound)
        ));
    }

    #[tokio::test]
    async fn inactive_records_are_gone_and_not_counted() {
        let (service, records) = setup(VisitRecording::Inline);
        let created = records.create(ALICE, menu()).await.unwrap().record;
        records
            .update(ALICE, &created.id, deactivate())
            .await
            .unwrap();

        let result = service.resolve(&Lookup::slug("menu"), visitor()).await;

        assert!(matches!(result, Err(QrError::Inactive)));
        assert_eq!(records.visits().count(&created.id).await.unwrap(), 0);
        assert!(records
            .visits()
            .list_recent(&created.id, 10)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn released_slugs_no_longer_resolve() {
        let (service, records) = setup(VisitRecording::Inline);
        let created = records.create(ALICE, menu()).await.unwrap().record;
        let update = QrCodeUpdate {
            friendly_slug: qrlink_core::SlugUpdate::Set("lunch".to_string()),
            ..Default::default()
        };
        records.update(ALICE, &created.id, update).await.unwrap();

        assert!(matches!(
            service.resolve(&Lookup::slug("menu"), visitor()).await,
            Err(QrError::NotFound)
        ));
        assert_eq!(
            service
                .resolve(&Lookup::slug("lunch"), visitor())
                .await
                .unwrap()
                .id,
            created.id
        );
    }

    #[tokio::test]
    async fn end_to_end_lifecycle() {
        let (service, records) = setup(VisitRecording::Inline);
        let params = NewQrCode::builder()
            .name("Menu")
            .target_url("https://example.com/menu")
            .build();

        let created = records.create(ALICE, params).await.unwrap();
        let code = created.record.code.clone();
        assert!(created.record.is_active);
        assert_eq!(code.len(), 10);
        assert!(code.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')));
        assert_eq!(created.visits(), 0);

        let resolved = service
            .resolve(&Lookup::code(code.as_str()), visitor())
            .await
            .unwrap();
        assert_eq!(resolved.target_url, "https://example.com/menu");
        assert_eq!(
            records.visits().count(&created.record.id).await.unwrap(),
            1
        );

        records
            .update(ALICE, &created.record.id, deactivate())
            .await
            .unwrap();
        assert!(matches!(
            service.resolve(&Lookup::code(code.as_str()), visitor()).await,
            Err(QrError::Inactive)
        ));
        assert_eq!(
            records.visits().count(&created.record.id).await.unwrap(),
            1
        );

        assert!(records.delete(ALICE, &created.record.id).await.unwrap());
        assert!(matches!(
            service.resolve(&Lookup::code(code.as_str()), visitor()).await,
            Err(QrError::NotFound)
        ));
    }

    #[tokio::test]
    async fn deleted_records_no_longer_resolve() {
        let (service, records) = setup(VisitRecording::Inline);
        let created = records.create(ALICE, menu()).await.unwrap().record;
        service
            .resolve(&Lookup::slug("menu"), visitor())
            .await
            .unwrap();

        assert!(records.delete(ALICE, &created.id).await.unwrap());

        assert!(matches!(
            service.resolve(&Lookup::slug("menu"), visitor()).await,
            Err(QrError::NotFound)
        ));
        assert!(matches!(
            service
                .resolve(&Lookup::code(created.code.as_str()), visitor())
                .await,
            Err(QrError::NotFound)
        ));
        assert_eq!(records.visits().count(&created.id).await.unwrap(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn background_recording_eventually_counts() {
        let (service, records) = setup(VisitRecording::Background);
        let created = records.create(ALICE, menu()).await.unwrap().record;

        service
            .resolve(&Lookup::slug("menu"), visitor())
            .await
            .unwrap();

        awaitility::at_most(Duration::from_secs(5))
            .poll_interval(Duration::from_millis(10))
            .until_async(|| async { records.visits().count(&created.id).await.unwrap() == 1 })
            .await;
    }

    /// Refuses writes to the visit namespace.
    #[derive(Clone, Default)]
    struct NoVisits(InMemoryBlobStore);

    #[async_trait]
    impl BlobStore for NoVisits {
        async fn get(&self, key: &str) -> qrlink_core::blob::Result<Option<Vec<u8>>> {
            self.0.get(key).await
        }

        async fn set(&self, key: &str, value: Vec<u8>) -> qrlink_core::blob::Result<()> {
            if key.starts_with("visit:") {
                return Err(StorageError::Timeout("visit write timed out".to_string()));
            }
            self.0.set(key, value).await
        }

        async fn delete(&self, key: &str) -> qrlink_core::blob::Result<bool> {
            self.0.delete(key).await
        }

        async fn list(&self, prefix: &str) -> qrlink_core::blob::Result<Vec<String>> {
            self.0.list(prefix).await
        }
    }

    #[tokio::test]
    async fn inline_recording_failures_surface() {
        let records = records_on(NoVisits::default());
        let service = RedirectorService::new(records.clone());
        records.create(ALICE, menu()).await.unwrap();

        let result = service.resolve(&Lookup::slug("menu"), visitor()).await;

        assert!(matches!(
            result,
            Err(QrError::Storage(StorageError::Timeout(_)))
        ));
    }

    #[tokio::test]
    async fn background_recording_failures_are_swallowed() {
        let records = records_on(NoVisits::default());
        let service = RedirectorService::with_recording(records.clone(), VisitRecording::Background);
        records.create(ALICE, menu()).await.unwrap();

        let resolved = service
            .resolve(&Lookup::slug("menu"), visitor())
            .await
            .unwrap();

        assert_eq!(resolved.target_url, "https://example.com/menu");
    }
}
