use async_trait::async_trait;
use qrlink_core::error::Result;
use qrlink_core::{Lookup, QrCodeRecord, VisitMeta};

#[async_trait]
pub trait Redirector: Send + Sync + 'static {
    /// Resolves a code or slug to its record and records the visit.
    ///
    /// Fails with `NotFound` when nothing is mapped and with `Inactive` when
    /// the record is switched off; neither case logs a visit.
    async fn resolve(&self, lookup: &Lookup, meta: VisitMeta) -> Result<QrCodeRecord>;
}
