//! Core types and traits for the qrlink redirect service.
//!
//! This crate provides the shared vocabulary used by the catalog, the
//! redirector and the HTTP gateway: the record and visit models, the
//! key layout of the four blob namespaces, the [`BlobStore`] contract
//! every backend implements, and the error taxonomy.

pub mod blob;
pub mod clock;
pub mod error;
pub mod keys;
pub mod lookup;
pub mod record;
pub mod validation;
pub mod visit;

pub use blob::BlobStore;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ConflictField, QrError, StorageError};
pub use keys::{Namespace, OwnedKey};
pub use lookup::Lookup;
pub use record::{NewQrCode, QrCodeRecord, QrCodeUpdate, QrCodeWithCount, SlugUpdate};
pub use visit::{QrVisit, VisitMeta, VisitStats};
