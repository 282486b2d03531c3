//! Owner-scoped record management for qrlink.
//!
//! The catalog sits on top of a [`BlobStore`](qrlink_core::BlobStore) and
//! keeps the four namespaces consistent: [`RecordStore`] owns the records
//! and drives the [`IndexManager`] for code and slug uniqueness and the
//! [`VisitLog`] for counters and visit history.

pub mod config;
pub mod index;
pub mod records;
pub mod visits;

pub use config::CatalogConfig;
pub use index::IndexManager;
pub use records::RecordStore;
pub use visits::{IpHasher, VisitLog};
