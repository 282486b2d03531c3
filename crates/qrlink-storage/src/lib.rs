//! [`BlobStore`](qrlink_core::BlobStore) backends.
//!
//! - [`InMemoryBlobStore`]: a sharded concurrent map, for tests and
//!   single-process deployments.
//! - [`RedisBlobStore`]: a shared Redis instance, for deployments with many
//!   stateless gateway processes.

pub mod memory;
pub mod redis;

pub use self::memory::InMemoryBlobStore;
pub use self::redis::RedisBlobStore;
