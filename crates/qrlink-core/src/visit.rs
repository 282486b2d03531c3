use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// One resolution event. Written once, never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrVisit {
    pub id: String,
    pub qr_code_id: String,
    pub visited_at: Timestamp,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    /// One-way hash of the client IP. The raw address is never stored.
    pub ip_hash: Option<String>,
}

/// Denormalized running visit counter of a record.
///
/// Maintained with a non-atomic read-modify-write, so it may under-count
/// concurrent visits. The visit log is authoritative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitStats {
    pub visits: u64,
}

/// Request metadata attached to a visit by the boundary layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisitMeta {
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    /// Raw client IP, hashed before it reaches the store.
    pub ip: Option<String>,
}
