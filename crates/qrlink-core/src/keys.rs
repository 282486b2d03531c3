//! Logical key layout of the four blob namespaces.
//!
//! ```text
//! record:{owner_id}/{id}               -> QrCodeRecord
//! index:code/{code}                    -> {"key": <record key>}
//! index:slug/{slug}                    -> {"key": <record key>}
//! stats:{id}                           -> {"visits": n}
//! visit:{id}/{iso_timestamp}-{random}  -> QrVisit
//! ```

use crate::error::QrError;
use jiff::Timestamp;
use std::fmt::Display;

/// The four logically separate partitions of the key space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Primary records, scoped by owner.
    Record,
    /// Code and slug uniqueness indexes.
    Index,
    /// Denormalized visit counters.
    Stats,
    /// Append-only visit log entries.
    Visit,
}

impl Namespace {
    pub const ALL: [Namespace; 4] = [
        Namespace::Record,
        Namespace::Index,
        Namespace::Stats,
        Namespace::Visit,
    ];

    pub const fn prefix(self) -> &'static str {
        match self {
            Namespace::Record => "record:",
            Namespace::Index => "index:",
            Namespace::Stats => "stats:",
            Namespace::Visit => "visit:",
        }
    }
}

/// Composite `{owner, record}` identity of a primary record.
///
/// Every owner-scoped accessor goes through this type, so a record can
/// never be addressed by its id alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OwnedKey {
    owner_id: String,
    record_id: String,
}

impl OwnedKey {
    /// Creates an owned key after validating the owner id.
    pub fn new(
        owner_id: impl Into<String>,
        record_id: impl Into<String>,
    ) -> Result<Self, QrError> {
        let owner_id = owner_id.into();
        validate_owner_id(&owner_id)?;
        Ok(Self {
            owner_id,
            record_id: record_id.into(),
        })
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    pub fn record_id(&self) -> &str {
        &self.record_id
    }

    /// The storage key of the record, e.g. `record:alice/8f0c...`.
    pub fn storage_key(&self) -> String {
        format!("{}{}", owner_prefix_unchecked(&self.owner_id), self.record_id)
    }
}

impl Display for OwnedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner_id, self.record_id)
    }
}

/// Owner ids become part of a key prefix, so they must be non-empty and
/// free of the `/` separator; otherwise one owner's prefix could cover
/// another owner's records.
pub fn validate_owner_id(owner_id: &str) -> Result<(), QrError> {
    if owner_id.is_empty() {
        return Err(QrError::validation("user id must not be empty"));
    }
    if owner_id.contains('/') {
        return Err(QrError::validation(format!(
            "user id must not contain '/': '{owner_id}'"
        )));
    }
    Ok(())
}

/// Prefix under which every record of `owner_id` lives.
pub fn owner_prefix(owner_id: &str) -> Result<String, QrError> {
    validate_owner_id(owner_id)?;
    Ok(owner_prefix_unchecked(owner_id))
}

fn owner_prefix_unchecked(owner_id: &str) -> String {
    format!("{}{}/", Namespace::Record.prefix(), owner_id)
}

pub fn code_index_key(code: &str) -> String {
    format!("{}code/{}", Namespace::Index.prefix(), code)
}

pub fn slug_index_key(slug: &str) -> String {
    format!("{}slug/{}", Namespace::Index.prefix(), slug)
}

pub fn stats_key(record_id: &str) -> String {
    format!("{}{}", Namespace::Stats.prefix(), record_id)
}

/// Prefix under which every visit of `record_id` lives.
pub fn visit_prefix(record_id: &str) -> String {
    format!("{}{}/", Namespace::Visit.prefix(), record_id)
}

/// Key of a single visit entry.
///
/// The timestamp is rendered in UTC with a fixed-width fractional part, so
/// that lexicographic order of keys equals chronological order. `suffix`
/// keeps same-instant visits apart.
pub fn visit_key(record_id: &str, visited_at: Timestamp, suffix: &str) -> String {
    format!(
        "{}{}-{}",
        visit_prefix(record_id),
        sortable_timestamp(visited_at),
        suffix
    )
}

/// Renders `ts` as `YYYY-MM-DDTHH:MM:SS.nnnnnnnnnZ`.
pub fn sortable_timestamp(ts: Timestamp) -> String {
    format!(
        "{}.{:09}Z",
        ts.strftime("%Y-%m-%dT%H:%M:%S"),
        ts.subsec_nanosecond()
    )
}
