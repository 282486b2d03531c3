use crate::visit::VisitStats;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// A user-owned redirect definition as stored in the record namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrCodeRecord {
    /// Opaque id, generated at creation and never changed.
    pub id: String,
    /// Display label.
    pub name: String,
    /// System-wide unique short code, set once at creation.
    pub code: String,
    /// Where resolution redirects to.
    pub target_url: String,
    /// Optional system-wide unique alias.
    pub friendly_slug: Option<String>,
    /// Resolution is refused while this is `false`.
    pub is_active: bool,
    /// The owning user.
    pub created_by_id: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A record annotated with its current visit counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrCodeWithCount {
    #[serde(flatten)]
    pub record: QrCodeRecord,
    #[serde(rename = "_count")]
    pub count: VisitStats,
}

impl QrCodeWithCount {
    pub fn new(record: QrCodeRecord, visits: u64) -> Self {
        Self {
            record,
            count: VisitStats { visits },
        }
    }

    pub fn visits(&self) -> u64 {
        self.count.visits
    }
}

/// Parameters for creating a record.
///
/// `code` and `friendly_slug` are trimmed; empty values count as absent.
/// Without a code, one is generated.
#[derive(Debug, Clone, TypedBuilder)]
pub struct NewQrCode {
    #[builder(setter(into))]
    pub name: String,
    #[builder(setter(into))]
    pub target_url: String,
    #[builder(default, setter(strip_option, into))]
    pub friendly_slug: Option<String>,
    #[builder(default, setter(strip_option, into))]
    pub code: Option<String>,
}

/// What an update does to the friendly slug.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SlugUpdate {
    /// Leave the current slug untouched.
    #[default]
    Keep,
    /// Remove the slug and its index entry.
    Clear,
    /// Replace the slug. An empty or blank value behaves like [`SlugUpdate::Clear`].
    Set(String),
}

impl From<Option<Option<String>>> for SlugUpdate {
    /// Maps "field omitted" to `Keep`, explicit null to `Clear` and a value
    /// to `Set`.
    fn from(value: Option<Option<String>>) -> Self {
        match value {
            None => SlugUpdate::Keep,
            Some(None) => SlugUpdate::Clear,
            Some(Some(slug)) => SlugUpdate::Set(slug),
        }
    }
}

/// A partial update of a record. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct QrCodeUpdate {
    pub name: Option<String>,
    pub target_url: Option<String>,
    pub friendly_slug: SlugUpdate,
    pub is_active: Option<bool>,
}
