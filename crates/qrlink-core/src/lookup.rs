use crate::keys::{code_index_key, slug_index_key};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// How a public redirect request addresses a record.
///
/// A request carries exactly one of a short code or a friendly slug; the
/// enum makes "both" and "neither" unrepresentable.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lookup {
    /// The system-wide unique short code, as used by `/q/{code}`.
    ByCode(String),
    /// The optional human-chosen alias, as used by `/r/{slug}`.
    BySlug(String),
}

impl Lookup {
    pub fn code(code: impl Into<String>) -> Self {
        Self::ByCode(code.into())
    }

    pub fn slug(slug: impl Into<String>) -> Self {
        Self::BySlug(slug.into())
    }

    /// Returns the code or slug as a string slice.
    pub fn as_str(&self) -> &str {
        match self {
            Lookup::ByCode(code) => code.as_str(),
            Lookup::BySlug(slug) => slug.as_str(),
        }
    }

    /// Key of the index entry that maps this code or slug to its record.
    pub fn index_key(&self) -> String {
        match self {
            Lookup::ByCode(code) => code_index_key(code),
            Lookup::BySlug(slug) => slug_index_key(slug),
        }
    }
}

impl Display for Lookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Lookup::ByCode(code) => write!(f, "code:{code}"),
            Lookup::BySlug(slug) => write!(f, "slug:{slug}"),
        }
    }
}
