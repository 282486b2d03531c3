//! Input validation applied before any store write.

use crate::error::QrError;
use url::Url;

/// Schemes a redirect target may use.
pub const ALLOWED_SCHEMES: [&str; 5] = ["http", "https", "tel", "mailto", "sms"];

const MAX_IDENTIFIER_LENGTH: usize = 128;

/// Validates a redirect target and returns it trimmed.
pub fn validate_target_url(raw: &str) -> Result<String, QrError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(QrError::validation("target URL is required"));
    }

    let url = Url::parse(value).map_err(|_| QrError::validation("invalid URL"))?;
    if !ALLOWED_SCHEMES.contains(&url.scheme()) {
        return Err(QrError::validation(format!(
            "unsupported URL scheme: {}",
            url.scheme()
        )));
    }

    Ok(value.to_string())
}

/// Validates a display name and returns it trimmed.
pub fn validate_name(raw: &str) -> Result<String, QrError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(QrError::validation("name is required"));
    }
    Ok(value.to_string())
}

/// Normalizes a caller-supplied code or slug.
///
/// Surrounding whitespace is trimmed; an empty result means "not supplied"
/// and yields `Ok(None)`. Identifiers become URL path segments and index
/// keys, so `/`, inner whitespace and control characters are rejected.
pub fn normalize_identifier(field: &str, raw: Option<&str>) -> Result<Option<String>, QrError> {
    let Some(value) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    if value.chars().count() > MAX_IDENTIFIER_LENGTH {
        return Err(QrError::validation(format!(
            "{field} must be at most {MAX_IDENTIFIER_LENGTH} characters"
        )));
    }

    if value
        .chars()
        .any(|c| c == '/' || c.is_whitespace() || c.is_control())
    {
        return Err(QrError::validation(format!(
            "{field} must not contain '/', whitespace or control characters: '{value}'"
        )));
    }

    Ok(Some(value.to_string()))
}
