use qrlink_core::{NewQrCode, QrCodeUpdate, SlugUpdate};
use serde::{Deserialize, Deserializer, Serialize};

/// Visits returned when the request does not name a limit.
pub const DEFAULT_VISITS_LIMIT: usize = 50;
/// Upper bound on a single visits page.
pub const MAX_VISITS_LIMIT: usize = 1000;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateQrCodeRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub target_url: String,
    #[serde(default)]
    pub friendly_slug: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

impl From<CreateQrCodeRequest> for NewQrCode {
    fn from(request: CreateQrCodeRequest) -> Self {
        NewQrCode {
            name: request.name,
            target_url: request.target_url,
            friendly_slug: request.friendly_slug,
            code: request.code,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQrCodeRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub target_url: Option<String>,
    /// Absent keeps the slug, `null` clears it, a string replaces it.
    #[serde(default, deserialize_with = "present")]
    pub friendly_slug: Option<Option<String>>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Marks a field as present, so that an explicit `null` is distinguishable
/// from a missing key.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl From<UpdateQrCodeRequest> for QrCodeUpdate {
    fn from(request: UpdateQrCodeRequest) -> Self {
        QrCodeUpdate {
            name: request.name,
            target_url: request.target_url,
            friendly_slug: SlugUpdate::from(request.friendly_slug),
            is_active: request.is_active,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct VisitsQuery {
    pub limit: Option<usize>,
}

impl VisitsQuery {
    pub fn limit(&self) -> usize {
        self.limit
            .unwrap_or(DEFAULT_VISITS_LIMIT)
            .min(MAX_VISITS_LIMIT)
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub ok: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(json: &str) -> QrCodeUpdate {
        serde_json::from_str::<UpdateQrCodeRequest>(json)
            .unwrap()
            .into()
    }

    #[test]
    fn slug_presence_is_preserved() {
        assert_eq!(update("{}").friendly_slug, SlugUpdate::Keep);
        assert_eq!(
            update(r#"{"friendlySlug":null}"#).friendly_slug,
            SlugUpdate::Clear
        );
        assert_eq!(
            update(r#"{"friendlySlug":""}"#).friendly_slug,
            SlugUpdate::Set(String::new())
        );
        assert_eq!(
            update(r#"{"friendlySlug":"menu"}"#).friendly_slug,
            SlugUpdate::Set("menu".to_string())
        );
    }

    #[test]
    fn update_fields_are_camel_case() {
        let parsed = update(r#"{"name":"Lunch","targetUrl":"https://example.com","isActive":false}"#);
        assert_eq!(parsed.name.as_deref(), Some("Lunch"));
        assert_eq!(parsed.target_url.as_deref(), Some("https://example.com"));
        assert_eq!(parsed.is_active, Some(false));
    }

    #[test]
    fn visits_limit_defaults_and_caps() {
        assert_eq!(VisitsQuery::default().limit(), DEFAULT_VISITS_LIMIT);
        assert_eq!(VisitsQuery { limit: Some(5) }.limit(), 5);
        assert_eq!(VisitsQuery { limit: Some(1_000_000) }.limit(), MAX_VISITS_LIMIT);
    }
}
