//! Request extractors for the authenticated user and visit metadata.

use crate::error::AppError;
use axum::extract::FromRequestParts;
use axum::http::header::{REFERER, USER_AGENT};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use qrlink_core::VisitMeta;
use std::convert::Infallible;

/// Header the authenticating proxy sets to the signed-in user's id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated user. Requests without a user id are rejected with 401.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserId(pub String);

impl<S> FromRequestParts<S> for UserId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        header_str(&parts.headers, USER_ID_HEADER)
            .map(|user_id| UserId(user_id.to_owned()))
            .ok_or(AppError::Unauthorized)
    }
}

/// Visit metadata taken from the request headers.
#[derive(Debug, Clone, Default)]
pub struct ClientMeta(pub VisitMeta);

impl<S> FromRequestParts<S> for ClientMeta
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let headers = &parts.headers;
        Ok(ClientMeta(VisitMeta {
            user_agent: header_str(headers, USER_AGENT.as_str()).map(str::to_owned),
            referrer: header_str(headers, REFERER.as_str()).map(str::to_owned),
            ip: client_ip(headers),
        }))
    }
}

/// First `x-forwarded-for` entry, falling back to `x-real-ip`.
pub fn client_ip(headers: &HeaderMap) -> Option<String> {
    header_str(headers, "x-forwarded-for")
        .and_then(|forwarded| forwarded.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .or_else(|| header_str(headers, "x-real-ip"))
        .map(str::to_owned)
}

/// A trimmed, non-empty, valid UTF-8 header value.
fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}
