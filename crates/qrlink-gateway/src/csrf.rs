use crate::error::AppError;
use axum::extract::Request;
use axum::http::Method;
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::extract::CookieJar;
use tracing::warn;

pub const CSRF_HEADER: &str = "x-csrf-token";
pub const CSRF_COOKIE: &str = "csrf_token";

/// Double-submit CSRF check for state-changing API requests.
///
/// Safe methods pass through. Everything else needs an `x-csrf-token`
/// header equal to the `csrf_token` cookie, or is refused with 403 before
/// any handler runs.
pub async fn csrf_guard(jar: CookieJar, request: Request, next: Next) -> Result<Response, AppError> {
    if matches!(*request.method(), Method::GET | Method::HEAD | Method::OPTIONS) {
        return Ok(next.run(request).await);
    }

    let header = request
        .headers()
        .get(CSRF_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty());
    let cookie = jar.get(CSRF_COOKIE).map(|cookie| cookie.value());

    if matches!((header, cookie), (Some(header), Some(cookie)) if header == cookie) {
        return Ok(next.run(request).await);
    }

    warn!(
        method = %request.method(),
        path = %request.uri().path(),
        has_header = header.is_some(),
        has_cookie = cookie.is_some(),
        "rejected request with invalid CSRF token"
    );
    Err(AppError::Forbidden)
}
