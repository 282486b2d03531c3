use crate::error::{AppError, Result};
use crate::extract::ClientMeta;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::header::{CACHE_CONTROL, LOCATION};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use qrlink_core::{BlobStore, Lookup};

/// Caching policy attached to every successful redirect.
pub const REDIRECT_CACHE_CONTROL: &str =
    "public, max-age=60, s-maxage=300, stale-while-revalidate=300";

pub async fn redirect_by_code_handler<S: BlobStore>(
    State(state): State<AppState<S>>,
    Path(code): Path<String>,
    ClientMeta(meta): ClientMeta,
) -> Result<Response> {
    redirect(&state, Lookup::ByCode(code), meta).await
}

pub async fn redirect_by_slug_handler<S: BlobStore>(
    State(state): State<AppState<S>>,
    Path(slug): Path<String>,
    ClientMeta(meta): ClientMeta,
) -> Result<Response> {
    redirect(&state, Lookup::BySlug(slug), meta).await
}

async fn redirect<S: BlobStore>(
    state: &AppState<S>,
    lookup: Lookup,
    meta: qrlink_core::VisitMeta,
) -> Result<Response> {
    let record = state.redirector().resolve(&lookup, meta).await?;
    let location = HeaderValue::try_from(record.target_url.as_str()).map_err(|e| {
        AppError::Internal(format!("target of {} is not a valid header: {e}", record.id))
    })?;

    Ok((
        StatusCode::FOUND,
        [
            (LOCATION, location),
            (CACHE_CONTROL, HeaderValue::from_static(REDIRECT_CACHE_CONTROL)),
        ],
    )
        .into_response())
}
