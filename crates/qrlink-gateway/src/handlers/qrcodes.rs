use crate::error::{AppError, Result};
use crate::extract::UserId;
use crate::model::{CreateQrCodeRequest, DeleteResponse, UpdateQrCodeRequest, VisitsQuery};
use crate::state::AppState;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use qrlink_core::{BlobStore, QrCodeWithCount, QrError, QrVisit};

pub async fn list_qrcodes_handler<S: BlobStore>(
    State(state): State<AppState<S>>,
    UserId(user_id): UserId,
) -> Result<Json<Vec<QrCodeWithCount>>> {
    let records = state.records().list_for_user(&user_id).await?;
    Ok(Json(records))
}

pub async fn create_qrcode_handler<S: BlobStore>(
    State(state): State<AppState<S>>,
    UserId(user_id): UserId,
    payload: std::result::Result<Json<CreateQrCodeRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<QrCodeWithCount>)> {
    let Json(request) = payload?;
    let created = state.records().create(&user_id, request.into()).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_qrcode_handler<S: BlobStore>(
    State(state): State<AppState<S>>,
    UserId(user_id): UserId,
    Path(id): Path<String>,
    payload: std::result::Result<Json<UpdateQrCodeRequest>, JsonRejection>,
) -> Result<Json<QrCodeWithCount>> {
    let Json(request) = payload?;
    let updated = state
        .records()
        .update(&user_id, &id, request.into())
        .await?;
    Ok(Json(updated))
}

pub async fn delete_qrcode_handler<S: BlobStore>(
    State(state): State<AppState<S>>,
    UserId(user_id): UserId,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>> {
    if state.records().delete(&user_id, &id).await? {
        Ok(Json(DeleteResponse { ok: true }))
    } else {
        Err(AppError::Core(QrError::NotFound))
    }
}

pub async fn list_visits_handler<S: BlobStore>(
    State(state): State<AppState<S>>,
    UserId(user_id): UserId,
    Path(id): Path<String>,
    query: std::result::Result<Query<VisitsQuery>, QueryRejection>,
) -> Result<Json<Vec<QrVisit>>> {
    let Query(query) = query?;
    let visits = state
        .records()
        .list_visits_for_user(&user_id, &id, query.limit())
        .await?;
    Ok(Json(visits))
}
