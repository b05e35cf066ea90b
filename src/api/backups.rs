//! Database backups, super admin only
//!
//! - GET /api/admin/backups - List archives, newest first
//! - POST /api/admin/backups - Create one now
//! - GET /api/admin/backups/{name} - Download
//! - DELETE /api/admin/backups/{name}

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::services::BackupInfo;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_backups).post(create_backup))
        .route("/{name}", get(download_backup).delete(delete_backup))
}

async fn list_backups(State(state): State<AppState>) -> Result<Json<Vec<BackupInfo>>, ApiError> {
    Ok(Json(state.backup_service.list().await?))
}

async fn create_backup(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<BackupInfo>), ApiError> {
    let info = state.backup_service.create().await?;
    state
        .record_activity(&user, &headers, "create", "backup", None)
        .await;
    Ok((StatusCode::CREATED, Json(info)))
}

async fn download_backup(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let data = state.backup_service.read(&name).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/gzip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", name),
            ),
        ],
        data,
    ))
}

async fn delete_backup(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    headers: HeaderMap,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.backup_service.delete(&name).await?;
    state
        .record_activity(&user, &headers, "delete", "backup", None)
        .await;
    Ok(StatusCode::NO_CONTENT)
}
