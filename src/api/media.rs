//! Admin media library
//!
//! - GET /api/admin/media - List files, optionally by `media_type`
//! - POST /api/admin/media - Multipart upload (`file`, `alt_text`, `caption`)
//! - GET/PUT/DELETE /api/admin/media/{id}

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{HeaderMap, StatusCode},
    middleware::from_fn,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;

use crate::api::common::{list_params, parse_filter, ADMIN_PER_PAGE};
use crate::api::middleware::{require_media_manager, ApiError, AppState, AuthenticatedUser};
use crate::models::{MediaFile, MediaType, PagedResult, UpdateMediaInput};
use crate::services::UploadedFile;

/// Multipart overhead allowed on top of the file size limit
const FORM_OVERHEAD: usize = 64 * 1024;

pub fn router(max_file_size: u64) -> Router<AppState> {
    let body_limit = usize::try_from(max_file_size)
        .unwrap_or(usize::MAX)
        .saturating_add(FORM_OVERHEAD);

    let reads = Router::new()
        .route("/", get(list_media))
        .route("/{id}", get(get_media));

    let writes = Router::new()
        .route("/", post(upload_media).layer(DefaultBodyLimit::max(body_limit)))
        .route("/{id}", put(update_media).delete(delete_media))
        .route_layer(from_fn(require_media_manager));

    reads.merge(writes)
}

#[derive(Debug, Deserialize)]
pub struct MediaQuery {
    pub media_type: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

async fn list_media(
    State(state): State<AppState>,
    Query(query): Query<MediaQuery>,
) -> Result<Json<PagedResult<MediaFile>>, ApiError> {
    let media_type: Option<MediaType> = parse_filter(query.media_type.as_deref(), "media_type")?;
    let types: Vec<MediaType> = media_type.into_iter().collect();
    let params = list_params(query.page, query.per_page, ADMIN_PER_PAGE);
    Ok(Json(state.media_service.list(&types, &params).await?))
}

async fn get_media(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MediaFile>, ApiError> {
    Ok(Json(state.media_service.get(id).await?))
}

/// POST /api/admin/media
async fn upload_media(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<MediaFile>), ApiError> {
    let mut file = None;
    let mut alt_text = None;
    let mut caption = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation_error(format!("Malformed upload: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let original_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::validation_error(format!("Failed to read file: {}", e)))?;
                file = Some(UploadedFile {
                    original_name,
                    content_type,
                    data: data.to_vec(),
                });
            }
            "alt_text" => alt_text = Some(text_field(field).await?),
            "caption" => caption = Some(text_field(field).await?),
            _ => {}
        }
    }

    let file = file.ok_or_else(|| ApiError::validation_error("No file provided"))?;
    let media = state
        .media_service
        .upload(file, alt_text, caption, user.actor_id())
        .await?;
    state
        .record_activity(&user.0, &headers, "upload", "media", Some(media.id))
        .await;
    Ok((StatusCode::CREATED, Json(media)))
}

async fn text_field(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::validation_error(format!("Malformed form field: {}", e)))
}

async fn update_media(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<UpdateMediaInput>,
) -> Result<Json<MediaFile>, ApiError> {
    let media = state.media_service.update(id, body).await?;
    state
        .record_activity(&user.0, &headers, "update", "media", Some(id))
        .await;
    Ok(Json(media))
}

async fn delete_media(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.media_service.delete(id).await?;
    state
        .record_activity(&user.0, &headers, "delete", "media", Some(id))
        .await;
    Ok(StatusCode::NO_CONTENT)
}
