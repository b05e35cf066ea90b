//! Admin inbox for constituency contact messages

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    middleware::from_fn,
    routing::{get, put},
    Json, Router,
};

use crate::api::common::{StatusBody, StatusPageQuery, SuccessResponse};
use crate::api::middleware::{require_content_editor, ApiError, AppState, AuthenticatedUser};
use crate::models::{ContactMessage, MessageStatus, PagedResult};

pub fn router() -> Router<AppState> {
    let reads = Router::new().route("/", get(list_messages));

    // Opening a message marks it read, so it counts as a write
    let writes = Router::new()
        .route("/{id}", get(open_message).delete(delete_message))
        .route("/{id}/status", put(update_status))
        .route_layer(from_fn(require_content_editor));

    reads.merge(writes)
}

async fn list_messages(
    State(state): State<AppState>,
    Query(query): Query<StatusPageQuery<MessageStatus>>,
) -> Result<Json<PagedResult<ContactMessage>>, ApiError> {
    let page = state
        .contact_service
        .list(query.status, &query.admin_params())
        .await?;
    Ok(Json(page))
}

async fn open_message(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ContactMessage>, ApiError> {
    Ok(Json(state.contact_service.open(id).await?))
}

async fn update_status(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<StatusBody<MessageStatus>>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state.contact_service.set_status(id, body.status).await?;
    state
        .record_activity(&user.0, &headers, "update", "message", Some(id))
        .await;
    Ok(Json(SuccessResponse::ok()))
}

async fn delete_message(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.contact_service.delete(id).await?;
    state
        .record_activity(&user.0, &headers, "delete", "message", Some(id))
        .await;
    Ok(StatusCode::NO_CONTENT)
}
