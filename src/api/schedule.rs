//! Admin publication schedule

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    middleware::from_fn,
    routing::{get, post, put},
    Json, Router,
};

use crate::api::common::StatusPageQuery;
use crate::api::middleware::{require_content_editor, ApiError, AppState, AuthenticatedUser};
use crate::models::{
    CreateScheduleInput, PagedResult, ScheduleStatus, ScheduledPost, UpdateScheduleInput,
};

pub fn router() -> Router<AppState> {
    let reads = Router::new()
        .route("/", get(list_schedule))
        .route("/{id}", get(get_entry));

    let writes = Router::new()
        .route("/", post(create_entry))
        .route("/{id}", put(update_entry).delete(delete_entry))
        .route("/{id}/cancel", post(cancel_entry))
        .route_layer(from_fn(require_content_editor));

    reads.merge(writes)
}

async fn list_schedule(
    State(state): State<AppState>,
    Query(query): Query<StatusPageQuery<ScheduleStatus>>,
) -> Result<Json<PagedResult<ScheduledPost>>, ApiError> {
    let page = state
        .schedule_service
        .list(query.status, &query.admin_params())
        .await?;
    Ok(Json(page))
}

async fn get_entry(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ScheduledPost>, ApiError> {
    Ok(Json(state.schedule_service.get(id).await?))
}

async fn create_entry(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    headers: HeaderMap,
    Json(body): Json<CreateScheduleInput>,
) -> Result<(StatusCode, Json<ScheduledPost>), ApiError> {
    let entry = state
        .schedule_service
        .create(body, user.actor_id())
        .await?;
    state
        .record_activity(&user.0, &headers, "create", "schedule", Some(entry.id))
        .await;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn update_entry(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<UpdateScheduleInput>,
) -> Result<Json<ScheduledPost>, ApiError> {
    let entry = state.schedule_service.update(id, body).await?;
    state
        .record_activity(&user.0, &headers, "update", "schedule", Some(id))
        .await;
    Ok(Json(entry))
}

async fn cancel_entry(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<ScheduledPost>, ApiError> {
    let entry = state.schedule_service.cancel(id).await?;
    state
        .record_activity(&user.0, &headers, "cancel", "schedule", Some(id))
        .await;
    Ok(Json(entry))
}

async fn delete_entry(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.schedule_service.delete(id).await?;
    state
        .record_activity(&user.0, &headers, "delete", "schedule", Some(id))
        .await;
    Ok(StatusCode::NO_CONTENT)
}
