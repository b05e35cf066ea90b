//! Admin content API: news, speeches and reports
//!
//! Mounted at `/api/admin/content`. Reading is open to every back-office
//! role; news mutations need `news_editor`, speeches and reports need
//! `content_editor`.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    middleware::from_fn,
    routing::{get, post, put},
    Json, Router,
};

use crate::api::common::ContentListQuery;
use crate::api::middleware::{
    require_content_editor, require_news_editor, ApiError, AppState, AuthenticatedUser,
};
use crate::models::{
    CreateNewsInput, CreateReportInput, CreateSpeechInput, NewsArticle, PagedResult, Report,
    Speech, UpdateNewsInput, UpdateReportInput, UpdateSpeechInput,
};

pub fn router() -> Router<AppState> {
    let reads = Router::new()
        .route("/news", get(list_news))
        .route("/news/{id}", get(get_news))
        .route("/speeches", get(list_speeches))
        .route("/speeches/{id}", get(get_speech))
        .route("/reports", get(list_reports))
        .route("/reports/{id}", get(get_report));

    let news_writes = Router::new()
        .route("/news", post(create_news))
        .route("/news/{id}", put(update_news).delete(delete_news))
        .route_layer(from_fn(require_news_editor));

    let editor_writes = Router::new()
        .route("/speeches", post(create_speech))
        .route("/speeches/{id}", put(update_speech).delete(delete_speech))
        .route("/reports", post(create_report))
        .route("/reports/{id}", put(update_report).delete(delete_report))
        .route_layer(from_fn(require_content_editor));

    reads.merge(news_writes).merge(editor_writes)
}

// ============================================================================
// News
// ============================================================================

async fn list_news(
    State(state): State<AppState>,
    Query(query): Query<ContentListQuery>,
) -> Result<Json<PagedResult<NewsArticle>>, ApiError> {
    let page = state
        .content_service
        .list_news(query.status, &query.admin_params())
        .await?;
    Ok(Json(page))
}

async fn get_news(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<NewsArticle>, ApiError> {
    Ok(Json(state.content_service.get_news(id).await?))
}

async fn create_news(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    headers: HeaderMap,
    Json(body): Json<CreateNewsInput>,
) -> Result<(StatusCode, Json<NewsArticle>), ApiError> {
    let article = state
        .content_service
        .create_news(body, user.actor_id())
        .await?;
    state
        .record_activity(&user.0, &headers, "create", "news", Some(article.id))
        .await;
    Ok((StatusCode::CREATED, Json(article)))
}

async fn update_news(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<UpdateNewsInput>,
) -> Result<Json<NewsArticle>, ApiError> {
    let article = state.content_service.update_news(id, body).await?;
    state
        .record_activity(&user.0, &headers, "update", "news", Some(id))
        .await;
    Ok(Json(article))
}

async fn delete_news(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.content_service.delete_news(id).await?;
    state
        .record_activity(&user.0, &headers, "delete", "news", Some(id))
        .await;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Speeches
// ============================================================================

async fn list_speeches(
    State(state): State<AppState>,
    Query(query): Query<ContentListQuery>,
) -> Result<Json<PagedResult<Speech>>, ApiError> {
    let page = state
        .content_service
        .list_speeches(query.status, &query.admin_params())
        .await?;
    Ok(Json(page))
}

async fn get_speech(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Speech>, ApiError> {
    Ok(Json(state.content_service.get_speech(id).await?))
}

async fn create_speech(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    headers: HeaderMap,
    Json(body): Json<CreateSpeechInput>,
) -> Result<(StatusCode, Json<Speech>), ApiError> {
    let speech = state
        .content_service
        .create_speech(body, user.actor_id())
        .await?;
    state
        .record_activity(&user.0, &headers, "create", "speech", Some(speech.id))
        .await;
    Ok((StatusCode::CREATED, Json(speech)))
}

async fn update_speech(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<UpdateSpeechInput>,
) -> Result<Json<Speech>, ApiError> {
    let speech = state.content_service.update_speech(id, body).await?;
    state
        .record_activity(&user.0, &headers, "update", "speech", Some(id))
        .await;
    Ok(Json(speech))
}

async fn delete_speech(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.content_service.delete_speech(id).await?;
    state
        .record_activity(&user.0, &headers, "delete", "speech", Some(id))
        .await;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Reports
// ============================================================================

async fn list_reports(
    State(state): State<AppState>,
    Query(query): Query<ContentListQuery>,
) -> Result<Json<PagedResult<Report>>, ApiError> {
    let page = state
        .content_service
        .list_reports(query.status, &query.admin_params())
        .await?;
    Ok(Json(page))
}

async fn get_report(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Report>, ApiError> {
    Ok(Json(state.content_service.get_report(id).await?))
}

async fn create_report(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    headers: HeaderMap,
    Json(body): Json<CreateReportInput>,
) -> Result<(StatusCode, Json<Report>), ApiError> {
    let report = state
        .content_service
        .create_report(body, user.actor_id())
        .await?;
    state
        .record_activity(&user.0, &headers, "create", "report", Some(report.id))
        .await;
    Ok((StatusCode::CREATED, Json(report)))
}

async fn update_report(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<UpdateReportInput>,
) -> Result<Json<Report>, ApiError> {
    let report = state.content_service.update_report(id, body).await?;
    state
        .record_activity(&user.0, &headers, "update", "report", Some(id))
        .await;
    Ok(Json(report))
}

async fn delete_report(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.content_service.delete_report(id).await?;
    state
        .record_activity(&user.0, &headers, "delete", "report", Some(id))
        .await;
    Ok(StatusCode::NO_CONTENT)
}
