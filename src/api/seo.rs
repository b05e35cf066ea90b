//! Admin SEO metadata: pages, tracked keywords and the audit

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    middleware::from_fn,
    routing::{get, post, put},
    Json, Router,
};

use crate::api::common::PageQuery;
use crate::api::middleware::{require_content_editor, ApiError, AppState, AuthenticatedUser};
use crate::models::{
    CreateSeoKeywordInput, CreateSeoPageInput, PagedResult, SeoAuditEntry, SeoKeyword, SeoPage,
    UpdateSeoKeywordInput, UpdateSeoPageInput,
};

pub fn router() -> Router<AppState> {
    let reads = Router::new()
        .route("/pages", get(list_pages))
        .route("/pages/{id}", get(get_page))
        .route("/keywords", get(list_keywords))
        .route("/keywords/{id}", get(get_keyword))
        .route("/audit", get(audit));

    let writes = Router::new()
        .route("/pages", post(create_page))
        .route("/pages/{id}", put(update_page).delete(delete_page))
        .route("/keywords", post(create_keyword))
        .route("/keywords/{id}", put(update_keyword).delete(delete_keyword))
        .route_layer(from_fn(require_content_editor));

    reads.merge(writes)
}

// ============================================================================
// Pages
// ============================================================================

async fn list_pages(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PagedResult<SeoPage>>, ApiError> {
    Ok(Json(state.seo_service.list_pages(&query.admin_params()).await?))
}

async fn get_page(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<SeoPage>, ApiError> {
    Ok(Json(state.seo_service.get_page(id).await?))
}

async fn create_page(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    headers: HeaderMap,
    Json(body): Json<CreateSeoPageInput>,
) -> Result<(StatusCode, Json<SeoPage>), ApiError> {
    let page = state.seo_service.create_page(body).await?;
    state
        .record_activity(&user.0, &headers, "create", "seo_page", Some(page.id))
        .await;
    Ok((StatusCode::CREATED, Json(page)))
}

async fn update_page(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<UpdateSeoPageInput>,
) -> Result<Json<SeoPage>, ApiError> {
    let page = state.seo_service.update_page(id, body).await?;
    state
        .record_activity(&user.0, &headers, "update", "seo_page", Some(id))
        .await;
    Ok(Json(page))
}

async fn delete_page(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.seo_service.delete_page(id).await?;
    state
        .record_activity(&user.0, &headers, "delete", "seo_page", Some(id))
        .await;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/admin/seo/audit - lowest scores first
async fn audit(State(state): State<AppState>) -> Result<Json<Vec<SeoAuditEntry>>, ApiError> {
    Ok(Json(state.seo_service.audit().await?))
}

// ============================================================================
// Keywords
// ============================================================================

async fn list_keywords(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PagedResult<SeoKeyword>>, ApiError> {
    Ok(Json(state.seo_service.list_keywords(&query.admin_params()).await?))
}

async fn get_keyword(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<SeoKeyword>, ApiError> {
    Ok(Json(state.seo_service.get_keyword(id).await?))
}

async fn create_keyword(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    headers: HeaderMap,
    Json(body): Json<CreateSeoKeywordInput>,
) -> Result<(StatusCode, Json<SeoKeyword>), ApiError> {
    let keyword = state.seo_service.create_keyword(body).await?;
    state
        .record_activity(&user.0, &headers, "create", "seo_keyword", Some(keyword.id))
        .await;
    Ok((StatusCode::CREATED, Json(keyword)))
}

async fn update_keyword(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<UpdateSeoKeywordInput>,
) -> Result<Json<SeoKeyword>, ApiError> {
    let keyword = state.seo_service.update_keyword(id, body).await?;
    state
        .record_activity(&user.0, &headers, "update", "seo_keyword", Some(id))
        .await;
    Ok(Json(keyword))
}

async fn delete_keyword(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.seo_service.delete_keyword(id).await?;
    state
        .record_activity(&user.0, &headers, "delete", "seo_keyword", Some(id))
        .await;
    Ok(StatusCode::NO_CONTENT)
}
