//! Public read API
//!
//! Only published content is visible here; drafts and archived items answer
//! 404 exactly like missing ones.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::common::{list_params, parse_filter, PageQuery};
use crate::api::middleware::{ApiError, AppState};
use crate::models::{
    ContentKind, CreateContactInput, ListParams, MediaFile, MediaType, NewsArticle, PagedResult,
    Report, Speech,
};
use crate::services::SearchHit;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/news", get(list_news))
        .route("/news/{slug}", get(get_news))
        .route("/speeches", get(list_speeches))
        .route("/speeches/{slug}", get(get_speech))
        .route("/reports", get(list_reports))
        .route("/reports/{slug}", get(get_report))
        .route("/media", get(list_media))
        .route("/search", get(search))
        .route("/contact", post(submit_contact))
}

/// Public pages default to the configured page size
async fn public_params(state: &AppState, query: &PageQuery) -> Result<ListParams, ApiError> {
    let per_page = match query.per_page {
        Some(n) => n,
        None => state.settings_service.get_settings().await?.items_per_page,
    };
    Ok(list_params(query.page, Some(per_page), per_page))
}

/// GET /api/news
async fn list_news(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PagedResult<NewsArticle>>, ApiError> {
    let params = public_params(&state, &query).await?;
    Ok(Json(state.content_service.published_news(&params).await?))
}

/// GET /api/news/{slug}
async fn get_news(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<NewsArticle>, ApiError> {
    Ok(Json(state.content_service.published_news_by_slug(&slug).await?))
}

/// GET /api/speeches
async fn list_speeches(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PagedResult<Speech>>, ApiError> {
    let params = public_params(&state, &query).await?;
    Ok(Json(state.content_service.published_speeches(&params).await?))
}

/// GET /api/speeches/{slug}
async fn get_speech(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Speech>, ApiError> {
    Ok(Json(state.content_service.published_speech_by_slug(&slug).await?))
}

/// GET /api/reports
async fn list_reports(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PagedResult<Report>>, ApiError> {
    let params = public_params(&state, &query).await?;
    Ok(Json(state.content_service.published_reports(&params).await?))
}

/// GET /api/reports/{slug}
async fn get_report(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Report>, ApiError> {
    Ok(Json(state.content_service.published_report_by_slug(&slug).await?))
}

#[derive(Debug, Deserialize)]
pub struct GalleryQuery {
    pub media_type: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// GET /api/media?media_type=image
async fn list_media(
    State(state): State<AppState>,
    Query(query): Query<GalleryQuery>,
) -> Result<Json<PagedResult<MediaFile>>, ApiError> {
    let media_type: Option<MediaType> = parse_filter(query.media_type.as_deref(), "media_type")?;
    let page_query = PageQuery {
        page: query.page,
        per_page: query.per_page,
    };
    let params = public_params(&state, &page_query).await?;
    Ok(Json(state.media_service.gallery(media_type, &params).await?))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    #[serde(flatten)]
    pub results: PagedResult<SearchHit>,
}

/// GET /api/search?q=&type=&page=&per_page=
async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, ApiError> {
    let kind: Option<ContentKind> = parse_filter(query.kind.as_deref(), "type")?;
    let params = list_params(query.page, query.per_page, 10);
    let results = state.search_service.search(&query.q, kind, &params).await?;
    Ok(Json(SearchResponse {
        query: query.q.trim().to_string(),
        results,
    }))
}

#[derive(Debug, Serialize)]
pub struct ContactReceipt {
    pub id: i64,
    pub message: &'static str,
}

/// POST /api/contact
async fn submit_contact(
    State(state): State<AppState>,
    Json(body): Json<CreateContactInput>,
) -> Result<(StatusCode, Json<ContactReceipt>), ApiError> {
    let created = state.contact_service.submit(body).await?;
    Ok((
        StatusCode::CREATED,
        Json(ContactReceipt {
            id: created.id,
            message: "Thank you, your message has been received",
        }),
    ))
}
