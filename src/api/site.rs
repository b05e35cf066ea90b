//! Public site information API
//!
//! - GET /api/site - Biography, constituency and contact details
//! - GET /api/seo?path= - Metadata for one public page
//! - GET /api/health - Liveness with a database ping

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState};
use crate::config::DatabaseDriver;
use crate::models::SeoPage;
use crate::services::settings::PublicSiteInfo;

pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Serialize)]
pub struct SiteInfoResponse {
    pub version: &'static str,
    #[serde(flatten)]
    pub info: PublicSiteInfo,
}

#[derive(Debug, Deserialize)]
pub struct SeoQuery {
    pub path: String,
}

/// What a page head needs; the score stays in the back office
#[derive(Debug, Serialize)]
pub struct PageMetaResponse {
    pub path: String,
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub keywords: Option<String>,
    pub og_image: Option<String>,
    pub canonical_url: Option<String>,
    pub no_index: bool,
}

impl From<SeoPage> for PageMetaResponse {
    fn from(page: SeoPage) -> Self {
        Self {
            path: page.path,
            title: page.title,
            meta_description: page.meta_description,
            keywords: page.keywords,
            og_image: page.og_image,
            canonical_url: page.canonical_url,
            no_index: page.no_index,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub database: DatabaseDriver,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/site", get(get_site_info))
        .route("/seo", get(get_page_meta))
        .route("/health", get(health))
}

/// GET /api/site
async fn get_site_info(State(state): State<AppState>) -> Result<Json<SiteInfoResponse>, ApiError> {
    let info = state.settings_service.public_info().await?;
    Ok(Json(SiteInfoResponse {
        version: APP_VERSION,
        info,
    }))
}

/// GET /api/seo?path=/news
async fn get_page_meta(
    State(state): State<AppState>,
    Query(query): Query<SeoQuery>,
) -> Result<Json<PageMetaResponse>, ApiError> {
    let page = state.seo_service.page_for_path(&query.path).await?;
    Ok(Json(page.into()))
}

/// GET /api/health
async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    state.pool.ping().await?;
    Ok(Json(HealthResponse {
        status: "ok",
        version: APP_VERSION,
        database: state.pool.driver(),
    }))
}
