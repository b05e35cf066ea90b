//! Activity log listing, super admin only

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::api::common::{list_params, ADMIN_PER_PAGE};
use crate::api::middleware::{ApiError, AppState};
use crate::models::{PagedResult, UserActivity};

#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    pub user_id: Option<i64>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_activity))
}

async fn list_activity(
    State(state): State<AppState>,
    Query(query): Query<ActivityQuery>,
) -> Result<Json<PagedResult<UserActivity>>, ApiError> {
    let params = list_params(query.page, query.per_page, ADMIN_PER_PAGE);
    Ok(Json(state.activity_service.list(query.user_id, &params).await?))
}
