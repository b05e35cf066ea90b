//! The signed-in user's own profile

use axum::{
    extract::State,
    http::HeaderMap,
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;

use crate::api::common::SuccessResponse;
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{UpdateProfileInput, User};

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_profile).put(update_profile))
        .route("/password", put(change_password))
}

/// GET /api/admin/profile - fresh from the store, not the session snapshot
async fn get_profile(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<User>, ApiError> {
    Ok(Json(state.user_service.get_by_id(user.id).await?))
}

async fn update_profile(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    headers: HeaderMap,
    Json(body): Json<UpdateProfileInput>,
) -> Result<Json<User>, ApiError> {
    let updated = state.user_service.update_profile(&user, body).await?;
    state
        .record_activity(&user, &headers, "update", "profile", Some(user.id))
        .await;
    Ok(Json(updated))
}

async fn change_password(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    headers: HeaderMap,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state
        .user_service
        .change_password(&user, &body.current_password, &body.new_password)
        .await?;
    state
        .record_activity(&user, &headers, "change_password", "profile", Some(user.id))
        .await;
    Ok(Json(SuccessResponse::ok()))
}
