//! Admin system settings
//!
//! Every back-office role can read the settings; only a super admin may
//! change them.

use axum::{
    extract::State,
    http::HeaderMap,
    middleware::from_fn,
    routing::{get, put},
    Json, Router,
};

use crate::api::middleware::{require_super_admin, ApiError, AppState, AuthenticatedUser};
use crate::services::settings::{SystemSettings, UpdateSettingsInput};

pub fn router() -> Router<AppState> {
    let reads = Router::new().route("/", get(get_settings));
    let writes = Router::new()
        .route("/", put(update_settings))
        .route_layer(from_fn(require_super_admin));
    reads.merge(writes)
}

async fn get_settings(State(state): State<AppState>) -> Result<Json<SystemSettings>, ApiError> {
    Ok(Json(state.settings_service.get_settings().await?))
}

async fn update_settings(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    headers: HeaderMap,
    Json(body): Json<UpdateSettingsInput>,
) -> Result<Json<SystemSettings>, ApiError> {
    let settings = state.settings_service.update(body).await?;
    state
        .record_activity(&user.0, &headers, "update", "settings", None)
        .await;
    Ok(Json(settings))
}
