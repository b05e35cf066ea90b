//! Admin social accounts and posts
//!
//! Mounted at `/api/admin/social`. Publishing only records the state change;
//! nothing is sent to the platforms.

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
    CreateSocialAccountInput, CreateSocialPostInput, PagedResult, SocialAccount, SocialPost,
    SocialPostStatus, UpdateSocialAccountInput, UpdateSocialPostInput,
};

pub fn router() -> Router<AppState> {
    let reads = Router::new()
        .route("/accounts", get(list_accounts))
        .route("/accounts/{id}", get(get_account))
        .route("/posts", get(list_posts))
        .route("/posts/{id}", get(get_post));

    let writes = Router::new()
        .route("/accounts", post(create_account))
        .route("/accounts/{id}", put(update_account).delete(delete_account))
        .route("/posts", post(create_post))
        .route("/posts/{id}", put(update_post).delete(delete_post))
        .route("/posts/{id}/publish", post(publish_post))
        .route_layer(from_fn(require_content_editor));

    reads.merge(writes)
}

// ============================================================================
// Accounts
// ============================================================================

async fn list_accounts(State(state): State<AppState>) -> Result<Json<Vec<SocialAccount>>, ApiError> {
    Ok(Json(state.social_service.list_accounts().await?))
}

async fn get_account(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<SocialAccount>, ApiError> {
    Ok(Json(state.social_service.get_account(id).await?))
}

async fn create_account(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    headers: HeaderMap,
    Json(body): Json<CreateSocialAccountInput>,
) -> Result<(StatusCode, Json<SocialAccount>), ApiError> {
    let account = state.social_service.create_account(body).await?;
    state
        .record_activity(&user.0, &headers, "create", "social_account", Some(account.id))
        .await;
    Ok((StatusCode::CREATED, Json(account)))
}

async fn update_account(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<UpdateSocialAccountInput>,
) -> Result<Json<SocialAccount>, ApiError> {
    let account = state.social_service.update_account(id, body).await?;
    state
        .record_activity(&user.0, &headers, "update", "social_account", Some(id))
        .await;
    Ok(Json(account))
}

async fn delete_account(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.social_service.delete_account(id).await?;
    state
        .record_activity(&user.0, &headers, "delete", "social_account", Some(id))
        .await;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Posts
// ============================================================================

async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<StatusPageQuery<SocialPostStatus>>,
) -> Result<Json<PagedResult<SocialPost>>, ApiError> {
    let page = state
        .social_service
        .list_posts(query.status, &query.admin_params())
        .await?;
    Ok(Json(page))
}

async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<SocialPost>, ApiError> {
    Ok(Json(state.social_service.get_post(id).await?))
}

async fn create_post(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    headers: HeaderMap,
    Json(body): Json<CreateSocialPostInput>,
) -> Result<(StatusCode, Json<SocialPost>), ApiError> {
    let post = state
        .social_service
        .create_post(body, user.actor_id())
        .await?;
    state
        .record_activity(&user.0, &headers, "create", "social_post", Some(post.id))
        .await;
    Ok((StatusCode::CREATED, Json(post)))
}

async fn update_post(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<UpdateSocialPostInput>,
) -> Result<Json<SocialPost>, ApiError> {
    let post = state.social_service.update_post(id, body).await?;
    state
        .record_activity(&user.0, &headers, "update", "social_post", Some(id))
        .await;
    Ok(Json(post))
}

async fn delete_post(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.social_service.delete_post(id).await?;
    state
        .record_activity(&user.0, &headers, "delete", "social_post", Some(id))
        .await;
    Ok(StatusCode::NO_CONTENT)
}

async fn publish_post(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<SocialPost>, ApiError> {
    let post = state.social_service.publish_post(id).await?;
    state
        .record_activity(&user.0, &headers, "publish", "social_post", Some(id))
        .await;
    Ok(Json(post))
}
