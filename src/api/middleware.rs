//! API middleware
//!
//! Contains:
//! - Request statistics for the dashboard
//! - Shared application state
//! - The JSON error type and its conversions from service errors
//! - Session authentication and role gates for the admin routes

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::config::UploadConfig;
use crate::db::DynDatabasePool;
use crate::models::{NewActivity, User, UserRole};
use crate::services::{
    ActivityService, BackupError, BackupService, ContactError, ContactService, ContentError,
    ContentService, DashboardService, LoginRateLimiter, MediaError, MediaService, ScheduleError,
    ScheduleService, SearchService, SeoError, SeoService, SettingsService, SettingsServiceError,
    SocialError, SocialService, UserService, UserServiceError,
};

// ============================================================================
// Request Statistics
// ============================================================================

/// Request counters kept with atomics
pub struct RequestStats {
    total_requests: AtomicU64,
    total_response_time_us: AtomicU64,
    start_time: Instant,
}

impl RequestStats {
    pub fn new() -> Self {
        Self {
            total_requests: AtomicU64::new(0),
            total_response_time_us: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record(&self, duration_us: u64) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.total_response_time_us.fetch_add(duration_us, Ordering::Relaxed);
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::Relaxed)
    }

    /// Average response time in microseconds
    pub fn avg_response_time_us(&self) -> f64 {
        let total = self.total_requests.load(Ordering::Relaxed);
        if total == 0 {
            return 0.0;
        }
        self.total_response_time_us.load(Ordering::Relaxed) as f64 / total as f64
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

impl Default for RequestStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub pool: DynDatabasePool,
    pub user_service: Arc<UserService>,
    pub content_service: Arc<ContentService>,
    pub media_service: Arc<MediaService>,
    pub contact_service: Arc<ContactService>,
    pub social_service: Arc<SocialService>,
    pub schedule_service: Arc<ScheduleService>,
    pub seo_service: Arc<SeoService>,
    pub settings_service: Arc<SettingsService>,
    pub activity_service: Arc<ActivityService>,
    pub search_service: Arc<SearchService>,
    pub dashboard_service: Arc<DashboardService>,
    pub backup_service: Arc<BackupService>,
    pub upload_config: Arc<UploadConfig>,
    pub request_stats: Arc<RequestStats>,
    pub rate_limiter: Arc<LoginRateLimiter>,
    /// Lifetime of the session cookie
    pub session_days: i64,
}

impl AppState {
    /// Append an entry to the activity log on behalf of `user`
    pub async fn record_activity(
        &self,
        user: &User,
        headers: &HeaderMap,
        action: &str,
        entity_type: &str,
        entity_id: Option<i64>,
    ) {
        let user_id = (!user.is_demo()).then_some(user.id);
        self.activity_service
            .record(
                NewActivity::new(user_id, action)
                    .entity(entity_type, entity_id)
                    .ip(client_ip(headers)),
            )
            .await;
    }
}

/// Authenticated user extracted from request
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl AuthenticatedUser {
    /// Id stored as author/creator; the demo account has no row to point at
    pub fn actor_id(&self) -> Option<i64> {
        (!self.0.is_demo()).then_some(self.0.id)
    }
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("CONFLICT", message)
    }

    pub fn rate_limited(message: impl Into<String>, retry_after_secs: u64) -> Self {
        Self::with_details(
            "RATE_LIMIT",
            message,
            serde_json::json!({ "retry_after": retry_after_secs }),
        )
    }

    /// Log the cause and answer with a generic 500
    pub fn internal(err: impl std::fmt::Display) -> Self {
        tracing::error!("Request failed: {:#}", err);
        Self::new("INTERNAL_ERROR", "Internal server error")
    }

    pub fn status(&self) -> StatusCode {
        match self.error.code.as_str() {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "CONFLICT" => StatusCode::CONFLICT,
            "RATE_LIMIT" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self::internal(e)
    }
}

impl From<UserServiceError> for ApiError {
    fn from(e: UserServiceError) -> Self {
        match e {
            UserServiceError::AuthenticationError(msg) => Self::unauthorized(msg),
            UserServiceError::SessionExpired | UserServiceError::SessionNotFound => {
                Self::unauthorized("Invalid or expired session")
            }
            UserServiceError::ValidationError(msg) => Self::validation_error(msg),
            UserServiceError::Conflict(msg) => Self::conflict(msg),
            UserServiceError::NotFound => Self::not_found("User not found"),
            UserServiceError::InternalError(e) => Self::internal(e),
        }
    }
}

impl From<ContentError> for ApiError {
    fn from(e: ContentError) -> Self {
        match e {
            ContentError::NotFound(what) => Self::not_found(format!("{} not found", what)),
            ContentError::ValidationError(msg) => Self::validation_error(msg),
            ContentError::Conflict(slug) => Self::conflict(format!("Slug '{}' is already in use", slug)),
            ContentError::InternalError(e) => Self::internal(e),
        }
    }
}

impl From<MediaError> for ApiError {
    fn from(e: MediaError) -> Self {
        match e {
            MediaError::NotFound => Self::not_found("Media file not found"),
            MediaError::ValidationError(msg) => Self::validation_error(msg),
            MediaError::InternalError(e) => Self::internal(e),
        }
    }
}

impl From<ContactError> for ApiError {
    fn from(e: ContactError) -> Self {
        match e {
            ContactError::NotFound => Self::not_found("Message not found"),
            ContactError::ValidationError(msg) => Self::validation_error(msg),
            ContactError::InternalError(e) => Self::internal(e),
        }
    }
}

impl From<SocialError> for ApiError {
    fn from(e: SocialError) -> Self {
        match e {
            SocialError::NotFound(what) => Self::not_found(format!("{} not found", what)),
            SocialError::ValidationError(msg) => Self::validation_error(msg),
            SocialError::InternalError(e) => Self::internal(e),
        }
    }
}

impl From<ScheduleError> for ApiError {
    fn from(e: ScheduleError) -> Self {
        match e {
            ScheduleError::NotFound => Self::not_found("Scheduled post not found"),
            ScheduleError::ValidationError(msg) => Self::validation_error(msg),
            ScheduleError::InternalError(e) => Self::internal(e),
        }
    }
}

impl From<SeoError> for ApiError {
    fn from(e: SeoError) -> Self {
        match e {
            SeoError::NotFound(what) => Self::not_found(format!("{} not found", what)),
            SeoError::ValidationError(msg) => Self::validation_error(msg),
            SeoError::Conflict(msg) => Self::conflict(msg),
            SeoError::InternalError(e) => Self::internal(e),
        }
    }
}

impl From<SettingsServiceError> for ApiError {
    fn from(e: SettingsServiceError) -> Self {
        match e {
            SettingsServiceError::InvalidValue(msg) => Self::validation_error(msg),
            SettingsServiceError::InternalError(e) => Self::internal(e),
        }
    }
}

impl From<BackupError> for ApiError {
    fn from(e: BackupError) -> Self {
        match e {
            BackupError::InvalidName(name) => {
                Self::validation_error(format!("Invalid backup name: {}", name))
            }
            BackupError::NotFound(name) => Self::not_found(format!("Backup {} not found", name)),
            BackupError::InternalError(e) => Self::internal(e),
        }
    }
}

// ============================================================================
// Authentication
// ============================================================================

/// Session token from `Authorization: Bearer` or the `session` cookie
pub(crate) fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }

    if let Some(cookie_header) = headers.get(header::COOKIE) {
        if let Ok(cookie_str) = cookie_header.to_str() {
            for cookie in cookie_str.split(';') {
                if let Some(token) = cookie.trim().strip_prefix("session=") {
                    return Some(token.to_string());
                }
            }
        }
    }

    None
}

/// Client address as reported by the reverse proxy.
///
/// `X-Real-IP` is set by the proxy and wins. Otherwise the right-most
/// `X-Forwarded-For` hop is used, since that is the one the proxy appended;
/// earlier hops come from the client and are ignored.
pub fn client_ip(headers: &HeaderMap) -> Option<String> {
    let header_str = |name: &str| headers.get(name).and_then(|h| h.to_str().ok());

    if let Some(ip) = header_str("x-real-ip").map(str::trim).filter(|s| !s.is_empty()) {
        return Some(ip.to_string());
    }
    header_str("x-forwarded-for")?
        .rsplit(',')
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// Authentication middleware
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_session_token(request.headers())
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;

    let user = state.user_service.validate_session(&token).await?;

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}

fn ensure_role(request: &Request, required: UserRole) -> Result<(), ApiError> {
    let user = request
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    if !user.0.has_role(required) {
        return Err(ApiError::forbidden(format!(
            "This action requires the {} role",
            required
        )));
    }
    Ok(())
}

/// Any signed-in back-office user
pub async fn require_viewer(request: Request, next: Next) -> Result<Response, ApiError> {
    ensure_role(&request, UserRole::Viewer)?;
    Ok(next.run(request).await)
}

pub async fn require_news_editor(request: Request, next: Next) -> Result<Response, ApiError> {
    ensure_role(&request, UserRole::NewsEditor)?;
    Ok(next.run(request).await)
}

pub async fn require_media_manager(request: Request, next: Next) -> Result<Response, ApiError> {
    ensure_role(&request, UserRole::MediaManager)?;
    Ok(next.run(request).await)
}

pub async fn require_content_editor(request: Request, next: Next) -> Result<Response, ApiError> {
    ensure_role(&request, UserRole::ContentEditor)?;
    Ok(next.run(request).await)
}

pub async fn require_super_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    ensure_role(&request, UserRole::SuperAdmin)?;
    Ok(next.run(request).await)
}

/// Records request count and response time for the dashboard
pub async fn request_stats_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let response = next.run(request).await;
    state.request_stats.record(start.elapsed().as_micros() as u64);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn headers_with(name: header::HeaderName, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name, value.parse().unwrap());
        headers
    }

    fn request_as(role: UserRole) -> Request {
        let mut request = Request::builder().uri("/test").body(Body::empty()).unwrap();
        let user = User::new("a@example.org".into(), "A".into(), String::new(), role);
        request.extensions_mut().insert(AuthenticatedUser(user));
        request
    }

    #[test]
    fn test_extract_session_token_from_bearer() {
        let headers = headers_with(header::AUTHORIZATION, "Bearer test-token-123");
        assert_eq!(extract_session_token(&headers), Some("test-token-123".to_string()));
    }

    #[test]
    fn test_extract_session_token_from_cookie() {
        let headers = headers_with(header::COOKIE, "theme=dark; session=test-token-456");
        assert_eq!(extract_session_token(&headers), Some("test-token-456".to_string()));
    }

    #[test]
    fn test_extract_session_token_bearer_priority() {
        let mut headers = headers_with(header::AUTHORIZATION, "Bearer bearer-token");
        headers.insert(header::COOKIE, "session=cookie-token".parse().unwrap());
        assert_eq!(extract_session_token(&headers), Some("bearer-token".to_string()));
    }

    #[test]
    fn test_extract_session_token_none() {
        assert!(extract_session_token(&HeaderMap::new()).is_none());
        let headers = headers_with(header::AUTHORIZATION, "Basic invalid");
        assert!(extract_session_token(&headers).is_none());
    }

    #[test]
    fn test_client_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.7, 198.51.100.4".parse().unwrap());
        // Only the hop appended by the proxy counts
        assert_eq!(client_ip(&headers), Some("198.51.100.4".to_string()));
        headers.insert("x-forwarded-for", "1.2.3.4, 198.51.100.4, ".parse().unwrap());
        assert_eq!(client_ip(&headers), Some("198.51.100.4".to_string()));

        headers.insert("x-real-ip", "10.0.0.9".parse().unwrap());
        assert_eq!(client_ip(&headers), Some("10.0.0.9".to_string()));

        let headers = headers_with(header::HeaderName::from_static("x-real-ip"), "10.0.0.9");
        assert_eq!(client_ip(&headers), Some("10.0.0.9".to_string()));
        assert_eq!(client_ip(&HeaderMap::new()), None);
    }

    #[test]
    fn test_api_error_status_codes() {
        assert_eq!(ApiError::unauthorized("x").status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::forbidden("x").status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::not_found("x").status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::validation_error("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::conflict("x").status(), StatusCode::CONFLICT);
        assert_eq!(ApiError::rate_limited("x", 60).status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            ApiError::internal("boom").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_error_hides_cause() {
        let error = ApiError::from(ContentError::InternalError(anyhow::anyhow!("db password=hunter2")));
        assert_eq!(error.error.code, "INTERNAL_ERROR");
        assert!(!error.error.message.contains("hunter2"));
    }

    #[test]
    fn test_service_error_mapping() {
        let e: ApiError = ContentError::Conflict("budget".into()).into();
        assert_eq!(e.status(), StatusCode::CONFLICT);
        let e: ApiError = UserServiceError::SessionExpired.into();
        assert_eq!(e.status(), StatusCode::UNAUTHORIZED);
        let e: ApiError = SeoError::NotFound("SEO page").into();
        assert_eq!(e.error.message, "SEO page not found");
    }

    #[test]
    fn test_ensure_role() {
        assert!(ensure_role(&request_as(UserRole::Viewer), UserRole::Viewer).is_ok());
        assert!(ensure_role(&request_as(UserRole::ContentEditor), UserRole::NewsEditor).is_ok());

        let denied = ensure_role(&request_as(UserRole::Viewer), UserRole::NewsEditor).unwrap_err();
        assert_eq!(denied.status(), StatusCode::FORBIDDEN);

        let anonymous = Request::builder().uri("/test").body(Body::empty()).unwrap();
        let denied = ensure_role(&anonymous, UserRole::Viewer).unwrap_err();
        assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn role_strategy() -> impl Strategy<Value = UserRole> {
            prop_oneof![
                Just(UserRole::SuperAdmin),
                Just(UserRole::ContentEditor),
                Just(UserRole::MediaManager),
                Just(UserRole::NewsEditor),
                Just(UserRole::Viewer),
            ]
        }

        proptest! {
            #[test]
            fn property_role_gate_matches_hierarchy(held in role_strategy(), required in role_strategy()) {
                let allowed = ensure_role(&request_as(held), required).is_ok();
                prop_assert_eq!(allowed, held.level() >= required.level());
            }

            #[test]
            fn property_viewer_never_passes_mutation_gates(required in role_strategy()) {
                prop_assume!(required != UserRole::Viewer);
                prop_assert!(ensure_role(&request_as(UserRole::Viewer), required).is_err());
            }
        }
    }
}
