//! Authentication API endpoints
//!
//! - POST /api/auth/login - Email and password login
//! - POST /api/auth/logout - End the current session
//! - GET /api/auth/me - Current user

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::net::IpAddr;

use crate::api::middleware::{client_ip, extract_session_token, ApiError, AppState, AuthenticatedUser};
use crate::models::{NewActivity, User};
use crate::services::user::{LoginInput, UserServiceError};

const SESSION_COOKIE: &str = "session";

/// Response for successful authentication
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

/// Routes reachable without a session
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
}

/// Routes behind `require_auth`
pub fn protected_router() -> Router<AppState> {
    Router::new().route("/me", get(me))
}

fn session_cookie(token: &str, max_age_secs: i64) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, token, max_age_secs
    )
}

/// POST /api/auth/login
async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<LoginInput>,
) -> Result<impl IntoResponse, ApiError> {
    let ip = client_ip(&headers);

    if let Some(addr) = ip.as_deref().and_then(|s| s.parse::<IpAddr>().ok()) {
        if state.rate_limiter.check_ip(addr).await {
            tracing::warn!("Login rate limit hit for {}", addr);
            return Err(ApiError::rate_limited(
                "Too many login attempts, please wait a minute",
                60,
            ));
        }
    }

    if state.rate_limiter.is_email_limited(&body.email).await {
        return Err(ApiError::rate_limited(
            "Too many failed attempts, please try again in 15 minutes",
            900,
        ));
    }

    let (user, session) = match state.user_service.login(&body).await {
        Ok(found) => found,
        Err(e) => {
            if matches!(e, UserServiceError::AuthenticationError(_)) {
                state.rate_limiter.record_failure(&body.email).await;
                tracing::info!("Failed login for {}", body.email.trim());
            }
            return Err(e.into());
        }
    };

    state.rate_limiter.clear_email(&body.email).await;
    state
        .activity_service
        .record(
            NewActivity::new((!user.is_demo()).then_some(user.id), "login")
                .entity("user", Some(user.id))
                .ip(ip),
        )
        .await;

    let cookie = session_cookie(&session.id, state.session_days * 24 * 60 * 60);
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse {
            user,
            token: session.id,
        }),
    ))
}

/// POST /api/auth/logout
async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(token) = extract_session_token(&headers) {
        state.user_service.logout(&token).await?;
    }
    Ok((
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, session_cookie("", 0))],
    ))
}

/// GET /api/auth/me
async fn me(AuthenticatedUser(user): AuthenticatedUser) -> Json<User> {
    Json(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_is_http_only() {
        let cookie = session_cookie("abc", 604800);
        assert!(cookie.starts_with("session=abc;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=604800"));
        assert!(session_cookie("", 0).contains("Max-Age=0"));
    }
}
