//! API layer - HTTP handlers and routing
//!
//! - `/api/*` public read endpoints and the contact form
//! - `/api/auth/*` login, logout and the current user
//! - `/api/admin/*` back office, behind a session and the role gates
//! - uploaded media served as static files under the upload prefix

pub mod activity;
pub mod auth;
pub mod backups;
pub mod common;
pub mod content;
pub mod dashboard;
pub mod media;
pub mod messages;
pub mod middleware;
pub mod profile;
pub mod public;
pub mod schedule;
pub mod seo;
pub mod settings;
pub mod site;
pub mod social;
pub mod users;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    Router,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, services::ServeDir, trace::TraceLayer};

pub use middleware::{ApiError, AppState, AuthenticatedUser, RequestStats};

/// Build the `/api` router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    let super_admin_routes = Router::new()
        .nest("/users", users::router())
        .nest("/activity", activity::router())
        .nest("/backups", backups::router())
        .route_layer(axum_middleware::from_fn(middleware::require_super_admin));

    let admin_routes = Router::new()
        .nest("/content", content::router())
        .nest("/media", media::router(state.upload_config.max_file_size))
        .nest("/messages", messages::router())
        .nest("/social", social::router())
        .nest("/schedule", schedule::router())
        .nest("/seo", seo::router())
        .nest("/settings", settings::router())
        .nest("/profile", profile::router())
        .nest("/dashboard", dashboard::router())
        .merge(super_admin_routes)
        .route_layer(axum_middleware::from_fn(middleware::require_viewer))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    let protected_auth = auth::protected_router().route_layer(
        axum_middleware::from_fn_with_state(state.clone(), middleware::require_auth),
    );

    Router::new()
        .merge(public::router())
        .merge(site::router())
        .nest("/auth", auth::public_router().merge(protected_auth))
        .nest("/admin", admin_routes)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let mut cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
        .allow_credentials(true);
    match cors_origin.parse::<HeaderValue>() {
        Ok(origin) => cors = cors.allow_origin(origin),
        Err(_) => tracing::warn!("Ignoring unusable CORS origin '{}'", cors_origin),
    }

    let uploads = ServeDir::new(&state.upload_config.path);
    let upload_prefix = state.upload_config.public_prefix.clone();

    Router::new()
        .nest("/api", build_api_router(state.clone()))
        .nest_service(&upload_prefix, uploads)
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        // Outermost so every request is counted
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::request_stats_middleware,
        ))
        .with_state(state)
}
