//! Podium server

use anyhow::Result;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use podium::{api, app, config::Config, db};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "podium=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Podium...");

    let mut config = Config::load_with_env(Path::new("config.yml"))?;
    for warning in config.sanitize() {
        tracing::warn!("Config: {}", warning);
    }
    tracing::info!("Configuration loaded");

    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {:?}", config.database.driver);

    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    let state = app::build_state(pool, &config);

    if let Some(admin) = state
        .user_service
        .ensure_bootstrap_admin(config.auth.bootstrap_admin.as_ref())
        .await?
    {
        tracing::info!("Created bootstrap super admin {}", admin.email);
    }
    if config.auth.demo.enabled {
        tracing::warn!(
            "Demo account enabled: {} ({:?})",
            config.auth.demo.email,
            config.auth.demo.role
        );
    }

    app::spawn_maintenance(state.clone());

    let router = api::build_router(state, &config.server.cors_origin);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, router).await?;

    Ok(())
}
