//! Application assembly
//!
//! Wires repositories, cache and services into an [`AppState`] and runs the
//! periodic maintenance pass.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::api::{AppState, RequestStats};
use crate::cache::create_cache;
use crate::config::Config;
use crate::db::repositories::{
    SqlxActivityRepository, SqlxContactRepository, SqlxMediaRepository, SqlxNewsRepository,
    SqlxReportRepository, SqlxScheduleRepository, SqlxSearchRepository, SqlxSeoRepository,
    SqlxSessionRepository, SqlxSettingsRepository, SqlxSocialRepository, SqlxSpeechRepository,
    SqlxUserRepository,
};
use crate::db::DynDatabasePool;
use crate::services::{
    ActivityService, BackupService, BackupSources, ContactService, ContentService,
    DashboardService, LoginRateLimiter, MarkdownRenderer, MediaService, ScheduleService,
    SearchService, SeoService, SettingsService, SocialService, UserService,
};

/// How often the maintenance pass runs
pub const MAINTENANCE_INTERVAL: Duration = Duration::from_secs(60);

/// Build every service over `pool`
pub fn build_state(pool: DynDatabasePool, config: &Config) -> AppState {
    let cache = create_cache(&config.cache);
    let markdown = MarkdownRenderer::new();
    let upload_config = Arc::new(config.upload.clone());

    let user_repo = SqlxUserRepository::boxed(pool.clone());
    let news_repo = SqlxNewsRepository::boxed(pool.clone());
    let speech_repo = SqlxSpeechRepository::boxed(pool.clone());
    let report_repo = SqlxReportRepository::boxed(pool.clone());
    let media_repo = SqlxMediaRepository::boxed(pool.clone());
    let contact_repo = SqlxContactRepository::boxed(pool.clone());
    let social_repo = SqlxSocialRepository::boxed(pool.clone());
    let schedule_repo = SqlxScheduleRepository::boxed(pool.clone());
    let seo_repo = SqlxSeoRepository::boxed(pool.clone());
    let settings_repo = SqlxSettingsRepository::boxed(pool.clone());

    let user_service = Arc::new(UserService::new(
        user_repo.clone(),
        SqlxSessionRepository::boxed(pool.clone()),
        &config.auth,
    ));
    let content_service = Arc::new(ContentService::new(
        news_repo.clone(),
        speech_repo.clone(),
        report_repo.clone(),
        cache.clone(),
        markdown.clone(),
    ));
    let media_service = Arc::new(MediaService::new(
        media_repo.clone(),
        upload_config.clone(),
        cache.clone(),
    ));
    let contact_service = Arc::new(ContactService::new(contact_repo.clone()));
    let social_service = Arc::new(SocialService::new(social_repo.clone()));
    let schedule_service = Arc::new(ScheduleService::new(
        schedule_repo.clone(),
        content_service.clone(),
        social_service.clone(),
    ));
    let seo_service = Arc::new(SeoService::new(seo_repo.clone(), cache.clone()));
    let settings_service = Arc::new(SettingsService::new(settings_repo.clone(), cache));
    let activity_service = Arc::new(ActivityService::new(SqlxActivityRepository::boxed(
        pool.clone(),
    )));
    let search_service = Arc::new(SearchService::new(
        SqlxSearchRepository::boxed(pool.clone()),
        markdown,
    ));
    let dashboard_service = Arc::new(DashboardService::new(
        content_service.clone(),
        media_service.clone(),
        contact_service.clone(),
        schedule_service.clone(),
        activity_service.clone(),
    ));
    let backup_service = Arc::new(BackupService::new(
        BackupSources {
            users: user_repo,
            news: news_repo,
            speeches: speech_repo,
            reports: report_repo,
            media: media_repo,
            contact: contact_repo,
            social: social_repo,
            schedule: schedule_repo,
            seo: seo_repo,
            settings: settings_repo,
        },
        &config.backup,
    ));

    AppState {
        pool,
        user_service,
        content_service,
        media_service,
        contact_service,
        social_service,
        schedule_service,
        seo_service,
        settings_service,
        activity_service,
        search_service,
        dashboard_service,
        backup_service,
        upload_config,
        request_stats: Arc::new(RequestStats::new()),
        rate_limiter: Arc::new(LoginRateLimiter::new()),
        session_days: config.auth.session_days,
    }
}

/// Publish due schedule entries, purge expired sessions, prune the limiter.
///
/// Each step logs its own failure and the pass carries on.
pub async fn run_maintenance(state: &AppState) {
    match state.schedule_service.publish_due(Utc::now()).await {
        Ok(report) if report.published + report.failed + report.social_published > 0 => {
            tracing::info!(
                "Scheduled publishing: {} published, {} failed, {} social posts",
                report.published,
                report.failed,
                report.social_published
            );
        }
        Ok(_) => {}
        Err(e) => tracing::warn!("Scheduled publishing failed: {}", e),
    }

    match state.user_service.cleanup_expired_sessions().await {
        Ok(0) => {}
        Ok(n) => tracing::debug!("Removed {} expired sessions", n),
        Err(e) => tracing::warn!("Session cleanup failed: {}", e),
    }

    state.rate_limiter.cleanup().await;
}

/// Run [`run_maintenance`] every [`MAINTENANCE_INTERVAL`]
pub fn spawn_maintenance(state: AppState) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(MAINTENANCE_INTERVAL);
        loop {
            interval.tick().await;
            run_maintenance(&state).await;
        }
    })
}
