//! Scheduled publication
//!
//! A schedule entry names a content item and a time. `publish_due` is run by
//! the background task and publishes whatever has come due.

use crate::db::repositories::ScheduleRepository;
use crate::models::{
    ContentStatus, CreateScheduleInput, ListParams, PagedResult, PublishReport, ScheduleStatus,
    ScheduledPost, UpdateScheduleInput,
};
use crate::services::content::{ContentError, ContentService};
use crate::services::social::SocialService;
use anyhow::Context;
use chrono::{DateTime, Utc};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("Scheduled post not found")]
    NotFound,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl From<ContentError> for ScheduleError {
    fn from(err: ContentError) -> Self {
        match err {
            ContentError::InternalError(e) => ScheduleError::InternalError(e),
            other => ScheduleError::ValidationError(other.to_string()),
        }
    }
}

pub struct ScheduleService {
    repo: Arc<dyn ScheduleRepository>,
    content: Arc<ContentService>,
    social: Arc<SocialService>,
}

impl ScheduleService {
    pub fn new(
        repo: Arc<dyn ScheduleRepository>,
        content: Arc<ContentService>,
        social: Arc<SocialService>,
    ) -> Self {
        Self {
            repo,
            content,
            social,
        }
    }

    pub async fn list(
        &self,
        status: Option<ScheduleStatus>,
        params: &ListParams,
    ) -> Result<PagedResult<ScheduledPost>, ScheduleError> {
        let (items, total) = self
            .repo
            .list(status, params)
            .await
            .context("Failed to list schedule")?;
        Ok(PagedResult::new(items, total, params))
    }

    pub async fn get(&self, id: i64) -> Result<ScheduledPost, ScheduleError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to load scheduled post")?
            .ok_or(ScheduleError::NotFound)
    }

    pub async fn create(
        &self,
        input: CreateScheduleInput,
        created_by: Option<i64>,
    ) -> Result<ScheduledPost, ScheduleError> {
        let now = Utc::now();
        ensure_future(input.scheduled_for, now)?;
        if !self.content.exists(input.content_type, input.content_id).await? {
            return Err(ScheduleError::ValidationError(format!(
                "{} {} does not exist",
                input.content_type, input.content_id
            )));
        }

        let entry = ScheduledPost {
            id: 0,
            content_type: input.content_type,
            content_id: input.content_id,
            scheduled_for: input.scheduled_for,
            status: ScheduleStatus::Pending,
            note: input.note.filter(|n| !n.trim().is_empty()),
            created_by,
            created_at: now,
            updated_at: now,
        };
        let created = self.repo.create(&entry).await?;
        tracing::info!(
            "Scheduled {} {} for {}",
            created.content_type,
            created.content_id,
            created.scheduled_for
        );
        Ok(created)
    }

    /// Reschedule or annotate a pending entry
    pub async fn update(
        &self,
        id: i64,
        input: UpdateScheduleInput,
    ) -> Result<ScheduledPost, ScheduleError> {
        let mut entry = self.pending(id).await?;
        let now = Utc::now();
        if let Some(at) = input.scheduled_for {
            ensure_future(at, now)?;
            entry.scheduled_for = at;
        }
        if input.note.is_some() {
            entry.note = input.note.filter(|n| !n.trim().is_empty());
        }
        entry.updated_at = now;
        Ok(self.repo.update(&entry).await?)
    }

    pub async fn cancel(&self, id: i64) -> Result<ScheduledPost, ScheduleError> {
        self.pending(id).await?;
        self.repo.set_status(id, ScheduleStatus::Cancelled, None).await?;
        self.get(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), ScheduleError> {
        if !self.repo.delete(id).await? {
            return Err(ScheduleError::NotFound);
        }
        Ok(())
    }

    pub async fn pending_count(&self) -> Result<i64, ScheduleError> {
        Ok(self.repo.count(Some(ScheduleStatus::Pending)).await?)
    }

    /// Publish every pending entry due at `now`, then the due social posts.
    ///
    /// One failing entry is marked `failed` with the reason and does not stop
    /// the rest of the pass.
    pub async fn publish_due(&self, now: DateTime<Utc>) -> Result<PublishReport, ScheduleError> {
        let due = self
            .repo
            .list_due(now)
            .await
            .context("Failed to list due schedule entries")?;

        let mut report = PublishReport::default();
        for entry in due {
            let outcome = self
                .content
                .set_status(entry.content_type, entry.content_id, ContentStatus::Published)
                .await;

            let (status, note) = match outcome {
                Ok(()) => {
                    report.published += 1;
                    (ScheduleStatus::Published, None)
                }
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(
                        "Scheduled {} {} could not be published: {}",
                        entry.content_type,
                        entry.content_id,
                        e
                    );
                    (ScheduleStatus::Failed, Some(e.to_string()))
                }
            };

            if let Err(e) = self.repo.set_status(entry.id, status, note.as_deref()).await {
                tracing::warn!("Could not update schedule entry {}: {}", entry.id, e);
            }
        }

        report.social_published = match self.social.publish_due(now).await {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!("Publishing due social posts failed: {}", e);
                0
            }
        };

        if report.published + report.failed + report.social_published > 0 {
            tracing::info!(
                "Scheduled publishing: {} published, {} failed, {} social posts",
                report.published,
                report.failed,
                report.social_published
            );
        }
        Ok(report)
    }

    async fn pending(&self, id: i64) -> Result<ScheduledPost, ScheduleError> {
        let entry = self.get(id).await?;
        if entry.status != ScheduleStatus::Pending {
            return Err(ScheduleError::ValidationError(format!(
                "Only pending entries can be changed (this one is {})",
                entry.status
            )));
        }
        Ok(entry)
    }
}

fn ensure_future(at: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), ScheduleError> {
    if at <= now {
        return Err(ScheduleError::ValidationError(
            "Scheduled time must be in the future".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::create_cache;
    use crate::config::CacheConfig;
    use crate::db::repositories::{
        SqlxNewsRepository, SqlxReportRepository, SqlxScheduleRepository, SqlxSocialRepository,
        SqlxSpeechRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::models::{ContentKind, CreateNewsInput, CreateReportInput};
    use crate::services::markdown::MarkdownRenderer;
    use chrono::Duration;

    async fn setup() -> (ScheduleService, Arc<ContentService>) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let content = Arc::new(ContentService::new(
            SqlxNewsRepository::boxed(pool.clone()),
            SqlxSpeechRepository::boxed(pool.clone()),
            SqlxReportRepository::boxed(pool.clone()),
            create_cache(&CacheConfig::default()),
            MarkdownRenderer::new(),
        ));
        let social = Arc::new(SocialService::new(SqlxSocialRepository::boxed(pool.clone())));
        let service = ScheduleService::new(
            SqlxScheduleRepository::boxed(pool),
            content.clone(),
            social,
        );
        (service, content)
    }

    fn schedule(kind: ContentKind, id: i64, at: DateTime<Utc>) -> CreateScheduleInput {
        CreateScheduleInput {
            content_type: kind,
            content_id: id,
            scheduled_for: at,
            note: None,
        }
    }

    #[tokio::test]
    async fn test_create_validates_target_and_time() {
        let (service, content) = setup().await;
        let article = content
            .create_news(
                CreateNewsInput {
                    title: "Launch".to_string(),
                    ..Default::default()
                },
                None,
            )
            .await
            .unwrap();

        let past = Utc::now() - Duration::minutes(1);
        assert!(service
            .create(schedule(ContentKind::News, article.id, past), None)
            .await
            .is_err());

        let future = Utc::now() + Duration::hours(1);
        assert!(matches!(
            service.create(schedule(ContentKind::Speech, article.id, future), None).await,
            Err(ScheduleError::ValidationError(_))
        ));

        let entry = service
            .create(schedule(ContentKind::News, article.id, future), None)
            .await
            .unwrap();
        assert_eq!(entry.status, ScheduleStatus::Pending);
        assert_eq!(service.pending_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_cancel_only_pending() {
        let (service, content) = setup().await;
        let article = content
            .create_news(
                CreateNewsInput {
                    title: "Launch".to_string(),
                    ..Default::default()
                },
                None,
            )
            .await
            .unwrap();
        let entry = service
            .create(
                schedule(ContentKind::News, article.id, Utc::now() + Duration::hours(1)),
                None,
            )
            .await
            .unwrap();

        let cancelled = service.cancel(entry.id).await.unwrap();
        assert_eq!(cancelled.status, ScheduleStatus::Cancelled);
        assert!(service.cancel(entry.id).await.is_err());
        assert!(service
            .update(
                entry.id,
                UpdateScheduleInput {
                    note: Some("x".to_string()),
                    ..Default::default()
                }
            )
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_publish_due_publishes_and_records_failures() {
        let (service, content) = setup().await;
        let article = content
            .create_news(
                CreateNewsInput {
                    title: "Launch".to_string(),
                    ..Default::default()
                },
                None,
            )
            .await
            .unwrap();
        let archived = content
            .create_report(
                CreateReportInput {
                    title: "Old report".to_string(),
                    status: Some(ContentStatus::Archived),
                    ..Default::default()
                },
                None,
            )
            .await
            .unwrap();

        let at = Utc::now() + Duration::milliseconds(20);
        let ok = service
            .create(schedule(ContentKind::News, article.id, at), None)
            .await
            .unwrap();
        let bad = service
            .create(schedule(ContentKind::Report, archived.id, at), None)
            .await
            .unwrap();

        let report = service
            .publish_due(Utc::now() + Duration::minutes(1))
            .await
            .unwrap();
        assert_eq!(report.published, 1);
        assert_eq!(report.failed, 1);

        assert_eq!(service.get(ok.id).await.unwrap().status, ScheduleStatus::Published);
        let failed = service.get(bad.id).await.unwrap();
        assert_eq!(failed.status, ScheduleStatus::Failed);
        assert!(failed.note.is_some());

        let published = content.get_news(article.id).await.unwrap();
        assert_eq!(published.status, ContentStatus::Published);
        assert!(published.published_at.is_some());

        let again = service
            .publish_due(Utc::now() + Duration::minutes(1))
            .await
            .unwrap();
        assert_eq!(again.published + again.failed, 0);
    }
}
