//! Social accounts and posts
//!
//! Posts are prepared here and marked published; no request is made to the
//! social networks themselves.

use crate::db::repositories::SocialRepository;
use crate::models::{
    CreateSocialAccountInput, CreateSocialPostInput, ListParams, PagedResult, SocialAccount,
    SocialPost, SocialPostStatus, UpdateSocialAccountInput, UpdateSocialPostInput,
};
use anyhow::Context;
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub const MAX_POST_LENGTH: usize = 5000;

#[derive(Debug, thiserror::Error)]
pub enum SocialError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// `scheduled` when the post has a time in the future, `draft` otherwise
pub fn initial_status(scheduled_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> SocialPostStatus {
    match scheduled_at {
        Some(at) if at > now => SocialPostStatus::Scheduled,
        _ => SocialPostStatus::Draft,
    }
}

pub struct SocialService {
    repo: Arc<dyn SocialRepository>,
}

impl SocialService {
    pub fn new(repo: Arc<dyn SocialRepository>) -> Self {
        Self { repo }
    }

    // ========================================================================
    // Accounts
    // ========================================================================

    pub async fn list_accounts(&self) -> Result<Vec<SocialAccount>, SocialError> {
        Ok(self.repo.list_accounts().await.context("Failed to list social accounts")?)
    }

    pub async fn get_account(&self, id: i64) -> Result<SocialAccount, SocialError> {
        self.repo
            .get_account(id)
            .await
            .context("Failed to load social account")?
            .ok_or(SocialError::NotFound("Social account"))
    }

    pub async fn create_account(
        &self,
        input: CreateSocialAccountInput,
    ) -> Result<SocialAccount, SocialError> {
        let now = Utc::now();
        let account = SocialAccount {
            id: 0,
            platform: required("Platform", &input.platform)?.to_lowercase(),
            handle: required("Handle", &input.handle)?,
            profile_url: optional(input.profile_url),
            is_active: input.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };
        Ok(self.repo.create_account(&account).await?)
    }

    pub async fn update_account(
        &self,
        id: i64,
        input: UpdateSocialAccountInput,
    ) -> Result<SocialAccount, SocialError> {
        let mut account = self.get_account(id).await?;
        if let Some(platform) = input.platform {
            account.platform = required("Platform", &platform)?.to_lowercase();
        }
        if let Some(handle) = input.handle {
            account.handle = required("Handle", &handle)?;
        }
        if input.profile_url.is_some() {
            account.profile_url = optional(input.profile_url);
        }
        if let Some(active) = input.is_active {
            account.is_active = active;
        }
        account.updated_at = Utc::now();
        Ok(self.repo.update_account(&account).await?)
    }

    /// Deletes the account together with its posts
    pub async fn delete_account(&self, id: i64) -> Result<(), SocialError> {
        if !self.repo.delete_account(id).await? {
            return Err(SocialError::NotFound("Social account"));
        }
        Ok(())
    }

    // ========================================================================
    // Posts
    // ========================================================================

    pub async fn list_posts(
        &self,
        status: Option<SocialPostStatus>,
        params: &ListParams,
    ) -> Result<PagedResult<SocialPost>, SocialError> {
        let (items, total) = self
            .repo
            .list_posts(status, params)
            .await
            .context("Failed to list social posts")?;
        Ok(PagedResult::new(items, total, params))
    }

    pub async fn get_post(&self, id: i64) -> Result<SocialPost, SocialError> {
        self.repo
            .get_post(id)
            .await
            .context("Failed to load social post")?
            .ok_or(SocialError::NotFound("Social post"))
    }

    pub async fn create_post(
        &self,
        input: CreateSocialPostInput,
        created_by: Option<i64>,
    ) -> Result<SocialPost, SocialError> {
        self.get_account(input.account_id).await?;
        let content = validate_post_content(&input.content)?;
        let now = Utc::now();

        let post = SocialPost {
            id: 0,
            account_id: input.account_id,
            content,
            media_url: optional(input.media_url),
            status: initial_status(input.scheduled_at, now),
            scheduled_at: input.scheduled_at,
            published_at: None,
            created_by,
            created_at: now,
            updated_at: now,
        };
        Ok(self.repo.create_post(&post).await?)
    }

    pub async fn update_post(
        &self,
        id: i64,
        input: UpdateSocialPostInput,
    ) -> Result<SocialPost, SocialError> {
        let mut post = self.get_post(id).await?;
        if post.status == SocialPostStatus::Published {
            return Err(SocialError::ValidationError(
                "Published posts cannot be edited".to_string(),
            ));
        }

        if let Some(account_id) = input.account_id {
            self.get_account(account_id).await?;
            post.account_id = account_id;
        }
        if let Some(content) = input.content {
            post.content = validate_post_content(&content)?;
        }
        if input.media_url.is_some() {
            post.media_url = optional(input.media_url);
        }
        if input.scheduled_at.is_some() {
            post.scheduled_at = input.scheduled_at;
        }
        let now = Utc::now();
        post.status = initial_status(post.scheduled_at, now);
        post.updated_at = now;

        Ok(self.repo.update_post(&post).await?)
    }

    pub async fn delete_post(&self, id: i64) -> Result<(), SocialError> {
        if !self.repo.delete_post(id).await? {
            return Err(SocialError::NotFound("Social post"));
        }
        Ok(())
    }

    /// Record a post as published now
    pub async fn publish_post(&self, id: i64) -> Result<SocialPost, SocialError> {
        let post = self.get_post(id).await?;
        if post.status == SocialPostStatus::Published {
            return Ok(post);
        }
        self.repo
            .set_post_status(id, SocialPostStatus::Published, Some(Utc::now()))
            .await?;
        tracing::info!("Social post {} published", id);
        self.get_post(id).await
    }

    /// Publish every scheduled post due at `now`; returns how many were published
    pub async fn publish_due(&self, now: DateTime<Utc>) -> Result<usize, SocialError> {
        let due = self
            .repo
            .list_due_posts(now)
            .await
            .context("Failed to list due social posts")?;

        let mut published = 0;
        for post in due {
            let account_active = match self.repo.get_account(post.account_id).await {
                Ok(Some(account)) => account.is_active,
                Ok(None) => false,
                Err(e) => {
                    tracing::warn!("Could not load account for social post {}: {}", post.id, e);
                    continue;
                }
            };

            let (status, at) = if account_active {
                (SocialPostStatus::Published, Some(now))
            } else {
                (SocialPostStatus::Failed, None)
            };
            match self.repo.set_post_status(post.id, status, at).await {
                Ok(_) if account_active => published += 1,
                Ok(_) => tracing::warn!("Social post {} failed: account inactive", post.id),
                Err(e) => tracing::warn!("Could not update social post {}: {}", post.id, e),
            }
        }
        Ok(published)
    }
}

fn required(field: &str, value: &str) -> Result<String, SocialError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(SocialError::ValidationError(format!("{} is required", field)));
    }
    Ok(value.to_string())
}

fn optional(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let v = v.trim();
        (!v.is_empty()).then(|| v.to_string())
    })
}

fn validate_post_content(content: &str) -> Result<String, SocialError> {
    let content = required("Content", content)?;
    if content.chars().count() > MAX_POST_LENGTH {
        return Err(SocialError::ValidationError(format!(
            "Content must be at most {} characters",
            MAX_POST_LENGTH
        )));
    }
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxSocialRepository;
    use crate::db::{create_test_pool, migrations};
    use chrono::Duration;

    async fn setup() -> (SocialService, SocialAccount) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let service = SocialService::new(SqlxSocialRepository::boxed(pool));
        let account = service
            .create_account(CreateSocialAccountInput {
                platform: "Twitter".to_string(),
                handle: "@office".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        (service, account)
    }

    fn post(account_id: i64, scheduled_at: Option<DateTime<Utc>>) -> CreateSocialPostInput {
        CreateSocialPostInput {
            account_id,
            content: "Join us at the town hall".to_string(),
            media_url: None,
            scheduled_at,
        }
    }

    #[test]
    fn test_initial_status() {
        let now = Utc::now();
        assert_eq!(initial_status(None, now), SocialPostStatus::Draft);
        assert_eq!(
            initial_status(Some(now + Duration::hours(1)), now),
            SocialPostStatus::Scheduled
        );
        assert_eq!(
            initial_status(Some(now - Duration::hours(1)), now),
            SocialPostStatus::Draft
        );
    }

    #[tokio::test]
    async fn test_account_normalized() {
        let (_service, account) = setup().await;
        assert_eq!(account.platform, "twitter");
        assert!(account.is_active);
    }

    #[tokio::test]
    async fn test_post_for_unknown_account() {
        let (service, _) = setup().await;
        let result = service.create_post(post(999, None), None).await;
        assert!(matches!(result, Err(SocialError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_publish_post_and_lock_edits() {
        let (service, account) = setup().await;
        let created = service.create_post(post(account.id, None), None).await.unwrap();
        assert_eq!(created.status, SocialPostStatus::Draft);

        let published = service.publish_post(created.id).await.unwrap();
        assert_eq!(published.status, SocialPostStatus::Published);
        assert!(published.published_at.is_some());

        let result = service
            .update_post(
                created.id,
                UpdateSocialPostInput {
                    content: Some("edited".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(SocialError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_publish_due() {
        let (service, account) = setup().await;
        let soon = Utc::now() + Duration::milliseconds(50);
        let created = service
            .create_post(post(account.id, Some(soon)), None)
            .await
            .unwrap();
        assert_eq!(created.status, SocialPostStatus::Scheduled);

        assert_eq!(service.publish_due(Utc::now() - Duration::hours(1)).await.unwrap(), 0);
        let later = Utc::now() + Duration::minutes(1);
        assert_eq!(service.publish_due(later).await.unwrap(), 1);
        assert_eq!(
            service.get_post(created.id).await.unwrap().status,
            SocialPostStatus::Published
        );
    }
}
