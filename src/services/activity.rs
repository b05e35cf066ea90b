//! Activity log
//!
//! Recording never fails the caller: a failed insert is logged and dropped.

use crate::db::repositories::ActivityRepository;
use crate::models::{ListParams, NewActivity, PagedResult, UserActivity};
use anyhow::{Context, Result};
use std::sync::Arc;

pub struct ActivityService {
    repo: Arc<dyn ActivityRepository>,
}

impl ActivityService {
    pub fn new(repo: Arc<dyn ActivityRepository>) -> Self {
        Self { repo }
    }

    pub async fn record(&self, activity: NewActivity) {
        let action = activity.action.clone();
        if let Err(e) = self.repo.create(&activity).await {
            tracing::warn!("Failed to record activity '{}': {:#}", action, e);
        }
    }

    pub async fn list(
        &self,
        user_id: Option<i64>,
        params: &ListParams,
    ) -> Result<PagedResult<UserActivity>> {
        let (items, total) = self
            .repo
            .list(user_id, params)
            .await
            .context("Failed to list activity")?;
        Ok(PagedResult::new(items, total, params))
    }

    pub async fn recent(&self, limit: u32) -> Result<Vec<UserActivity>> {
        self.repo.recent(limit).await.context("Failed to load recent activity")
    }
}
