//! Dashboard summary

use crate::models::{ContentKind, ContentStatus, UserActivity};
use crate::services::activity::ActivityService;
use crate::services::contact::ContactService;
use crate::services::content::ContentService;
use crate::services::media::MediaService;
use crate::services::schedule::ScheduleService;
use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;

const RECENT_ACTIVITY: u32 = 10;

#[derive(Debug, Clone, Default, Serialize)]
pub struct ContentCounts {
    pub total: i64,
    pub published: i64,
    pub draft: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub news: ContentCounts,
    pub speeches: ContentCounts,
    pub reports: ContentCounts,
    pub media_files: i64,
    pub unread_messages: i64,
    pub pending_scheduled: i64,
    pub recent_activity: Vec<UserActivity>,
}

pub struct DashboardService {
    content: Arc<ContentService>,
    media: Arc<MediaService>,
    contact: Arc<ContactService>,
    schedule: Arc<ScheduleService>,
    activity: Arc<ActivityService>,
}

impl DashboardService {
    pub fn new(
        content: Arc<ContentService>,
        media: Arc<MediaService>,
        contact: Arc<ContactService>,
        schedule: Arc<ScheduleService>,
        activity: Arc<ActivityService>,
    ) -> Self {
        Self {
            content,
            media,
            contact,
            schedule,
            activity,
        }
    }

    async fn counts(&self, kind: ContentKind) -> Result<ContentCounts> {
        Ok(ContentCounts {
            total: self.content.count(kind, None).await?,
            published: self.content.count(kind, Some(ContentStatus::Published)).await?,
            draft: self.content.count(kind, Some(ContentStatus::Draft)).await?,
        })
    }

    pub async fn summary(&self) -> Result<DashboardSummary> {
        Ok(DashboardSummary {
            news: self.counts(ContentKind::News).await?,
            speeches: self.counts(ContentKind::Speech).await?,
            reports: self.counts(ContentKind::Report).await?,
            media_files: self.media.count().await?,
            unread_messages: self.contact.unread_count().await?,
            pending_scheduled: self.schedule.pending_count().await?,
            recent_activity: self.activity.recent(RECENT_ACTIVITY).await?,
        })
    }
}
