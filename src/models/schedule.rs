//! Scheduled publication of content items

use super::ContentKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A request to publish a news article, speech or report at a given time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledPost {
    pub id: i64,
    pub content_type: ContentKind,
    pub content_id: i64,
    pub scheduled_for: DateTime<Utc>,
    pub status: ScheduleStatus,
    /// Free-form note; failure reason when status is `failed`
    pub note: Option<String>,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleStatus {
    Pending,
    Published,
    Cancelled,
    Failed,
}

impl Default for ScheduleStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl ScheduleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleStatus::Pending => "pending",
            ScheduleStatus::Published => "published",
            ScheduleStatus::Cancelled => "cancelled",
            ScheduleStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScheduleStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(ScheduleStatus::Pending),
            "published" => Ok(ScheduleStatus::Published),
            "cancelled" | "canceled" => Ok(ScheduleStatus::Cancelled),
            "failed" => Ok(ScheduleStatus::Failed),
            _ => Err(anyhow::anyhow!("Invalid schedule status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateScheduleInput {
    pub content_type: ContentKind,
    pub content_id: i64,
    pub scheduled_for: DateTime<Utc>,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateScheduleInput {
    pub scheduled_for: Option<DateTime<Utc>>,
    pub note: Option<String>,
}

/// Outcome of one `publish_due` pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct PublishReport {
    pub published: usize,
    pub failed: usize,
    pub social_published: usize,
}
