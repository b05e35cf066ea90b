//! Report model

use super::ContentStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A published report (annual report, committee report, ...) usually backed
/// by a downloadable document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: i64,
    pub slug: String,
    pub title: String,
    /// Plain-text summary
    pub summary: Option<String>,
    /// Link to the document, usually a media library URL
    pub file_url: Option<String>,
    pub category: Option<String>,
    pub status: ContentStatus,
    pub author_id: Option<i64>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateReportInput {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub status: Option<ContentStatus>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateReportInput {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub summary: Option<String>,
    pub file_url: Option<String>,
    pub category: Option<String>,
    pub status: Option<ContentStatus>,
}
