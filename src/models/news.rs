//! News article model

use super::ContentStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// News article entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsArticle {
    /// Unique identifier
    pub id: i64,
    /// URL-friendly slug
    pub slug: String,
    /// Article title
    pub title: String,
    /// Short lead shown in listings
    pub excerpt: Option<String>,
    /// Markdown content
    pub content: String,
    /// Rendered, sanitized HTML content
    pub content_html: String,
    /// Free-form category label
    pub category: Option<String>,
    /// Cover image URL
    pub featured_image: Option<String>,
    /// Publication status
    pub status: ContentStatus,
    /// Author user ID
    pub author_id: Option<i64>,
    /// Publication timestamp
    pub published_at: Option<DateTime<Utc>>,
    /// View count
    #[serde(default)]
    pub view_count: i64,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a news article
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateNewsInput {
    pub title: String,
    /// Generated from the title when absent
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub featured_image: Option<String>,
    #[serde(default)]
    pub status: Option<ContentStatus>,
}

/// Partial update for a news article. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateNewsInput {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub featured_image: Option<String>,
    pub status: Option<ContentStatus>,
}
