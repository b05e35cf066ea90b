//! Speech model

use super::ContentStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A delivered speech, with transcript and optional recording
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Speech {
    pub id: i64,
    pub slug: String,
    pub title: String,
    /// Markdown transcript
    pub content: String,
    pub content_html: String,
    /// Where the speech was given
    pub venue: Option<String>,
    /// When the speech was given
    pub delivered_at: Option<DateTime<Utc>>,
    pub video_url: Option<String>,
    pub status: ContentStatus,
    pub author_id: Option<i64>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateSpeechInput {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub venue: Option<String>,
    #[serde(default)]
    pub delivered_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub status: Option<ContentStatus>,
}

/// Partial update for a speech. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSpeechInput {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub content: Option<String>,
    pub venue: Option<String>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub video_url: Option<String>,
    pub status: Option<ContentStatus>,
}
