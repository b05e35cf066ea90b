//! Social media accounts and posts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A social network account managed from the back-office
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialAccount {
    pub id: i64,
    /// Platform name, e.g. "twitter", "facebook"
    pub platform: String,
    pub handle: String,
    pub profile_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateSocialAccountInput {
    pub platform: String,
    pub handle: String,
    #[serde(default)]
    pub profile_url: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSocialAccountInput {
    pub platform: Option<String>,
    pub handle: Option<String>,
    pub profile_url: Option<String>,
    pub is_active: Option<bool>,
}

/// A post prepared for a social account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialPost {
    pub id: i64,
    pub account_id: i64,
    pub content: String,
    pub media_url: Option<String>,
    pub status: SocialPostStatus,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SocialPostStatus {
    Draft,
    Scheduled,
    Published,
    Failed,
}

impl Default for SocialPostStatus {
    fn default() -> Self {
        Self::Draft
    }
}

impl SocialPostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SocialPostStatus::Draft => "draft",
            SocialPostStatus::Scheduled => "scheduled",
            SocialPostStatus::Published => "published",
            SocialPostStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for SocialPostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SocialPostStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(SocialPostStatus::Draft),
            "scheduled" => Ok(SocialPostStatus::Scheduled),
            "published" => Ok(SocialPostStatus::Published),
            "failed" => Ok(SocialPostStatus::Failed),
            _ => Err(anyhow::anyhow!("Invalid social post status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateSocialPostInput {
    pub account_id: i64,
    pub content: String,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSocialPostInput {
    pub account_id: Option<i64>,
    pub content: Option<String>,
    pub media_url: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
}
