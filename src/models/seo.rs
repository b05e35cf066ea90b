//! SEO metadata

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Search-engine metadata for one public path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeoPage {
    pub id: i64,
    /// Public path, always starting with `/`
    pub path: String,
    pub title: Option<String>,
    pub meta_description: Option<String>,
    /// Comma-separated keywords
    pub keywords: Option<String>,
    pub og_image: Option<String>,
    pub canonical_url: Option<String>,
    pub no_index: bool,
    /// Completeness score, 0 to 100
    pub score: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateSeoPageInput {
    pub path: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub meta_description: Option<String>,
    #[serde(default)]
    pub keywords: Option<String>,
    #[serde(default)]
    pub og_image: Option<String>,
    #[serde(default)]
    pub canonical_url: Option<String>,
    #[serde(default)]
    pub no_index: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSeoPageInput {
    pub path: Option<String>,
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub keywords: Option<String>,
    pub og_image: Option<String>,
    pub canonical_url: Option<String>,
    pub no_index: Option<bool>,
}

/// A keyword whose ranking is being tracked
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeoKeyword {
    pub id: i64,
    pub keyword: String,
    pub target_path: Option<String>,
    pub search_volume: Option<i64>,
    pub current_position: Option<i32>,
    pub tracked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateSeoKeywordInput {
    pub keyword: String,
    #[serde(default)]
    pub target_path: Option<String>,
    #[serde(default)]
    pub search_volume: Option<i64>,
    #[serde(default)]
    pub current_position: Option<i32>,
    #[serde(default)]
    pub tracked: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSeoKeywordInput {
    pub keyword: Option<String>,
    pub target_path: Option<String>,
    pub search_volume: Option<i64>,
    pub current_position: Option<i32>,
    pub tracked: Option<bool>,
}

/// One row of the SEO audit
#[derive(Debug, Clone, Serialize)]
pub struct SeoAuditEntry {
    pub id: i64,
    pub path: String,
    pub score: i32,
    pub issues: Vec<String>,
}
