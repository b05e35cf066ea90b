//! Shared content types
//!
//! This module provides:
//! - `ContentStatus`, the draft/published/archived lifecycle shared by news
//!   articles, speeches and reports
//! - `ContentKind`, naming the three publishable content tables
//! - Pagination types for list queries

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Publication status of a news article, speech or report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentStatus {
    /// Draft - not visible to public
    Draft,
    /// Published - visible to public
    Published,
    /// Archived - hidden but not deleted
    Archived,
}

impl Default for ContentStatus {
    fn default() -> Self {
        Self::Draft
    }
}

impl ContentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentStatus::Draft => "draft",
            ContentStatus::Published => "published",
            ContentStatus::Archived => "archived",
        }
    }

    /// Whether moving from `self` to `next` is allowed.
    ///
    /// Same-status updates are always allowed. An archived item has to go
    /// back to draft before it can be published again.
    pub fn can_transition_to(&self, next: ContentStatus) -> bool {
        use ContentStatus::*;
        match (self, next) {
            (a, b) if *a == b => true,
            (Draft, Published) | (Draft, Archived) => true,
            (Published, Archived) | (Published, Draft) => true,
            (Archived, Draft) => true,
            (Archived, Published) => false,
            _ => false,
        }
    }
}

impl fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(ContentStatus::Draft),
            "published" => Ok(ContentStatus::Published),
            "archived" => Ok(ContentStatus::Archived),
            _ => Err(anyhow::anyhow!("Invalid content status: {}", s)),
        }
    }
}

/// The publishable content tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    News,
    Speech,
    Report,
}

impl ContentKind {
    pub const ALL: [ContentKind; 3] = [ContentKind::News, ContentKind::Speech, ContentKind::Report];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::News => "news",
            ContentKind::Speech => "speech",
            ContentKind::Report => "report",
        }
    }

    /// Database table holding this kind of content
    pub fn table(&self) -> &'static str {
        match self {
            ContentKind::News => "news_articles",
            ContentKind::Speech => "speeches",
            ContentKind::Report => "reports",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "news" | "article" | "articles" => Ok(ContentKind::News),
            "speech" | "speeches" => Ok(ContentKind::Speech),
            "report" | "reports" => Ok(ContentKind::Report),
            _ => Err(anyhow::anyhow!("Invalid content type: {}", s)),
        }
    }
}

/// Pagination parameters for list queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListParams {
    /// Page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub per_page: u32,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 10,
        }
    }
}

impl ListParams {
    /// Create new pagination parameters, clamped to sane bounds
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, 100),
        }
    }

    /// Calculate the offset for database queries
    pub fn offset(&self) -> i64 {
        (self.page.saturating_sub(1) as i64) * (self.per_page as i64)
    }

    /// Get the limit for database queries
    pub fn limit(&self) -> i64 {
        self.per_page as i64
    }
}

/// Paginated result container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedResult<T> {
    /// Items in the current page
    pub items: Vec<T>,
    /// Total number of items across all pages
    pub total: i64,
    /// Current page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub per_page: u32,
    /// Total number of pages
    pub total_pages: u32,
}

impl<T> PagedResult<T> {
    /// Create a new paginated result
    pub fn new(items: Vec<T>, total: i64, params: &ListParams) -> Self {
        Self {
            items,
            total,
            page: params.page,
            per_page: params.per_page,
            total_pages: total_pages(total, params.per_page),
        }
    }

    /// An empty first page
    pub fn empty(params: &ListParams) -> Self {
        Self::new(Vec::new(), 0, params)
    }

    /// Check if there is a next page
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// Check if the result is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Convert the items while keeping the page metadata
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PagedResult<U> {
        PagedResult {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
            total_pages: self.total_pages,
        }
    }
}

fn total_pages(total: i64, per_page: u32) -> u32 {
    if per_page == 0 || total <= 0 {
        return 0;
    }
    ((total as u64 + per_page as u64 - 1) / per_page as u64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions() {
        use ContentStatus::*;
        assert!(Draft.can_transition_to(Published));
        assert!(Published.can_transition_to(Archived));
        assert!(Published.can_transition_to(Draft));
        assert!(Archived.can_transition_to(Draft));
        assert!(!Archived.can_transition_to(Published));
        assert!(Archived.can_transition_to(Archived));
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("Published".parse::<ContentStatus>().unwrap(), ContentStatus::Published);
        assert!("deleted".parse::<ContentStatus>().is_err());
    }

    #[test]
    fn test_kind_parse_aliases() {
        assert_eq!("speeches".parse::<ContentKind>().unwrap(), ContentKind::Speech);
        assert_eq!("news".parse::<ContentKind>().unwrap(), ContentKind::News);
        assert_eq!(ContentKind::Report.table(), "reports");
        assert!("video".parse::<ContentKind>().is_err());
    }

    #[test]
    fn test_list_params_clamping() {
        let params = ListParams::new(0, 1000);
        assert_eq!(params.page, 1);
        assert_eq!(params.per_page, 100);
        assert_eq!(params.offset(), 0);

        let params = ListParams::new(3, 20);
        assert_eq!(params.offset(), 40);
        assert_eq!(params.limit(), 20);
    }

    #[test]
    fn test_paged_result_pages() {
        let params = ListParams::new(1, 10);
        let page: PagedResult<i32> = PagedResult::new(vec![1, 2, 3], 21, &params);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_next());

        let empty: PagedResult<i32> = PagedResult::empty(&params);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next());
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn property_pages_cover_total(total in 0i64..10_000, per_page in 1u32..=100) {
            let params = ListParams::new(1, per_page);
            let page: PagedResult<()> = PagedResult::new(Vec::new(), total, &params);
            let capacity = page.total_pages as i64 * per_page as i64;
            prop_assert!(capacity >= total);
            prop_assert!(capacity - total < per_page as i64);
        }

        #[test]
        fn property_offset_is_monotonic(page in 1u32..1000, per_page in 1u32..=100) {
            let a = ListParams::new(page, per_page);
            let b = ListParams::new(page + 1, per_page);
            prop_assert_eq!(b.offset() - a.offset(), per_page as i64);
        }
    }
}
