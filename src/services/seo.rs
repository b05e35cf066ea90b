//! SEO metadata service
//!
//! Page metadata is scored on every save so the admin audit can rank pages
//! by how much is missing.

use crate::cache::{self, SharedCache};
use crate::db::is_unique_violation;
use crate::db::repositories::SeoRepository;
use crate::models::{
    CreateSeoKeywordInput, CreateSeoPageInput, ListParams, PagedResult, SeoAuditEntry, SeoKeyword,
    SeoPage, UpdateSeoKeywordInput, UpdateSeoPageInput,
};
use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;

const TITLE_IDEAL: std::ops::RangeInclusive<usize> = 30..=60;
const DESCRIPTION_IDEAL: std::ops::RangeInclusive<usize> = 120..=160;

#[derive(Debug, thiserror::Error)]
pub enum SeoError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Already exists: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

fn filled(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Completeness score of a page's metadata, 0 to 100
pub fn seo_score(page: &SeoPage) -> i32 {
    let mut score = 0;
    if let Some(title) = filled(&page.title) {
        score += 20;
        if TITLE_IDEAL.contains(&title.chars().count()) {
            score += 10;
        }
    }
    if let Some(description) = filled(&page.meta_description) {
        score += 20;
        if DESCRIPTION_IDEAL.contains(&description.chars().count()) {
            score += 10;
        }
    }
    if filled(&page.keywords).is_some() {
        score += 15;
    }
    if filled(&page.og_image).is_some() {
        score += 10;
    }
    if filled(&page.canonical_url).is_some() {
        score += 10;
    }
    if !page.no_index {
        score += 5;
    }
    score
}

/// Human-readable list of what keeps a page from a full score
pub fn audit_issues(page: &SeoPage) -> Vec<String> {
    let mut issues = Vec::new();
    match filled(&page.title) {
        None => issues.push("Missing title".to_string()),
        Some(t) if !TITLE_IDEAL.contains(&t.chars().count()) => issues.push(format!(
            "Title is {} characters (ideal {}-{})",
            t.chars().count(),
            TITLE_IDEAL.start(),
            TITLE_IDEAL.end()
        )),
        Some(_) => {}
    }
    match filled(&page.meta_description) {
        None => issues.push("Missing meta description".to_string()),
        Some(d) if !DESCRIPTION_IDEAL.contains(&d.chars().count()) => issues.push(format!(
            "Meta description is {} characters (ideal {}-{})",
            d.chars().count(),
            DESCRIPTION_IDEAL.start(),
            DESCRIPTION_IDEAL.end()
        )),
        Some(_) => {}
    }
    if filled(&page.keywords).is_none() {
        issues.push("No keywords".to_string());
    }
    if filled(&page.og_image).is_none() {
        issues.push("No Open Graph image".to_string());
    }
    if filled(&page.canonical_url).is_none() {
        issues.push("No canonical URL".to_string());
    }
    if page.no_index {
        issues.push("Page is excluded from indexing".to_string());
    }
    issues
}

fn validate_path(path: &str) -> Result<String, SeoError> {
    let path = path.trim();
    if !path.starts_with('/') {
        return Err(SeoError::ValidationError("Path must start with '/'".to_string()));
    }
    if path.chars().any(char::is_whitespace) || path.len() > 255 {
        return Err(SeoError::ValidationError("Path is not valid".to_string()));
    }
    Ok(path.to_string())
}

fn optional(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let v = v.trim();
        (!v.is_empty()).then(|| v.to_string())
    })
}

/// A write rejected by a unique index is a conflict on `value`
fn unique_write_error(err: anyhow::Error, value: &str) -> SeoError {
    if is_unique_violation(&err) {
        SeoError::Conflict(value.to_string())
    } else {
        SeoError::InternalError(err)
    }
}

pub struct SeoService {
    repo: Arc<dyn SeoRepository>,
    cache: SharedCache,
}

impl SeoService {
    pub fn new(repo: Arc<dyn SeoRepository>, cache: SharedCache) -> Self {
        Self { repo, cache }
    }

    // ========================================================================
    // Pages
    // ========================================================================

    pub async fn list_pages(&self, params: &ListParams) -> Result<PagedResult<SeoPage>, SeoError> {
        let (items, total) = self.repo.list_pages(params).await.context("Failed to list SEO pages")?;
        Ok(PagedResult::new(items, total, params))
    }

    pub async fn get_page(&self, id: i64) -> Result<SeoPage, SeoError> {
        self.repo
            .get_page(id)
            .await
            .context("Failed to load SEO page")?
            .ok_or(SeoError::NotFound("SEO page"))
    }

    /// Metadata for a public path, cached
    pub async fn page_for_path(&self, path: &str) -> Result<SeoPage, SeoError> {
        let key = cache::item_key(cache::SEO_SCOPE, path);
        if let Ok(Some(cached)) = self.cache.get(&key).await {
            return Ok(cached);
        }

        let page = self
            .repo
            .get_page_by_path(path)
            .await
            .context("Failed to load SEO page")?
            .ok_or(SeoError::NotFound("SEO page"))?;
        if let Err(e) = self.cache.set(&key, &page).await {
            tracing::warn!("Failed to cache SEO page: {}", e);
        }
        Ok(page)
    }

    pub async fn create_page(&self, input: CreateSeoPageInput) -> Result<SeoPage, SeoError> {
        let path = validate_path(&input.path)?;
        if self.repo.path_exists(&path, None).await? {
            return Err(SeoError::Conflict(path));
        }

        let now = Utc::now();
        let mut page = SeoPage {
            id: 0,
            path,
            title: optional(input.title),
            meta_description: optional(input.meta_description),
            keywords: optional(input.keywords),
            og_image: optional(input.og_image),
            canonical_url: optional(input.canonical_url),
            no_index: input.no_index,
            score: 0,
            created_at: now,
            updated_at: now,
        };
        page.score = seo_score(&page);

        let created = self
            .repo
            .create_page(&page)
            .await
            .map_err(|e| unique_write_error(e, &page.path))?;
        cache::invalidate(&self.cache, cache::SEO_SCOPE).await;
        Ok(created)
    }

    pub async fn update_page(&self, id: i64, input: UpdateSeoPageInput) -> Result<SeoPage, SeoError> {
        let mut page = self.get_page(id).await?;

        if let Some(path) = input.path {
            let path = validate_path(&path)?;
            if path != page.path && self.repo.path_exists(&path, Some(id)).await? {
                return Err(SeoError::Conflict(path));
            }
            page.path = path;
        }
        if input.title.is_some() {
            page.title = optional(input.title);
        }
        if input.meta_description.is_some() {
            page.meta_description = optional(input.meta_description);
        }
        if input.keywords.is_some() {
            page.keywords = optional(input.keywords);
        }
        if input.og_image.is_some() {
            page.og_image = optional(input.og_image);
        }
        if input.canonical_url.is_some() {
            page.canonical_url = optional(input.canonical_url);
        }
        if let Some(no_index) = input.no_index {
            page.no_index = no_index;
        }
        page.score = seo_score(&page);
        page.updated_at = Utc::now();

        let updated = self
            .repo
            .update_page(&page)
            .await
            .map_err(|e| unique_write_error(e, &page.path))?;
        cache::invalidate(&self.cache, cache::SEO_SCOPE).await;
        Ok(updated)
    }

    pub async fn delete_page(&self, id: i64) -> Result<(), SeoError> {
        if !self.repo.delete_page(id).await? {
            return Err(SeoError::NotFound("SEO page"));
        }
        cache::invalidate(&self.cache, cache::SEO_SCOPE).await;
        Ok(())
    }

    /// Every page, weakest first, with what is missing
    pub async fn audit(&self) -> Result<Vec<SeoAuditEntry>, SeoError> {
        let pages = self.repo.all_pages_by_score().await.context("Failed to load SEO pages")?;
        Ok(pages
            .iter()
            .map(|page| SeoAuditEntry {
                id: page.id,
                path: page.path.clone(),
                score: page.score,
                issues: audit_issues(page),
            })
            .collect())
    }

    // ========================================================================
    // Keywords
    // ========================================================================

    pub async fn list_keywords(&self, params: &ListParams) -> Result<PagedResult<SeoKeyword>, SeoError> {
        let (items, total) = self
            .repo
            .list_keywords(params)
            .await
            .context("Failed to list keywords")?;
        Ok(PagedResult::new(items, total, params))
    }

    pub async fn get_keyword(&self, id: i64) -> Result<SeoKeyword, SeoError> {
        self.repo
            .get_keyword(id)
            .await
            .context("Failed to load keyword")?
            .ok_or(SeoError::NotFound("Keyword"))
    }

    pub async fn create_keyword(&self, input: CreateSeoKeywordInput) -> Result<SeoKeyword, SeoError> {
        let keyword = normalize_keyword(&input.keyword)?;
        if self.repo.keyword_exists(&keyword, None).await? {
            return Err(SeoError::Conflict(keyword));
        }
        let target_path = match optional(input.target_path) {
            Some(p) => Some(validate_path(&p)?),
            None => None,
        };

        let now = Utc::now();
        let record = SeoKeyword {
            id: 0,
            keyword,
            target_path,
            search_volume: input.search_volume,
            current_position: input.current_position,
            tracked: input.tracked.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };
        self.repo
            .create_keyword(&record)
            .await
            .map_err(|e| unique_write_error(e, &record.keyword))
    }

    pub async fn update_keyword(
        &self,
        id: i64,
        input: UpdateSeoKeywordInput,
    ) -> Result<SeoKeyword, SeoError> {
        let mut record = self.get_keyword(id).await?;

        if let Some(keyword) = input.keyword {
            let keyword = normalize_keyword(&keyword)?;
            if keyword != record.keyword && self.repo.keyword_exists(&keyword, Some(id)).await? {
                return Err(SeoError::Conflict(keyword));
            }
            record.keyword = keyword;
        }
        if input.target_path.is_some() {
            record.target_path = match optional(input.target_path) {
                Some(p) => Some(validate_path(&p)?),
                None => None,
            };
        }
        if input.search_volume.is_some() {
            record.search_volume = input.search_volume;
        }
        if input.current_position.is_some() {
            record.current_position = input.current_position;
        }
        if let Some(tracked) = input.tracked {
            record.tracked = tracked;
        }
        record.updated_at = Utc::now();
        self.repo
            .update_keyword(&record)
            .await
            .map_err(|e| unique_write_error(e, &record.keyword))
    }

    pub async fn delete_keyword(&self, id: i64) -> Result<(), SeoError> {
        if !self.repo.delete_keyword(id).await? {
            return Err(SeoError::NotFound("Keyword"));
        }
        Ok(())
    }
}

fn normalize_keyword(keyword: &str) -> Result<String, SeoError> {
    let keyword = keyword.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    if keyword.is_empty() {
        return Err(SeoError::ValidationError("Keyword is required".to_string()));
    }
    Ok(keyword)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::create_cache;
    use crate::config::CacheConfig;
    use crate::db::repositories::SqlxSeoRepository;
    use crate::db::{create_test_pool, migrations};

    async fn service() -> SeoService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SeoService::new(
            SqlxSeoRepository::boxed(pool),
            create_cache(&CacheConfig::default()),
        )
    }

    fn bare_page() -> SeoPage {
        let now = Utc::now();
        SeoPage {
            id: 0,
            path: "/".to_string(),
            title: None,
            meta_description: None,
            keywords: None,
            og_image: None,
            canonical_url: None,
            no_index: true,
            score: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_score_components() {
        let mut page = bare_page();
        assert_eq!(seo_score(&page), 0);
        assert_eq!(audit_issues(&page).len(), 6);

        page.no_index = false;
        page.title = Some("Short".to_string());
        assert_eq!(seo_score(&page), 25);

        page.title = Some("x".repeat(45));
        page.meta_description = Some("y".repeat(140));
        page.keywords = Some("budget, roads".to_string());
        page.og_image = Some("/uploads/a.png".to_string());
        page.canonical_url = Some("https://example.org/".to_string());
        assert_eq!(seo_score(&page), 100);
        assert!(audit_issues(&page).is_empty());
    }

    #[test]
    fn test_blank_fields_do_not_count() {
        let mut page = bare_page();
        page.title = Some("   ".to_string());
        assert_eq!(seo_score(&page), 0);
    }

    #[test]
    fn test_validate_path() {
        assert_eq!(validate_path(" /news ").unwrap(), "/news");
        assert!(validate_path("news").is_err());
        assert!(validate_path("/a b").is_err());
    }

    #[tokio::test]
    async fn test_page_crud_and_audit_order() {
        let service = service().await;
        let weak = service
            .create_page(CreateSeoPageInput {
                path: "/speeches".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(weak.score, 5);

        let strong = service
            .create_page(CreateSeoPageInput {
                path: "/".to_string(),
                title: Some("Home".to_string()),
                keywords: Some("mp".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(strong.score, 40);

        let audit = service.audit().await.unwrap();
        assert_eq!(audit[0].path, "/speeches");
        assert_eq!(audit[1].path, "/");

        let updated = service
            .update_page(
                weak.id,
                UpdateSeoPageInput {
                    og_image: Some("/uploads/x.png".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.score, 15);
        assert_eq!(service.page_for_path("/speeches").await.unwrap().score, 15);
    }

    #[tokio::test]
    async fn test_duplicate_path_and_keyword_conflict() {
        let service = service().await;
        service
            .create_page(CreateSeoPageInput {
                path: "/news".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(matches!(
            service
                .create_page(CreateSeoPageInput {
                    path: "/news".to_string(),
                    ..Default::default()
                })
                .await,
            Err(SeoError::Conflict(_))
        ));

        let kw = service
            .create_keyword(CreateSeoKeywordInput {
                keyword: "  Road   Safety ".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(kw.keyword, "road safety");
        assert!(kw.tracked);
        assert!(matches!(
            service
                .create_keyword(CreateSeoKeywordInput {
                    keyword: "road safety".to_string(),
                    ..Default::default()
                })
                .await,
            Err(SeoError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_unique_index_rejection_is_conflict() {
        let service = service().await;
        let page = service
            .create_page(CreateSeoPageInput {
                path: "/news".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        // A second writer that got past the existence check
        let err = service.repo.create_page(&page).await.unwrap_err();
        assert!(matches!(
            unique_write_error(err, &page.path),
            SeoError::Conflict(path) if path == "/news"
        ));

        let kw = service
            .create_keyword(CreateSeoKeywordInput {
                keyword: "roads".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        let err = service.repo.create_keyword(&kw).await.unwrap_err();
        assert!(matches!(unique_write_error(err, &kw.keyword), SeoError::Conflict(_)));
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn opt_text() -> impl Strategy<Value = Option<String>> {
            proptest::option::of(".{0,200}")
        }

        proptest! {
            #[test]
            fn property_score_in_range(
                title in opt_text(),
                description in opt_text(),
                keywords in opt_text(),
                og in opt_text(),
                no_index in any::<bool>(),
            ) {
                let mut page = bare_page();
                page.title = title;
                page.meta_description = description;
                page.keywords = keywords;
                page.og_image = og;
                page.no_index = no_index;
                let score = seo_score(&page);
                prop_assert!((0..=100).contains(&score));
                prop_assert_eq!(score == 100, audit_issues(&page).is_empty());
            }
        }
    }
}
