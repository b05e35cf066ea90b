//! Content service
//!
//! Business rules for the three publishable content types (news articles,
//! speeches, reports):
//! - title validation and slug generation / uniqueness
//! - the draft/published/archived lifecycle, with `published_at` stamped on
//!   the first publication
//! - Markdown rendering of bodies
//! - invalidation of the public read cache after every mutation

use crate::cache::{self, SharedCache};
use crate::db::is_unique_violation;
use crate::db::repositories::{NewsRepository, ReportRepository, SpeechRepository};
use crate::models::{
    ContentKind, ContentStatus, CreateNewsInput, CreateReportInput, CreateSpeechInput, ListParams,
    NewsArticle, PagedResult, Report, Speech, UpdateNewsInput, UpdateReportInput,
    UpdateSpeechInput,
};
use crate::services::markdown::MarkdownRenderer;
use anyhow::Context;
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub const MAX_TITLE_LENGTH: usize = 255;

/// Length of the excerpt derived from the body when none is given
const AUTO_EXCERPT_CHARS: usize = 200;

#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Slug already in use: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Turn a title into a URL slug: lowercase ASCII letters and digits joined by
/// single dashes.
pub fn generate_slug(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// Trimmed title, or a validation error when blank or too long
pub fn validate_title(title: &str) -> Result<String, ContentError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ContentError::ValidationError("Title is required".to_string()));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(ContentError::ValidationError(format!(
            "Title must be at most {} characters",
            MAX_TITLE_LENGTH
        )));
    }
    Ok(title.to_string())
}

/// Status after applying `requested` to an item currently in `current`
pub fn next_status(
    current: ContentStatus,
    requested: Option<ContentStatus>,
) -> Result<ContentStatus, ContentError> {
    let Some(next) = requested else {
        return Ok(current);
    };
    if !current.can_transition_to(next) {
        return Err(ContentError::ValidationError(format!(
            "Cannot change status from {} to {}",
            current, next
        )));
    }
    Ok(next)
}

/// `published_at` after moving to `status`; set once, never cleared
fn publication_time(
    status: ContentStatus,
    existing: Option<DateTime<Utc>>,
) -> Option<DateTime<Utc>> {
    match (status, existing) {
        (_, Some(at)) => Some(at),
        (ContentStatus::Published, None) => Some(Utc::now()),
        _ => None,
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let v = v.trim();
        (!v.is_empty()).then(|| v.to_string())
    })
}

/// A write rejected by the slug index is a conflict on `slug`
fn slug_write_error(err: anyhow::Error, slug: &str) -> ContentError {
    if is_unique_violation(&err) {
        ContentError::Conflict(slug.to_string())
    } else {
        ContentError::InternalError(err)
    }
}

pub struct ContentService {
    news: Arc<dyn NewsRepository>,
    speeches: Arc<dyn SpeechRepository>,
    reports: Arc<dyn ReportRepository>,
    cache: SharedCache,
    markdown: MarkdownRenderer,
}

impl ContentService {
    pub fn new(
        news: Arc<dyn NewsRepository>,
        speeches: Arc<dyn SpeechRepository>,
        reports: Arc<dyn ReportRepository>,
        cache: SharedCache,
        markdown: MarkdownRenderer,
    ) -> Self {
        Self {
            news,
            speeches,
            reports,
            cache,
            markdown,
        }
    }

    async fn slug_taken(
        &self,
        kind: ContentKind,
        slug: &str,
        exclude_id: Option<i64>,
    ) -> anyhow::Result<bool> {
        match kind {
            ContentKind::News => self.news.exists_by_slug(slug, exclude_id).await,
            ContentKind::Speech => self.speeches.exists_by_slug(slug, exclude_id).await,
            ContentKind::Report => self.reports.exists_by_slug(slug, exclude_id).await,
        }
    }

    /// Pick the slug for a new item.
    ///
    /// An explicit slug must be free. A generated one gets `-2`, `-3`, ...
    /// appended until it is.
    async fn slug_for_create(
        &self,
        kind: ContentKind,
        explicit: Option<&str>,
        title: &str,
    ) -> Result<String, ContentError> {
        if let Some(explicit) = explicit.filter(|s| !s.trim().is_empty()) {
            return self.explicit_slug(kind, explicit, None).await;
        }

        let mut base = generate_slug(title);
        if base.is_empty() {
            base = kind.as_str().to_string();
        }

        let mut candidate = base.clone();
        let mut n = 2;
        while self
            .slug_taken(kind, &candidate, None)
            .await
            .context("Failed to check slug uniqueness")?
        {
            candidate = format!("{}-{}", base, n);
            n += 1;
        }
        Ok(candidate)
    }

    async fn explicit_slug(
        &self,
        kind: ContentKind,
        slug: &str,
        exclude_id: Option<i64>,
    ) -> Result<String, ContentError> {
        let slug = generate_slug(slug);
        if slug.is_empty() {
            return Err(ContentError::ValidationError(
                "Slug must contain letters or digits".to_string(),
            ));
        }
        if self
            .slug_taken(kind, &slug, exclude_id)
            .await
            .context("Failed to check slug uniqueness")?
        {
            return Err(ContentError::Conflict(slug));
        }
        Ok(slug)
    }

    async fn invalidate(&self, kind: ContentKind) {
        cache::invalidate(&self.cache, &cache::content_scope(kind)).await;
    }

    // ========================================================================
    // News
    // ========================================================================

    pub async fn list_news(
        &self,
        status: Option<ContentStatus>,
        params: &ListParams,
    ) -> Result<PagedResult<NewsArticle>, ContentError> {
        let (items, total) = self
            .news
            .list(status, params)
            .await
            .context("Failed to list news")?;
        Ok(PagedResult::new(items, total, params))
    }

    pub async fn get_news(&self, id: i64) -> Result<NewsArticle, ContentError> {
        self.news
            .get_by_id(id)
            .await
            .context("Failed to load news article")?
            .ok_or_else(|| ContentError::NotFound("News article".to_string()))
    }

    pub async fn create_news(
        &self,
        input: CreateNewsInput,
        author_id: Option<i64>,
    ) -> Result<NewsArticle, ContentError> {
        let title = validate_title(&input.title)?;
        let status = input.status.unwrap_or_default();
        let slug = self
            .slug_for_create(ContentKind::News, input.slug.as_deref(), &title)
            .await?;
        let excerpt = blank_to_none(input.excerpt)
            .or_else(|| blank_to_none(Some(self.markdown.excerpt(&input.content, AUTO_EXCERPT_CHARS))));
        let now = Utc::now();

        let article = NewsArticle {
            id: 0,
            slug,
            title,
            excerpt,
            content_html: self.markdown.render(&input.content),
            content: input.content,
            category: blank_to_none(input.category),
            featured_image: blank_to_none(input.featured_image),
            status,
            author_id,
            published_at: publication_time(status, None),
            view_count: 0,
            created_at: now,
            updated_at: now,
        };

        let created = self
            .news
            .create(&article)
            .await
            .map_err(|e| slug_write_error(e, &article.slug))?;
        tracing::info!("News article {} created ({})", created.id, created.slug);
        self.invalidate(ContentKind::News).await;
        Ok(created)
    }

    pub async fn update_news(
        &self,
        id: i64,
        input: UpdateNewsInput,
    ) -> Result<NewsArticle, ContentError> {
        let mut article = self.get_news(id).await?;

        if let Some(title) = input.title {
            article.title = validate_title(&title)?;
        }
        if let Some(slug) = input.slug {
            if slug != article.slug {
                article.slug = self.explicit_slug(ContentKind::News, &slug, Some(id)).await?;
            }
        }
        if let Some(content) = input.content {
            article.content_html = self.markdown.render(&content);
            article.content = content;
        }
        if input.excerpt.is_some() {
            article.excerpt = blank_to_none(input.excerpt);
        }
        if input.category.is_some() {
            article.category = blank_to_none(input.category);
        }
        if input.featured_image.is_some() {
            article.featured_image = blank_to_none(input.featured_image);
        }
        article.status = next_status(article.status, input.status)?;
        article.published_at = publication_time(article.status, article.published_at);
        article.updated_at = Utc::now();

        let updated = self
            .news
            .update(&article)
            .await
            .map_err(|e| slug_write_error(e, &article.slug))?;
        self.invalidate(ContentKind::News).await;
        Ok(updated)
    }

    pub async fn delete_news(&self, id: i64) -> Result<(), ContentError> {
        if !self.news.delete(id).await? {
            return Err(ContentError::NotFound("News article".to_string()));
        }
        self.invalidate(ContentKind::News).await;
        Ok(())
    }

    /// Published articles for the public site, cached per page
    pub async fn published_news(
        &self,
        params: &ListParams,
    ) -> Result<PagedResult<NewsArticle>, ContentError> {
        let key = cache::list_key(
            &cache::content_scope(ContentKind::News),
            params.page,
            params.per_page,
            None,
        );
        if let Ok(Some(cached)) = self.cache.get(&key).await {
            return Ok(cached);
        }

        let page = self.list_news(Some(ContentStatus::Published), params).await?;
        if let Err(e) = self.cache.set(&key, &page).await {
            tracing::warn!("Failed to cache news list: {}", e);
        }
        Ok(page)
    }

    /// A published article by slug; counts the view
    pub async fn published_news_by_slug(&self, slug: &str) -> Result<NewsArticle, ContentError> {
        let mut article = self
            .news
            .get_by_slug(slug)
            .await
            .context("Failed to load news article")?
            .filter(|a| a.status == ContentStatus::Published)
            .ok_or_else(|| ContentError::NotFound("News article".to_string()))?;

        self.news
            .increment_views(article.id)
            .await
            .context("Failed to count view")?;
        article.view_count += 1;
        Ok(article)
    }

    // ========================================================================
    // Speeches
    // ========================================================================

    pub async fn list_speeches(
        &self,
        status: Option<ContentStatus>,
        params: &ListParams,
    ) -> Result<PagedResult<Speech>, ContentError> {
        let (items, total) = self
            .speeches
            .list(status, params)
            .await
            .context("Failed to list speeches")?;
        Ok(PagedResult::new(items, total, params))
    }

    pub async fn get_speech(&self, id: i64) -> Result<Speech, ContentError> {
        self.speeches
            .get_by_id(id)
            .await
            .context("Failed to load speech")?
            .ok_or_else(|| ContentError::NotFound("Speech".to_string()))
    }

    pub async fn create_speech(
        &self,
        input: CreateSpeechInput,
        author_id: Option<i64>,
    ) -> Result<Speech, ContentError> {
        let title = validate_title(&input.title)?;
        let status = input.status.unwrap_or_default();
        let slug = self
            .slug_for_create(ContentKind::Speech, input.slug.as_deref(), &title)
            .await?;
        let now = Utc::now();

        let speech = Speech {
            id: 0,
            slug,
            title,
            content_html: self.markdown.render(&input.content),
            content: input.content,
            venue: blank_to_none(input.venue),
            delivered_at: input.delivered_at,
            video_url: blank_to_none(input.video_url),
            status,
            author_id,
            published_at: publication_time(status, None),
            created_at: now,
            updated_at: now,
        };

        let created = self
            .speeches
            .create(&speech)
            .await
            .map_err(|e| slug_write_error(e, &speech.slug))?;
        tracing::info!("Speech {} created ({})", created.id, created.slug);
        self.invalidate(ContentKind::Speech).await;
        Ok(created)
    }

    pub async fn update_speech(
        &self,
        id: i64,
        input: UpdateSpeechInput,
    ) -> Result<Speech, ContentError> {
        let mut speech = self.get_speech(id).await?;

        if let Some(title) = input.title {
            speech.title = validate_title(&title)?;
        }
        if let Some(slug) = input.slug {
            if slug != speech.slug {
                speech.slug = self.explicit_slug(ContentKind::Speech, &slug, Some(id)).await?;
            }
        }
        if let Some(content) = input.content {
            speech.content_html = self.markdown.render(&content);
            speech.content = content;
        }
        if input.venue.is_some() {
            speech.venue = blank_to_none(input.venue);
        }
        if input.delivered_at.is_some() {
            speech.delivered_at = input.delivered_at;
        }
        if input.video_url.is_some() {
            speech.video_url = blank_to_none(input.video_url);
        }
        speech.status = next_status(speech.status, input.status)?;
        speech.published_at = publication_time(speech.status, speech.published_at);
        speech.updated_at = Utc::now();

        let updated = self
            .speeches
            .update(&speech)
            .await
            .map_err(|e| slug_write_error(e, &speech.slug))?;
        self.invalidate(ContentKind::Speech).await;
        Ok(updated)
    }

    pub async fn delete_speech(&self, id: i64) -> Result<(), ContentError> {
        if !self.speeches.delete(id).await? {
            return Err(ContentError::NotFound("Speech".to_string()));
        }
        self.invalidate(ContentKind::Speech).await;
        Ok(())
    }

    pub async fn published_speeches(
        &self,
        params: &ListParams,
    ) -> Result<PagedResult<Speech>, ContentError> {
        let key = cache::list_key(
            &cache::content_scope(ContentKind::Speech),
            params.page,
            params.per_page,
            None,
        );
        if let Ok(Some(cached)) = self.cache.get(&key).await {
            return Ok(cached);
        }

        let page = self.list_speeches(Some(ContentStatus::Published), params).await?;
        if let Err(e) = self.cache.set(&key, &page).await {
            tracing::warn!("Failed to cache speech list: {}", e);
        }
        Ok(page)
    }

    pub async fn published_speech_by_slug(&self, slug: &str) -> Result<Speech, ContentError> {
        let key = cache::item_key(&cache::content_scope(ContentKind::Speech), slug);
        if let Ok(Some(cached)) = self.cache.get(&key).await {
            return Ok(cached);
        }

        let speech = self
            .speeches
            .get_by_slug(slug)
            .await
            .context("Failed to load speech")?
            .filter(|s| s.status == ContentStatus::Published)
            .ok_or_else(|| ContentError::NotFound("Speech".to_string()))?;

        if let Err(e) = self.cache.set(&key, &speech).await {
            tracing::warn!("Failed to cache speech: {}", e);
        }
        Ok(speech)
    }

    // ========================================================================
    // Reports
    // ========================================================================

    pub async fn list_reports(
        &self,
        status: Option<ContentStatus>,
        params: &ListParams,
    ) -> Result<PagedResult<Report>, ContentError> {
        let (items, total) = self
            .reports
            .list(status, params)
            .await
            .context("Failed to list reports")?;
        Ok(PagedResult::new(items, total, params))
    }

    pub async fn get_report(&self, id: i64) -> Result<Report, ContentError> {
        self.reports
            .get_by_id(id)
            .await
            .context("Failed to load report")?
            .ok_or_else(|| ContentError::NotFound("Report".to_string()))
    }

    pub async fn create_report(
        &self,
        input: CreateReportInput,
        author_id: Option<i64>,
    ) -> Result<Report, ContentError> {
        let title = validate_title(&input.title)?;
        let status = input.status.unwrap_or_default();
        let slug = self
            .slug_for_create(ContentKind::Report, input.slug.as_deref(), &title)
            .await?;
        let now = Utc::now();

        let report = Report {
            id: 0,
            slug,
            title,
            summary: blank_to_none(input.summary),
            file_url: blank_to_none(input.file_url),
            category: blank_to_none(input.category),
            status,
            author_id,
            published_at: publication_time(status, None),
            created_at: now,
            updated_at: now,
        };

        let created = self
            .reports
            .create(&report)
            .await
            .map_err(|e| slug_write_error(e, &report.slug))?;
        tracing::info!("Report {} created ({})", created.id, created.slug);
        self.invalidate(ContentKind::Report).await;
        Ok(created)
    }

    pub async fn update_report(
        &self,
        id: i64,
        input: UpdateReportInput,
    ) -> Result<Report, ContentError> {
        let mut report = self.get_report(id).await?;

        if let Some(title) = input.title {
            report.title = validate_title(&title)?;
        }
        if let Some(slug) = input.slug {
            if slug != report.slug {
                report.slug = self.explicit_slug(ContentKind::Report, &slug, Some(id)).await?;
            }
        }
        if input.summary.is_some() {
            report.summary = blank_to_none(input.summary);
        }
        if input.file_url.is_some() {
            report.file_url = blank_to_none(input.file_url);
        }
        if input.category.is_some() {
            report.category = blank_to_none(input.category);
        }
        report.status = next_status(report.status, input.status)?;
        report.published_at = publication_time(report.status, report.published_at);
        report.updated_at = Utc::now();

        let updated = self
            .reports
            .update(&report)
            .await
            .map_err(|e| slug_write_error(e, &report.slug))?;
        self.invalidate(ContentKind::Report).await;
        Ok(updated)
    }

    pub async fn delete_report(&self, id: i64) -> Result<(), ContentError> {
        if !self.reports.delete(id).await? {
            return Err(ContentError::NotFound("Report".to_string()));
        }
        self.invalidate(ContentKind::Report).await;
        Ok(())
    }

    pub async fn published_reports(
        &self,
        params: &ListParams,
    ) -> Result<PagedResult<Report>, ContentError> {
        let key = cache::list_key(
            &cache::content_scope(ContentKind::Report),
            params.page,
            params.per_page,
            None,
        );
        if let Ok(Some(cached)) = self.cache.get(&key).await {
            return Ok(cached);
        }

        let page = self.list_reports(Some(ContentStatus::Published), params).await?;
        if let Err(e) = self.cache.set(&key, &page).await {
            tracing::warn!("Failed to cache report list: {}", e);
        }
        Ok(page)
    }

    pub async fn published_report_by_slug(&self, slug: &str) -> Result<Report, ContentError> {
        let key = cache::item_key(&cache::content_scope(ContentKind::Report), slug);
        if let Ok(Some(cached)) = self.cache.get(&key).await {
            return Ok(cached);
        }

        let report = self
            .reports
            .get_by_slug(slug)
            .await
            .context("Failed to load report")?
            .filter(|r| r.status == ContentStatus::Published)
            .ok_or_else(|| ContentError::NotFound("Report".to_string()))?;

        if let Err(e) = self.cache.set(&key, &report).await {
            tracing::warn!("Failed to cache report: {}", e);
        }
        Ok(report)
    }

    // ========================================================================
    // Shared
    // ========================================================================

    /// Whether an item of `kind` with this id exists
    pub async fn exists(&self, kind: ContentKind, id: i64) -> Result<bool, ContentError> {
        let found = match kind {
            ContentKind::News => self.news.get_by_id(id).await?.is_some(),
            ContentKind::Speech => self.speeches.get_by_id(id).await?.is_some(),
            ContentKind::Report => self.reports.get_by_id(id).await?.is_some(),
        };
        Ok(found)
    }

    /// Move one item to `status`, following the transition table
    pub async fn set_status(
        &self,
        kind: ContentKind,
        id: i64,
        status: ContentStatus,
    ) -> Result<(), ContentError> {
        match kind {
            ContentKind::News => {
                let input = UpdateNewsInput {
                    status: Some(status),
                    ..Default::default()
                };
                self.update_news(id, input).await.map(|_| ())
            }
            ContentKind::Speech => {
                let input = UpdateSpeechInput {
                    status: Some(status),
                    ..Default::default()
                };
                self.update_speech(id, input).await.map(|_| ())
            }
            ContentKind::Report => {
                let input = UpdateReportInput {
                    status: Some(status),
                    ..Default::default()
                };
                self.update_report(id, input).await.map(|_| ())
            }
        }
    }

    pub async fn count(
        &self,
        kind: ContentKind,
        status: Option<ContentStatus>,
    ) -> Result<i64, ContentError> {
        let n = match kind {
            ContentKind::News => self.news.count(status).await?,
            ContentKind::Speech => self.speeches.count(status).await?,
            ContentKind::Report => self.reports.count(status).await?,
        };
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::create_cache;
    use crate::config::CacheConfig;
    use crate::db::repositories::{
        SqlxNewsRepository, SqlxReportRepository, SqlxSpeechRepository,
    };
    use crate::db::{create_test_pool, migrations};

    async fn setup_service() -> ContentService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        ContentService::new(
            SqlxNewsRepository::boxed(pool.clone()),
            SqlxSpeechRepository::boxed(pool.clone()),
            SqlxReportRepository::boxed(pool),
            create_cache(&CacheConfig::default()),
            MarkdownRenderer::new(),
        )
    }

    fn news(title: &str) -> CreateNewsInput {
        CreateNewsInput {
            title: title.to_string(),
            content: "Some **news**".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_generate_slug() {
        assert_eq!(generate_slug("Hello World"), "hello-world");
        assert_eq!(generate_slug("  Budget 2025: what's new?  "), "budget-2025-what-s-new");
        assert_eq!(generate_slug("a -- b__c"), "a-b-c");
        assert_eq!(generate_slug("Élysée"), "lys-e");
        assert_eq!(generate_slug("!!!"), "");
    }

    #[test]
    fn test_validate_title() {
        assert_eq!(validate_title("  Town hall  ").unwrap(), "Town hall");
        assert!(matches!(validate_title("   "), Err(ContentError::ValidationError(_))));
        assert!(validate_title(&"x".repeat(255)).is_ok());
        assert!(validate_title(&"x".repeat(256)).is_err());
    }

    #[test]
    fn test_next_status() {
        use ContentStatus::*;
        assert_eq!(next_status(Draft, None).unwrap(), Draft);
        assert_eq!(next_status(Draft, Some(Published)).unwrap(), Published);
        assert!(next_status(Archived, Some(Published)).is_err());
    }

    #[tokio::test]
    async fn test_create_renders_and_generates_slug() {
        let service = setup_service().await;
        let article = service.create_news(news("Clinic Opens"), None).await.unwrap();

        assert_eq!(article.slug, "clinic-opens");
        assert!(article.content_html.contains("<strong>news</strong>"));
        assert_eq!(article.excerpt.as_deref(), Some("Some news"));
        assert_eq!(article.status, ContentStatus::Draft);
        assert!(article.published_at.is_none());
    }

    #[tokio::test]
    async fn test_generated_slug_collisions_get_suffix() {
        let service = setup_service().await;
        let a = service.create_news(news("Budget"), None).await.unwrap();
        let b = service.create_news(news("Budget"), None).await.unwrap();
        let c = service.create_news(news("Budget!"), None).await.unwrap();

        assert_eq!(a.slug, "budget");
        assert_eq!(b.slug, "budget-2");
        assert_eq!(c.slug, "budget-3");
    }

    #[tokio::test]
    async fn test_explicit_slug_collision_is_conflict() {
        let service = setup_service().await;
        service.create_news(news("Budget"), None).await.unwrap();

        let mut input = news("Another");
        input.slug = Some("budget".to_string());
        let result = service.create_news(input, None).await;
        assert!(matches!(result, Err(ContentError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_slug_index_rejection_is_conflict() {
        let service = setup_service().await;
        let first = service.create_news(news("Budget"), None).await.unwrap();

        // Same slug written straight to the store, as a racing request would
        let mut duplicate = first.clone();
        duplicate.title = "Budget again".to_string();
        let err = service.news.create(&duplicate).await.unwrap_err();
        assert!(matches!(
            slug_write_error(err, &duplicate.slug),
            ContentError::Conflict(slug) if slug == "budget"
        ));

        let second = service.create_news(news("Second"), None).await.unwrap();
        let mut renamed = second.clone();
        renamed.slug = "budget".to_string();
        let err = service.news.update(&renamed).await.unwrap_err();
        assert!(matches!(slug_write_error(err, &renamed.slug), ContentError::Conflict(_)));

        let other = slug_write_error(anyhow::anyhow!("disk full"), "budget");
        assert!(matches!(other, ContentError::InternalError(_)));
    }

    #[tokio::test]
    async fn test_empty_title_inserts_nothing() {
        let service = setup_service().await;
        let result = service.create_news(news("  "), None).await;

        assert!(matches!(result, Err(ContentError::ValidationError(_))));
        assert_eq!(service.count(ContentKind::News, None).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_published_at_stamped_once() {
        let service = setup_service().await;
        let article = service.create_news(news("Roads"), None).await.unwrap();

        service
            .set_status(ContentKind::News, article.id, ContentStatus::Published)
            .await
            .unwrap();
        let first = service.get_news(article.id).await.unwrap().published_at.unwrap();

        service
            .set_status(ContentKind::News, article.id, ContentStatus::Draft)
            .await
            .unwrap();
        service
            .set_status(ContentKind::News, article.id, ContentStatus::Published)
            .await
            .unwrap();
        let again = service.get_news(article.id).await.unwrap();
        assert_eq!(again.published_at.unwrap(), first);
    }

    #[tokio::test]
    async fn test_archived_cannot_be_published() {
        let service = setup_service().await;
        let report = service
            .create_report(
                CreateReportInput {
                    title: "Annual report".to_string(),
                    status: Some(ContentStatus::Archived),
                    ..Default::default()
                },
                None,
            )
            .await
            .unwrap();

        let result = service
            .set_status(ContentKind::Report, report.id, ContentStatus::Published)
            .await;
        assert!(matches!(result, Err(ContentError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_speech_partial_update_changes_only_venue() {
        let service = setup_service().await;
        let speech = service
            .create_speech(
                CreateSpeechInput {
                    title: "Budget speech".to_string(),
                    content: "Colleagues, ...".to_string(),
                    venue: Some("Parliament".to_string()),
                    video_url: Some("https://video.example/1".to_string()),
                    ..Default::default()
                },
                None,
            )
            .await
            .unwrap();

        let updated = service
            .update_speech(
                speech.id,
                UpdateSpeechInput {
                    venue: Some("Town hall".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.venue.as_deref(), Some("Town hall"));
        assert_eq!(updated.title, speech.title);
        assert_eq!(updated.slug, speech.slug);
        assert_eq!(updated.content, speech.content);
        assert_eq!(updated.video_url, speech.video_url);
        assert_eq!(updated.status, speech.status);
    }

    #[tokio::test]
    async fn test_public_lists_hide_drafts_and_refresh_after_mutation() {
        let service = setup_service().await;
        let mut input = news("Published one");
        input.status = Some(ContentStatus::Published);
        service.create_news(input, None).await.unwrap();
        let draft = service.create_news(news("Draft one"), None).await.unwrap();

        let params = ListParams::default();
        let page = service.published_news(&params).await.unwrap();
        assert_eq!(page.total, 1);

        service
            .set_status(ContentKind::News, draft.id, ContentStatus::Published)
            .await
            .unwrap();
        let page = service.published_news(&params).await.unwrap();
        assert_eq!(page.total, 2);
    }

    #[tokio::test]
    async fn test_public_detail_counts_views_and_hides_drafts() {
        let service = setup_service().await;
        let draft = service.create_news(news("Hidden"), None).await.unwrap();
        assert!(matches!(
            service.published_news_by_slug(&draft.slug).await,
            Err(ContentError::NotFound(_))
        ));

        service
            .set_status(ContentKind::News, draft.id, ContentStatus::Published)
            .await
            .unwrap();
        let seen = service.published_news_by_slug(&draft.slug).await.unwrap();
        assert_eq!(seen.view_count, 1);
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let service = setup_service().await;
        assert!(matches!(
            service.delete_speech(42).await,
            Err(ContentError::NotFound(_))
        ));
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn property_slug_is_url_safe(title in ".{0,80}") {
                let slug = generate_slug(&title);
                prop_assert!(slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
                prop_assert!(!slug.starts_with('-'));
                prop_assert!(!slug.ends_with('-'));
                prop_assert!(!slug.contains("--"));
            }
        }
    }
}
