//! News article repository
//!
//! This module provides:
//! - `NewsRepository` trait defining the interface for news data access
//! - `SqlxNewsRepository` implementing the trait for SQLite and MySQL

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{ContentStatus, ListParams, NewsArticle};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

const NEWS_COLUMNS: &str = "id, slug, title, excerpt, content, content_html, category, featured_image, \
     status, author_id, published_at, view_count, created_at, updated_at";

/// News repository trait
#[async_trait]
pub trait NewsRepository: Send + Sync {
    /// Insert a new article
    async fn create(&self, article: &NewsArticle) -> Result<NewsArticle>;

    async fn get_by_id(&self, id: i64) -> Result<Option<NewsArticle>>;

    async fn get_by_slug(&self, slug: &str) -> Result<Option<NewsArticle>>;

    /// List articles, newest first, optionally restricted to one status
    async fn list(
        &self,
        status: Option<ContentStatus>,
        params: &ListParams,
    ) -> Result<(Vec<NewsArticle>, i64)>;

    /// Persist every mutable column of `article`
    async fn update(&self, article: &NewsArticle) -> Result<NewsArticle>;

    /// Returns false when no row matched
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Whether `slug` is taken by an article other than `exclude_id`
    async fn exists_by_slug(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool>;

    async fn increment_views(&self, id: i64) -> Result<()>;

    async fn count(&self, status: Option<ContentStatus>) -> Result<i64>;
}

/// SQLx-based news repository implementation
pub struct SqlxNewsRepository {
    pool: DynDatabasePool,
}

impl SqlxNewsRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn NewsRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl NewsRepository for SqlxNewsRepository {
    async fn create(&self, article: &NewsArticle) -> Result<NewsArticle> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_news_sqlite(self.pool.sqlite()?, article).await,
            DatabaseDriver::Mysql => create_news_mysql(self.pool.mysql()?, article).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<NewsArticle>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_news_by_id_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => get_news_by_id_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<NewsArticle>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_news_by_slug_sqlite(self.pool.sqlite()?, slug).await,
            DatabaseDriver::Mysql => get_news_by_slug_mysql(self.pool.mysql()?, slug).await,
        }
    }

    async fn list(
        &self,
        status: Option<ContentStatus>,
        params: &ListParams,
    ) -> Result<(Vec<NewsArticle>, i64)> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_news_sqlite(self.pool.sqlite()?, status, params).await,
            DatabaseDriver::Mysql => list_news_mysql(self.pool.mysql()?, status, params).await,
        }
    }

    async fn update(&self, article: &NewsArticle) -> Result<NewsArticle> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_news_sqlite(self.pool.sqlite()?, article).await,
            DatabaseDriver::Mysql => update_news_mysql(self.pool.mysql()?, article).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_news_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => delete_news_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn exists_by_slug(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => news_slug_exists_sqlite(self.pool.sqlite()?, slug, exclude_id).await,
            DatabaseDriver::Mysql => news_slug_exists_mysql(self.pool.mysql()?, slug, exclude_id).await,
        }
    }

    async fn increment_views(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => increment_news_views_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => increment_news_views_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn count(&self, status: Option<ContentStatus>) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => count_news_sqlite(self.pool.sqlite()?, status).await,
            DatabaseDriver::Mysql => count_news_mysql(self.pool.mysql()?, status).await,
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_news_sqlite(pool: &SqlitePool, article: &NewsArticle) -> Result<NewsArticle> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO news_articles
            (slug, title, excerpt, content, content_html, category, featured_image,
             status, author_id, published_at, view_count, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?)
        "#,
    )
    .bind(&article.slug)
    .bind(&article.title)
    .bind(&article.excerpt)
    .bind(&article.content)
    .bind(&article.content_html)
    .bind(&article.category)
    .bind(&article.featured_image)
    .bind(article.status.as_str())
    .bind(article.author_id)
    .bind(article.published_at)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create news article")?;

    Ok(NewsArticle {
        id: result.last_insert_rowid(),
        view_count: 0,
        created_at: now,
        updated_at: now,
        ..article.clone()
    })
}

async fn get_news_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<NewsArticle>> {
    let sql = format!("SELECT {} FROM news_articles WHERE id = ?", NEWS_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get news article")?;
    row.map(|r| row_to_news_sqlite(&r)).transpose()
}

async fn get_news_by_slug_sqlite(pool: &SqlitePool, slug: &str) -> Result<Option<NewsArticle>> {
    let sql = format!("SELECT {} FROM news_articles WHERE slug = ?", NEWS_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get news article by slug")?;
    row.map(|r| row_to_news_sqlite(&r)).transpose()
}

async fn list_news_sqlite(
    pool: &SqlitePool,
    status: Option<ContentStatus>,
    params: &ListParams,
) -> Result<(Vec<NewsArticle>, i64)> {
    let status = status.map(|s| s.as_str());
    let sql = format!(
        "SELECT {} FROM news_articles WHERE (? IS NULL OR status = ?) \
         ORDER BY COALESCE(published_at, created_at) DESC, id DESC LIMIT ? OFFSET ?",
        NEWS_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(status)
        .bind(status)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list news articles")?;

    let items = rows
        .iter()
        .map(row_to_news_sqlite)
        .collect::<Result<Vec<_>>>()?;

    let total: i64 = sqlx::query("SELECT COUNT(*) AS count FROM news_articles WHERE (? IS NULL OR status = ?)")
        .bind(status)
        .bind(status)
        .fetch_one(pool)
        .await
        .context("Failed to count news articles")?
        .get("count");

    Ok((items, total))
}

async fn update_news_sqlite(pool: &SqlitePool, article: &NewsArticle) -> Result<NewsArticle> {
    let now = Utc::now();

    sqlx::query(
        r#"
        UPDATE news_articles
        SET slug = ?, title = ?, excerpt = ?, content = ?, content_html = ?, category = ?,
            featured_image = ?, status = ?, published_at = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&article.slug)
    .bind(&article.title)
    .bind(&article.excerpt)
    .bind(&article.content)
    .bind(&article.content_html)
    .bind(&article.category)
    .bind(&article.featured_image)
    .bind(article.status.as_str())
    .bind(article.published_at)
    .bind(now)
    .bind(article.id)
    .execute(pool)
    .await
    .context("Failed to update news article")?;

    Ok(NewsArticle {
        updated_at: now,
        ..article.clone()
    })
}

async fn delete_news_sqlite(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM news_articles WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete news article")?;
    Ok(result.rows_affected() > 0)
}

async fn news_slug_exists_sqlite(pool: &SqlitePool, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
    let row = sqlx::query(
        "SELECT COUNT(*) AS count FROM news_articles WHERE slug = ? AND (? IS NULL OR id <> ?)",
    )
    .bind(slug)
    .bind(exclude_id)
    .bind(exclude_id)
    .fetch_one(pool)
    .await
    .context("Failed to check news slug")?;
    let count: i64 = row.get("count");
    Ok(count > 0)
}

async fn increment_news_views_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("UPDATE news_articles SET view_count = view_count + 1 WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to increment view count")?;
    Ok(())
}

async fn count_news_sqlite(pool: &SqlitePool, status: Option<ContentStatus>) -> Result<i64> {
    let status = status.map(|s| s.as_str());
    let row = sqlx::query("SELECT COUNT(*) AS count FROM news_articles WHERE (? IS NULL OR status = ?)")
        .bind(status)
        .bind(status)
        .fetch_one(pool)
        .await
        .context("Failed to count news articles")?;
    Ok(row.get("count"))
}

fn row_to_news_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<NewsArticle> {
    let status: String = row.get("status");

    Ok(NewsArticle {
        id: row.get("id"),
        slug: row.get("slug"),
        title: row.get("title"),
        excerpt: row.get("excerpt"),
        content: row.get("content"),
        content_html: row.get("content_html"),
        category: row.get("category"),
        featured_image: row.get("featured_image"),
        status: ContentStatus::from_str(&status)?,
        author_id: row.get("author_id"),
        published_at: row.get("published_at"),
        view_count: row.get("view_count"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_news_mysql(pool: &MySqlPool, article: &NewsArticle) -> Result<NewsArticle> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO news_articles
            (slug, title, excerpt, content, content_html, category, featured_image,
             status, author_id, published_at, view_count, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?)
        "#,
    )
    .bind(&article.slug)
    .bind(&article.title)
    .bind(&article.excerpt)
    .bind(&article.content)
    .bind(&article.content_html)
    .bind(&article.category)
    .bind(&article.featured_image)
    .bind(article.status.as_str())
    .bind(article.author_id)
    .bind(article.published_at)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create news article")?;

    Ok(NewsArticle {
        id: result.last_insert_id() as i64,
        view_count: 0,
        created_at: now,
        updated_at: now,
        ..article.clone()
    })
}

async fn get_news_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<NewsArticle>> {
    let sql = format!("SELECT {} FROM news_articles WHERE id = ?", NEWS_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get news article")?;
    row.map(|r| row_to_news_mysql(&r)).transpose()
}

async fn get_news_by_slug_mysql(pool: &MySqlPool, slug: &str) -> Result<Option<NewsArticle>> {
    let sql = format!("SELECT {} FROM news_articles WHERE slug = ?", NEWS_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get news article by slug")?;
    row.map(|r| row_to_news_mysql(&r)).transpose()
}

async fn list_news_mysql(
    pool: &MySqlPool,
    status: Option<ContentStatus>,
    params: &ListParams,
) -> Result<(Vec<NewsArticle>, i64)> {
    let status = status.map(|s| s.as_str());
    let sql = format!(
        "SELECT {} FROM news_articles WHERE (? IS NULL OR status = ?) \
         ORDER BY COALESCE(published_at, created_at) DESC, id DESC LIMIT ? OFFSET ?",
        NEWS_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(status)
        .bind(status)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list news articles")?;

    let items = rows
        .iter()
        .map(row_to_news_mysql)
        .collect::<Result<Vec<_>>>()?;

    let total: i64 = sqlx::query("SELECT COUNT(*) AS count FROM news_articles WHERE (? IS NULL OR status = ?)")
        .bind(status)
        .bind(status)
        .fetch_one(pool)
        .await
        .context("Failed to count news articles")?
        .get("count");

    Ok((items, total))
}

async fn update_news_mysql(pool: &MySqlPool, article: &NewsArticle) -> Result<NewsArticle> {
    let now = Utc::now();

    sqlx::query(
        r#"
        UPDATE news_articles
        SET slug = ?, title = ?, excerpt = ?, content = ?, content_html = ?, category = ?,
            featured_image = ?, status = ?, published_at = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&article.slug)
    .bind(&article.title)
    .bind(&article.excerpt)
    .bind(&article.content)
    .bind(&article.content_html)
    .bind(&article.category)
    .bind(&article.featured_image)
    .bind(article.status.as_str())
    .bind(article.published_at)
    .bind(now)
    .bind(article.id)
    .execute(pool)
    .await
    .context("Failed to update news article")?;

    Ok(NewsArticle {
        updated_at: now,
        ..article.clone()
    })
}

async fn delete_news_mysql(pool: &MySqlPool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM news_articles WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete news article")?;
    Ok(result.rows_affected() > 0)
}

async fn news_slug_exists_mysql(pool: &MySqlPool, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
    let row = sqlx::query(
        "SELECT COUNT(*) AS count FROM news_articles WHERE slug = ? AND (? IS NULL OR id <> ?)",
    )
    .bind(slug)
    .bind(exclude_id)
    .bind(exclude_id)
    .fetch_one(pool)
    .await
    .context("Failed to check news slug")?;
    let count: i64 = row.get("count");
    Ok(count > 0)
}

async fn increment_news_views_mysql(pool: &MySqlPool, id: i64) -> Result<()> {
    sqlx::query("UPDATE news_articles SET view_count = view_count + 1 WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to increment view count")?;
    Ok(())
}

async fn count_news_mysql(pool: &MySqlPool, status: Option<ContentStatus>) -> Result<i64> {
    let status = status.map(|s| s.as_str());
    let row = sqlx::query("SELECT COUNT(*) AS count FROM news_articles WHERE (? IS NULL OR status = ?)")
        .bind(status)
        .bind(status)
        .fetch_one(pool)
        .await
        .context("Failed to count news articles")?;
    Ok(row.get("count"))
}

fn row_to_news_mysql(row: &sqlx::mysql::MySqlRow) -> Result<NewsArticle> {
    let status: String = row.get("status");

    Ok(NewsArticle {
        id: row.get("id"),
        slug: row.get("slug"),
        title: row.get("title"),
        excerpt: row.get("excerpt"),
        content: row.get("content"),
        content_html: row.get("content_html"),
        category: row.get("category"),
        featured_image: row.get("featured_image"),
        status: ContentStatus::from_str(&status)?,
        author_id: row.get("author_id"),
        published_at: row.get("published_at"),
        view_count: row.get("view_count"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations::run_migrations};

    async fn setup_repo() -> SqlxNewsRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        run_migrations(&pool).await.expect("Failed to run migrations");
        SqlxNewsRepository::new(pool)
    }

    fn article(slug: &str, status: ContentStatus) -> NewsArticle {
        let now = Utc::now();
        NewsArticle {
            id: 0,
            slug: slug.to_string(),
            title: format!("Title {}", slug),
            excerpt: None,
            content: "Body".to_string(),
            content_html: "<p>Body</p>".to_string(),
            category: Some("constituency".to_string()),
            featured_image: None,
            status,
            author_id: None,
            published_at: (status == ContentStatus::Published).then_some(now),
            view_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_create_and_fetch() {
        let repo = setup_repo().await;
        let created = repo.create(&article("roads", ContentStatus::Draft)).await.unwrap();
        assert!(created.id > 0);

        let by_slug = repo.get_by_slug("roads").await.unwrap().unwrap();
        assert_eq!(by_slug.id, created.id);
        assert_eq!(by_slug.category.as_deref(), Some("constituency"));
        assert_eq!(by_slug.status, ContentStatus::Draft);
    }

    #[tokio::test]
    async fn test_list_filters_by_status() {
        let repo = setup_repo().await;
        repo.create(&article("a", ContentStatus::Published)).await.unwrap();
        repo.create(&article("b", ContentStatus::Draft)).await.unwrap();
        repo.create(&article("c", ContentStatus::Published)).await.unwrap();

        let (published, total) = repo
            .list(Some(ContentStatus::Published), &ListParams::default())
            .await
            .unwrap();
        assert_eq!(total, 2);
        assert!(published.iter().all(|a| a.status == ContentStatus::Published));

        let (_, all) = repo.list(None, &ListParams::default()).await.unwrap();
        assert_eq!(all, 3);
        assert_eq!(repo.count(Some(ContentStatus::Draft)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_slug_exists_excluding_self() {
        let repo = setup_repo().await;
        let created = repo.create(&article("budget", ContentStatus::Draft)).await.unwrap();

        assert!(repo.exists_by_slug("budget", None).await.unwrap());
        assert!(!repo.exists_by_slug("budget", Some(created.id)).await.unwrap());
        assert!(!repo.exists_by_slug("other", None).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_delete_and_views() {
        let repo = setup_repo().await;
        let mut created = repo.create(&article("clinic", ContentStatus::Draft)).await.unwrap();

        created.title = "New clinic opens".to_string();
        repo.update(&created).await.unwrap();
        repo.increment_views(created.id).await.unwrap();
        repo.increment_views(created.id).await.unwrap();

        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "New clinic opens");
        assert_eq!(fetched.view_count, 2);

        assert!(repo.delete(created.id).await.unwrap());
        assert!(!repo.delete(created.id).await.unwrap());
    }
}
