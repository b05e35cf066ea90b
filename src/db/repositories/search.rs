//! Keyword search across published content
//!
//! One `UNION ALL` over the news, speech and report tables, restricted to
//! published rows and matched with `LIKE` on title and body.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{ContentKind, ListParams};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

/// A raw match before snippet extraction
#[derive(Debug, Clone)]
pub struct SearchRow {
    pub kind: ContentKind,
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub body: String,
    pub published_at: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait SearchRepository: Send + Sync {
    /// Newest first; `kind` limits the search to one table
    async fn search(
        &self,
        query: &str,
        kind: Option<ContentKind>,
        params: &ListParams,
    ) -> Result<(Vec<SearchRow>, i64)>;
}

pub struct SqlxSearchRepository {
    pool: DynDatabasePool,
}

impl SqlxSearchRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SearchRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl SearchRepository for SqlxSearchRepository {
    async fn search(
        &self,
        query: &str,
        kind: Option<ContentKind>,
        params: &ListParams,
    ) -> Result<(Vec<SearchRow>, i64)> {
        let pattern = like_pattern(query);
        let kinds = match kind {
            Some(k) => vec![k],
            None => vec![ContentKind::News, ContentKind::Speech, ContentKind::Report],
        };
        let union = union_sql(&kinds);

        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                search_sqlite(self.pool.sqlite()?, &union, kinds.len(), &pattern, params).await
            }
            DatabaseDriver::Mysql => {
                search_mysql(self.pool.mysql()?, &union, kinds.len(), &pattern, params).await
            }
        }
    }
}

/// `%query%` with LIKE wildcards escaped by `!`
pub fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '!') {
            escaped.push('!');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn select_for(kind: ContentKind) -> String {
    let body = match kind {
        ContentKind::News | ContentKind::Speech => "content",
        ContentKind::Report => "COALESCE(summary, '')",
    };
    format!(
        "SELECT '{kind}' AS kind, id, slug, title, {body} AS body, published_at FROM {table} \
         WHERE status = 'published' AND (title LIKE ? ESCAPE '!' OR {body} LIKE ? ESCAPE '!')",
        kind = kind.as_str(),
        body = body,
        table = kind.table(),
    )
}

fn union_sql(kinds: &[ContentKind]) -> String {
    kinds
        .iter()
        .map(|k| select_for(*k))
        .collect::<Vec<_>>()
        .join(" UNION ALL ")
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn search_sqlite(
    pool: &SqlitePool,
    union: &str,
    selects: usize,
    pattern: &str,
    params: &ListParams,
) -> Result<(Vec<SearchRow>, i64)> {
    let sql = format!(
        "SELECT kind, id, slug, title, body, published_at FROM ({}) hits \
         ORDER BY published_at DESC, id DESC LIMIT ? OFFSET ?",
        union
    );
    let mut query = sqlx::query(&sql);
    for _ in 0..selects {
        query = query.bind(pattern).bind(pattern);
    }
    let rows = query
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(pool)
        .await
        .context("Failed to search content")?;

    let count_sql = format!("SELECT COUNT(*) AS count FROM ({}) hits", union);
    let mut count_query = sqlx::query(&count_sql);
    for _ in 0..selects {
        count_query = count_query.bind(pattern).bind(pattern);
    }
    let total: i64 = count_query
        .fetch_one(pool)
        .await
        .context("Failed to count search results")?
        .get("count");

    let hits = rows
        .iter()
        .map(row_to_hit_sqlite)
        .collect::<Result<Vec<_>>>()?;
    Ok((hits, total))
}

fn row_to_hit_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<SearchRow> {
    let kind: String = row.get("kind");

    Ok(SearchRow {
        kind: ContentKind::from_str(&kind)?,
        id: row.get("id"),
        slug: row.get("slug"),
        title: row.get("title"),
        body: row.get("body"),
        published_at: row.get("published_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn search_mysql(
    pool: &MySqlPool,
    union: &str,
    selects: usize,
    pattern: &str,
    params: &ListParams,
) -> Result<(Vec<SearchRow>, i64)> {
    let sql = format!(
        "SELECT kind, id, slug, title, body, published_at FROM ({}) hits \
         ORDER BY published_at DESC, id DESC LIMIT ? OFFSET ?",
        union
    );
    let mut query = sqlx::query(&sql);
    for _ in 0..selects {
        query = query.bind(pattern).bind(pattern);
    }
    let rows = query
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(pool)
        .await
        .context("Failed to search content")?;

    let count_sql = format!("SELECT COUNT(*) AS count FROM ({}) hits", union);
    let mut count_query = sqlx::query(&count_sql);
    for _ in 0..selects {
        count_query = count_query.bind(pattern).bind(pattern);
    }
    let total: i64 = count_query
        .fetch_one(pool)
        .await
        .context("Failed to count search results")?
        .get("count");

    let hits = rows
        .iter()
        .map(row_to_hit_mysql)
        .collect::<Result<Vec<_>>>()?;
    Ok((hits, total))
}

fn row_to_hit_mysql(row: &sqlx::mysql::MySqlRow) -> Result<SearchRow> {
    let kind: String = row.get("kind");

    Ok(SearchRow {
        kind: ContentKind::from_str(&kind)?,
        id: row.get("id"),
        slug: row.get("slug"),
        title: row.get("title"),
        body: row.get("body"),
        published_at: row.get("published_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations::run_migrations};

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("tax"), "%tax%");
        assert_eq!(like_pattern("50%_off!"), "%50!%!_off!!%");
    }

    #[tokio::test]
    async fn test_search_only_published_across_tables() {
        let pool = create_test_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();
        let sqlite = pool.sqlite().unwrap().clone();

        let now = Utc::now();
        for (slug, status) in [("roads-plan", "published"), ("roads-draft", "draft")] {
            sqlx::query(
                "INSERT INTO news_articles (slug, title, content, content_html, status, published_at, created_at, updated_at) \
                 VALUES (?, 'Roads plan', 'New roads for the district', '', ?, ?, ?, ?)",
            )
            .bind(slug)
            .bind(status)
            .bind(now)
            .bind(now)
            .bind(now)
            .execute(&sqlite)
            .await
            .unwrap();
        }
        sqlx::query(
            "INSERT INTO reports (slug, title, summary, status, published_at, created_at, updated_at) \
             VALUES ('annual', 'Annual report', 'Spending on roads', 'published', ?, ?, ?)",
        )
        .bind(now)
        .bind(now)
        .bind(now)
        .execute(&sqlite)
        .await
        .unwrap();

        let repo = SqlxSearchRepository::new(pool);
        let (hits, total) = repo.search("ROADS", None, &ListParams::default()).await.unwrap();
        assert_eq!(total, 2);
        assert!(hits.iter().all(|h| h.slug != "roads-draft"));

        let (reports, total) = repo
            .search("roads", Some(ContentKind::Report), &ListParams::default())
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(reports[0].kind, ContentKind::Report);

        let (none, _) = repo.search("100%", None, &ListParams::default()).await.unwrap();
        assert!(none.is_empty());
    }
}
