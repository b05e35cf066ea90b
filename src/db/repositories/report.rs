//! Report repository

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{ContentStatus, ListParams, Report};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

const REPORT_COLUMNS: &str =
    "id, slug, title, summary, file_url, category, status, author_id, published_at, created_at, updated_at";

#[async_trait]
pub trait ReportRepository: Send + Sync {
    async fn create(&self, report: &Report) -> Result<Report>;
    async fn get_by_id(&self, id: i64) -> Result<Option<Report>>;
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Report>>;
    async fn list(&self, status: Option<ContentStatus>, params: &ListParams) -> Result<(Vec<Report>, i64)>;
    async fn update(&self, report: &Report) -> Result<Report>;
    async fn delete(&self, id: i64) -> Result<bool>;
    async fn exists_by_slug(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool>;
    async fn count(&self, status: Option<ContentStatus>) -> Result<i64>;
}

pub struct SqlxReportRepository {
    pool: DynDatabasePool,
}

impl SqlxReportRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ReportRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ReportRepository for SqlxReportRepository {
    async fn create(&self, report: &Report) -> Result<Report> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_report_sqlite(self.pool.sqlite()?, report).await,
            DatabaseDriver::Mysql => create_report_mysql(self.pool.mysql()?, report).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Report>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_report_by_id_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => get_report_by_id_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Report>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_report_by_slug_sqlite(self.pool.sqlite()?, slug).await,
            DatabaseDriver::Mysql => get_report_by_slug_mysql(self.pool.mysql()?, slug).await,
        }
    }

    async fn list(&self, status: Option<ContentStatus>, params: &ListParams) -> Result<(Vec<Report>, i64)> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_reports_sqlite(self.pool.sqlite()?, status, params).await,
            DatabaseDriver::Mysql => list_reports_mysql(self.pool.mysql()?, status, params).await,
        }
    }

    async fn update(&self, report: &Report) -> Result<Report> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_report_sqlite(self.pool.sqlite()?, report).await,
            DatabaseDriver::Mysql => update_report_mysql(self.pool.mysql()?, report).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_report_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => delete_report_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn exists_by_slug(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => report_slug_exists_sqlite(self.pool.sqlite()?, slug, exclude_id).await,
            DatabaseDriver::Mysql => report_slug_exists_mysql(self.pool.mysql()?, slug, exclude_id).await,
        }
    }

    async fn count(&self, status: Option<ContentStatus>) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => count_reports_sqlite(self.pool.sqlite()?, status).await,
            DatabaseDriver::Mysql => count_reports_mysql(self.pool.mysql()?, status).await,
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_report_sqlite(pool: &SqlitePool, report: &Report) -> Result<Report> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO reports
            (slug, title, summary, file_url, category, status, author_id, published_at, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&report.slug)
    .bind(&report.title)
    .bind(&report.summary)
    .bind(&report.file_url)
    .bind(&report.category)
    .bind(report.status.as_str())
    .bind(report.author_id)
    .bind(report.published_at)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create report")?;

    Ok(Report {
        id: result.last_insert_rowid(),
        created_at: now,
        updated_at: now,
        ..report.clone()
    })
}

async fn get_report_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Report>> {
    let sql = format!("SELECT {} FROM reports WHERE id = ?", REPORT_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get report")?;
    row.map(|r| row_to_report_sqlite(&r)).transpose()
}

async fn get_report_by_slug_sqlite(pool: &SqlitePool, slug: &str) -> Result<Option<Report>> {
    let sql = format!("SELECT {} FROM reports WHERE slug = ?", REPORT_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get report by slug")?;
    row.map(|r| row_to_report_sqlite(&r)).transpose()
}

async fn list_reports_sqlite(
    pool: &SqlitePool,
    status: Option<ContentStatus>,
    params: &ListParams,
) -> Result<(Vec<Report>, i64)> {
    let status_str = status.map(|s| s.as_str());
    let sql = format!(
        "SELECT {} FROM reports WHERE (? IS NULL OR status = ?) \
         ORDER BY COALESCE(published_at, created_at) DESC, id DESC LIMIT ? OFFSET ?",
        REPORT_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(status_str)
        .bind(status_str)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list reports")?;

    let items = rows
        .iter()
        .map(row_to_report_sqlite)
        .collect::<Result<Vec<_>>>()?;
    let total = count_reports_sqlite(pool, status).await?;

    Ok((items, total))
}

async fn update_report_sqlite(pool: &SqlitePool, report: &Report) -> Result<Report> {
    let now = Utc::now();

    sqlx::query(
        r#"
        UPDATE reports
        SET slug = ?, title = ?, summary = ?, file_url = ?, category = ?, status = ?,
            published_at = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&report.slug)
    .bind(&report.title)
    .bind(&report.summary)
    .bind(&report.file_url)
    .bind(&report.category)
    .bind(report.status.as_str())
    .bind(report.published_at)
    .bind(now)
    .bind(report.id)
    .execute(pool)
    .await
    .context("Failed to update report")?;

    Ok(Report {
        updated_at: now,
        ..report.clone()
    })
}

async fn delete_report_sqlite(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM reports WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete report")?;
    Ok(result.rows_affected() > 0)
}

async fn report_slug_exists_sqlite(pool: &SqlitePool, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
    let row = sqlx::query("SELECT COUNT(*) AS count FROM reports WHERE slug = ? AND (? IS NULL OR id <> ?)")
        .bind(slug)
        .bind(exclude_id)
        .bind(exclude_id)
        .fetch_one(pool)
        .await
        .context("Failed to check report slug")?;
    let count: i64 = row.get("count");
    Ok(count > 0)
}

async fn count_reports_sqlite(pool: &SqlitePool, status: Option<ContentStatus>) -> Result<i64> {
    let status = status.map(|s| s.as_str());
    let row = sqlx::query("SELECT COUNT(*) AS count FROM reports WHERE (? IS NULL OR status = ?)")
        .bind(status)
        .bind(status)
        .fetch_one(pool)
        .await
        .context("Failed to count reports")?;
    Ok(row.get("count"))
}

fn row_to_report_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Report> {
    let status: String = row.get("status");

    Ok(Report {
        id: row.get("id"),
        slug: row.get("slug"),
        title: row.get("title"),
        summary: row.get("summary"),
        file_url: row.get("file_url"),
        category: row.get("category"),
        status: ContentStatus::from_str(&status)?,
        author_id: row.get("author_id"),
        published_at: row.get("published_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_report_mysql(pool: &MySqlPool, report: &Report) -> Result<Report> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO reports
            (slug, title, summary, file_url, category, status, author_id, published_at, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&report.slug)
    .bind(&report.title)
    .bind(&report.summary)
    .bind(&report.file_url)
    .bind(&report.category)
    .bind(report.status.as_str())
    .bind(report.author_id)
    .bind(report.published_at)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create report")?;

    Ok(Report {
        id: result.last_insert_id() as i64,
        created_at: now,
        updated_at: now,
        ..report.clone()
    })
}

async fn get_report_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Report>> {
    let sql = format!("SELECT {} FROM reports WHERE id = ?", REPORT_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get report")?;
    row.map(|r| row_to_report_mysql(&r)).transpose()
}

async fn get_report_by_slug_mysql(pool: &MySqlPool, slug: &str) -> Result<Option<Report>> {
    let sql = format!("SELECT {} FROM reports WHERE slug = ?", REPORT_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get report by slug")?;
    row.map(|r| row_to_report_mysql(&r)).transpose()
}

async fn list_reports_mysql(
    pool: &MySqlPool,
    status: Option<ContentStatus>,
    params: &ListParams,
) -> Result<(Vec<Report>, i64)> {
    let status_str = status.map(|s| s.as_str());
    let sql = format!(
        "SELECT {} FROM reports WHERE (? IS NULL OR status = ?) \
         ORDER BY COALESCE(published_at, created_at) DESC, id DESC LIMIT ? OFFSET ?",
        REPORT_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(status_str)
        .bind(status_str)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list reports")?;

    let items = rows
        .iter()
        .map(row_to_report_mysql)
        .collect::<Result<Vec<_>>>()?;
    let total = count_reports_mysql(pool, status).await?;

    Ok((items, total))
}

async fn update_report_mysql(pool: &MySqlPool, report: &Report) -> Result<Report> {
    let now = Utc::now();

    sqlx::query(
        r#"
        UPDATE reports
        SET slug = ?, title = ?, summary = ?, file_url = ?, category = ?, status = ?,
            published_at = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&report.slug)
    .bind(&report.title)
    .bind(&report.summary)
    .bind(&report.file_url)
    .bind(&report.category)
    .bind(report.status.as_str())
    .bind(report.published_at)
    .bind(now)
    .bind(report.id)
    .execute(pool)
    .await
    .context("Failed to update report")?;

    Ok(Report {
        updated_at: now,
        ..report.clone()
    })
}

async fn delete_report_mysql(pool: &MySqlPool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM reports WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete report")?;
    Ok(result.rows_affected() > 0)
}

async fn report_slug_exists_mysql(pool: &MySqlPool, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
    let row = sqlx::query("SELECT COUNT(*) AS count FROM reports WHERE slug = ? AND (? IS NULL OR id <> ?)")
        .bind(slug)
        .bind(exclude_id)
        .bind(exclude_id)
        .fetch_one(pool)
        .await
        .context("Failed to check report slug")?;
    let count: i64 = row.get("count");
    Ok(count > 0)
}

async fn count_reports_mysql(pool: &MySqlPool, status: Option<ContentStatus>) -> Result<i64> {
    let status = status.map(|s| s.as_str());
    let row = sqlx::query("SELECT COUNT(*) AS count FROM reports WHERE (? IS NULL OR status = ?)")
        .bind(status)
        .bind(status)
        .fetch_one(pool)
        .await
        .context("Failed to count reports")?;
    Ok(row.get("count"))
}

fn row_to_report_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Report> {
    let status: String = row.get("status");

    Ok(Report {
        id: row.get("id"),
        slug: row.get("slug"),
        title: row.get("title"),
        summary: row.get("summary"),
        file_url: row.get("file_url"),
        category: row.get("category"),
        status: ContentStatus::from_str(&status)?,
        author_id: row.get("author_id"),
        published_at: row.get("published_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations::run_migrations};

    #[tokio::test]
    async fn test_report_crud() {
        let pool = create_test_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();
        let repo = SqlxReportRepository::new(pool);

        let now = Utc::now();
        let created = repo
            .create(&Report {
                id: 0,
                slug: "annual-2025".to_string(),
                title: "Annual report 2025".to_string(),
                summary: Some("Constituency development fund spending".to_string()),
                file_url: Some("/uploads/annual-2025.pdf".to_string()),
                category: Some("annual".to_string()),
                status: ContentStatus::Published,
                author_id: None,
                published_at: Some(now),
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();

        let fetched = repo.get_by_slug("annual-2025").await.unwrap().unwrap();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.file_url.as_deref(), Some("/uploads/annual-2025.pdf"));

        let mut archived = fetched.clone();
        archived.status = ContentStatus::Archived;
        repo.update(&archived).await.unwrap();
        assert_eq!(repo.count(Some(ContentStatus::Published)).await.unwrap(), 0);
        assert_eq!(repo.count(Some(ContentStatus::Archived)).await.unwrap(), 1);

        let (items, total) = repo.list(None, &ListParams::default()).await.unwrap();
        assert_eq!((items.len(), total), (1, 1));

        assert!(repo.delete(created.id).await.unwrap());
        assert!(repo.get_by_id(created.id).await.unwrap().is_none());
    }
}
