//! Scheduled publication repository

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{ContentKind, ListParams, ScheduleStatus, ScheduledPost};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

const SCHEDULE_COLUMNS: &str =
    "id, content_type, content_id, scheduled_for, status, note, created_by, created_at, updated_at";

#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    async fn create(&self, entry: &ScheduledPost) -> Result<ScheduledPost>;

    async fn get_by_id(&self, id: i64) -> Result<Option<ScheduledPost>>;

    /// Soonest first
    async fn list(&self, status: Option<ScheduleStatus>, params: &ListParams) -> Result<(Vec<ScheduledPost>, i64)>;

    /// Persist time and note
    async fn update(&self, entry: &ScheduledPost) -> Result<ScheduledPost>;

    /// Set the status and, when given, replace the note
    async fn set_status(&self, id: i64, status: ScheduleStatus, note: Option<&str>) -> Result<bool>;

    async fn delete(&self, id: i64) -> Result<bool>;

    /// Pending entries with `scheduled_for <= now`, oldest first
    async fn list_due(&self, now: DateTime<Utc>) -> Result<Vec<ScheduledPost>>;

    async fn count(&self, status: Option<ScheduleStatus>) -> Result<i64>;
}

pub struct SqlxScheduleRepository {
    pool: DynDatabasePool,
}

impl SqlxScheduleRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ScheduleRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ScheduleRepository for SqlxScheduleRepository {
    async fn create(&self, entry: &ScheduledPost) -> Result<ScheduledPost> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_schedule_sqlite(self.pool.sqlite()?, entry).await,
            DatabaseDriver::Mysql => create_schedule_mysql(self.pool.mysql()?, entry).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<ScheduledPost>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_schedule_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => get_schedule_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn list(&self, status: Option<ScheduleStatus>, params: &ListParams) -> Result<(Vec<ScheduledPost>, i64)> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_schedule_sqlite(self.pool.sqlite()?, status, params).await,
            DatabaseDriver::Mysql => list_schedule_mysql(self.pool.mysql()?, status, params).await,
        }
    }

    async fn update(&self, entry: &ScheduledPost) -> Result<ScheduledPost> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_schedule_sqlite(self.pool.sqlite()?, entry).await,
            DatabaseDriver::Mysql => update_schedule_mysql(self.pool.mysql()?, entry).await,
        }
    }

    async fn set_status(&self, id: i64, status: ScheduleStatus, note: Option<&str>) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => set_schedule_status_sqlite(self.pool.sqlite()?, id, status, note).await,
            DatabaseDriver::Mysql => set_schedule_status_mysql(self.pool.mysql()?, id, status, note).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_schedule_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => delete_schedule_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn list_due(&self, now: DateTime<Utc>) -> Result<Vec<ScheduledPost>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => due_schedule_sqlite(self.pool.sqlite()?, now).await,
            DatabaseDriver::Mysql => due_schedule_mysql(self.pool.mysql()?, now).await,
        }
    }

    async fn count(&self, status: Option<ScheduleStatus>) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => count_schedule_sqlite(self.pool.sqlite()?, status).await,
            DatabaseDriver::Mysql => count_schedule_mysql(self.pool.mysql()?, status).await,
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_schedule_sqlite(pool: &SqlitePool, entry: &ScheduledPost) -> Result<ScheduledPost> {
    let now = Utc::now();
    let result = sqlx::query(
        r#"
        INSERT INTO scheduled_posts
            (content_type, content_id, scheduled_for, status, note, created_by, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(entry.content_type.as_str())
    .bind(entry.content_id)
    .bind(entry.scheduled_for)
    .bind(entry.status.as_str())
    .bind(&entry.note)
    .bind(entry.created_by)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create schedule entry")?;

    Ok(ScheduledPost {
        id: result.last_insert_rowid(),
        created_at: now,
        updated_at: now,
        ..entry.clone()
    })
}

async fn get_schedule_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<ScheduledPost>> {
    let sql = format!("SELECT {} FROM scheduled_posts WHERE id = ?", SCHEDULE_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get schedule entry")?;
    row.map(|r| row_to_schedule_sqlite(&r)).transpose()
}

async fn list_schedule_sqlite(
    pool: &SqlitePool,
    status: Option<ScheduleStatus>,
    params: &ListParams,
) -> Result<(Vec<ScheduledPost>, i64)> {
    let status_str = status.map(|s| s.as_str());
    let sql = format!(
        "SELECT {} FROM scheduled_posts WHERE (? IS NULL OR status = ?) \
         ORDER BY scheduled_for ASC, id ASC LIMIT ? OFFSET ?",
        SCHEDULE_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(status_str)
        .bind(status_str)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list schedule entries")?;

    let items = rows
        .iter()
        .map(row_to_schedule_sqlite)
        .collect::<Result<Vec<_>>>()?;
    let total = count_schedule_sqlite(pool, status).await?;
    Ok((items, total))
}

async fn update_schedule_sqlite(pool: &SqlitePool, entry: &ScheduledPost) -> Result<ScheduledPost> {
    let now = Utc::now();
    sqlx::query("UPDATE scheduled_posts SET scheduled_for = ?, note = ?, updated_at = ? WHERE id = ?")
        .bind(entry.scheduled_for)
        .bind(&entry.note)
        .bind(now)
        .bind(entry.id)
        .execute(pool)
        .await
        .context("Failed to update schedule entry")?;

    Ok(ScheduledPost {
        updated_at: now,
        ..entry.clone()
    })
}

async fn set_schedule_status_sqlite(
    pool: &SqlitePool,
    id: i64,
    status: ScheduleStatus,
    note: Option<&str>,
) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE scheduled_posts SET status = ?, note = COALESCE(?, note), updated_at = ? WHERE id = ?",
    )
    .bind(status.as_str())
    .bind(note)
    .bind(Utc::now())
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update schedule status")?;
    Ok(result.rows_affected() > 0)
}

async fn delete_schedule_sqlite(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM scheduled_posts WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete schedule entry")?;
    Ok(result.rows_affected() > 0)
}

async fn due_schedule_sqlite(pool: &SqlitePool, now: DateTime<Utc>) -> Result<Vec<ScheduledPost>> {
    let sql = format!(
        "SELECT {} FROM scheduled_posts WHERE status = 'pending' AND scheduled_for <= ? \
         ORDER BY scheduled_for ASC, id ASC",
        SCHEDULE_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(now)
        .fetch_all(pool)
        .await
        .context("Failed to list due schedule entries")?;
    rows.iter().map(row_to_schedule_sqlite).collect()
}

async fn count_schedule_sqlite(pool: &SqlitePool, status: Option<ScheduleStatus>) -> Result<i64> {
    let status = status.map(|s| s.as_str());
    let row = sqlx::query("SELECT COUNT(*) AS count FROM scheduled_posts WHERE (? IS NULL OR status = ?)")
        .bind(status)
        .bind(status)
        .fetch_one(pool)
        .await
        .context("Failed to count schedule entries")?;
    Ok(row.get("count"))
}

fn row_to_schedule_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<ScheduledPost> {
    let content_type: String = row.get("content_type");
    let status: String = row.get("status");

    Ok(ScheduledPost {
        id: row.get("id"),
        content_type: ContentKind::from_str(&content_type)?,
        content_id: row.get("content_id"),
        scheduled_for: row.get("scheduled_for"),
        status: ScheduleStatus::from_str(&status)?,
        note: row.get("note"),
        created_by: row.get("created_by"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_schedule_mysql(pool: &MySqlPool, entry: &ScheduledPost) -> Result<ScheduledPost> {
    let now = Utc::now();
    let result = sqlx::query(
        r#"
        INSERT INTO scheduled_posts
            (content_type, content_id, scheduled_for, status, note, created_by, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(entry.content_type.as_str())
    .bind(entry.content_id)
    .bind(entry.scheduled_for)
    .bind(entry.status.as_str())
    .bind(&entry.note)
    .bind(entry.created_by)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create schedule entry")?;

    Ok(ScheduledPost {
        id: result.last_insert_id() as i64,
        created_at: now,
        updated_at: now,
        ..entry.clone()
    })
}

async fn get_schedule_mysql(pool: &MySqlPool, id: i64) -> Result<Option<ScheduledPost>> {
    let sql = format!("SELECT {} FROM scheduled_posts WHERE id = ?", SCHEDULE_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get schedule entry")?;
    row.map(|r| row_to_schedule_mysql(&r)).transpose()
}

async fn list_schedule_mysql(
    pool: &MySqlPool,
    status: Option<ScheduleStatus>,
    params: &ListParams,
) -> Result<(Vec<ScheduledPost>, i64)> {
    let status_str = status.map(|s| s.as_str());
    let sql = format!(
        "SELECT {} FROM scheduled_posts WHERE (? IS NULL OR status = ?) \
         ORDER BY scheduled_for ASC, id ASC LIMIT ? OFFSET ?",
        SCHEDULE_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(status_str)
        .bind(status_str)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list schedule entries")?;

    let items = rows
        .iter()
        .map(row_to_schedule_mysql)
        .collect::<Result<Vec<_>>>()?;
    let total = count_schedule_mysql(pool, status).await?;
    Ok((items, total))
}

async fn update_schedule_mysql(pool: &MySqlPool, entry: &ScheduledPost) -> Result<ScheduledPost> {
    let now = Utc::now();
    sqlx::query("UPDATE scheduled_posts SET scheduled_for = ?, note = ?, updated_at = ? WHERE id = ?")
        .bind(entry.scheduled_for)
        .bind(&entry.note)
        .bind(now)
        .bind(entry.id)
        .execute(pool)
        .await
        .context("Failed to update schedule entry")?;

    Ok(ScheduledPost {
        updated_at: now,
        ..entry.clone()
    })
}

async fn set_schedule_status_mysql(
    pool: &MySqlPool,
    id: i64,
    status: ScheduleStatus,
    note: Option<&str>,
) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE scheduled_posts SET status = ?, note = COALESCE(?, note), updated_at = ? WHERE id = ?",
    )
    .bind(status.as_str())
    .bind(note)
    .bind(Utc::now())
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update schedule status")?;
    Ok(result.rows_affected() > 0)
}

async fn delete_schedule_mysql(pool: &MySqlPool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM scheduled_posts WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete schedule entry")?;
    Ok(result.rows_affected() > 0)
}

async fn due_schedule_mysql(pool: &MySqlPool, now: DateTime<Utc>) -> Result<Vec<ScheduledPost>> {
    let sql = format!(
        "SELECT {} FROM scheduled_posts WHERE status = 'pending' AND scheduled_for <= ? \
         ORDER BY scheduled_for ASC, id ASC",
        SCHEDULE_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(now)
        .fetch_all(pool)
        .await
        .context("Failed to list due schedule entries")?;
    rows.iter().map(row_to_schedule_mysql).collect()
}

async fn count_schedule_mysql(pool: &MySqlPool, status: Option<ScheduleStatus>) -> Result<i64> {
    let status = status.map(|s| s.as_str());
    let row = sqlx::query("SELECT COUNT(*) AS count FROM scheduled_posts WHERE (? IS NULL OR status = ?)")
        .bind(status)
        .bind(status)
        .fetch_one(pool)
        .await
        .context("Failed to count schedule entries")?;
    Ok(row.get("count"))
}

fn row_to_schedule_mysql(row: &sqlx::mysql::MySqlRow) -> Result<ScheduledPost> {
    let content_type: String = row.get("content_type");
    let status: String = row.get("status");

    Ok(ScheduledPost {
        id: row.get("id"),
        content_type: ContentKind::from_str(&content_type)?,
        content_id: row.get("content_id"),
        scheduled_for: row.get("scheduled_for"),
        status: ScheduleStatus::from_str(&status)?,
        note: row.get("note"),
        created_by: row.get("created_by"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations::run_migrations};
    use chrono::Duration;

    fn entry(kind: ContentKind, when: DateTime<Utc>) -> ScheduledPost {
        let now = Utc::now();
        ScheduledPost {
            id: 0,
            content_type: kind,
            content_id: 1,
            scheduled_for: when,
            status: ScheduleStatus::Pending,
            note: None,
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_due_entries_and_status_changes() {
        let pool = create_test_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();
        let repo = SqlxScheduleRepository::new(pool);
        let now = Utc::now();

        let past = repo
            .create(&entry(ContentKind::News, now - Duration::minutes(1)))
            .await
            .unwrap();
        repo.create(&entry(ContentKind::Speech, now + Duration::days(1)))
            .await
            .unwrap();

        let due = repo.list_due(now).await.unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].content_type, ContentKind::News);

        repo.set_status(past.id, ScheduleStatus::Failed, Some("content missing"))
            .await
            .unwrap();
        let failed = repo.get_by_id(past.id).await.unwrap().unwrap();
        assert_eq!(failed.status, ScheduleStatus::Failed);
        assert_eq!(failed.note.as_deref(), Some("content missing"));

        assert!(repo.list_due(now).await.unwrap().is_empty());
        assert_eq!(repo.count(Some(ScheduleStatus::Pending)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_orders_soonest_first() {
        let pool = create_test_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();
        let repo = SqlxScheduleRepository::new(pool);
        let now = Utc::now();

        repo.create(&entry(ContentKind::Report, now + Duration::days(3))).await.unwrap();
        repo.create(&entry(ContentKind::News, now + Duration::days(1))).await.unwrap();

        let (items, total) = repo.list(None, &ListParams::default()).await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(items[0].content_type, ContentKind::News);
    }
}
