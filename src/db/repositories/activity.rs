//! User activity log repository

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{ListParams, NewActivity, UserActivity};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

const ACTIVITY_COLUMNS: &str = "id, user_id, action, entity_type, entity_id, details, ip_address, created_at";

#[async_trait]
pub trait ActivityRepository: Send + Sync {
    async fn create(&self, activity: &NewActivity) -> Result<UserActivity>;

    /// Newest first, optionally for one user
    async fn list(&self, user_id: Option<i64>, params: &ListParams) -> Result<(Vec<UserActivity>, i64)>;

    async fn recent(&self, limit: u32) -> Result<Vec<UserActivity>>;
}

pub struct SqlxActivityRepository {
    pool: DynDatabasePool,
}

impl SqlxActivityRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ActivityRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ActivityRepository for SqlxActivityRepository {
    async fn create(&self, activity: &NewActivity) -> Result<UserActivity> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_activity_sqlite(self.pool.sqlite()?, activity).await,
            DatabaseDriver::Mysql => create_activity_mysql(self.pool.mysql()?, activity).await,
        }
    }

    async fn list(&self, user_id: Option<i64>, params: &ListParams) -> Result<(Vec<UserActivity>, i64)> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_activity_sqlite(self.pool.sqlite()?, user_id, params).await,
            DatabaseDriver::Mysql => list_activity_mysql(self.pool.mysql()?, user_id, params).await,
        }
    }

    async fn recent(&self, limit: u32) -> Result<Vec<UserActivity>> {
        let params = ListParams::new(1, limit);
        let (items, _) = self.list(None, &params).await?;
        Ok(items)
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_activity_sqlite(pool: &SqlitePool, activity: &NewActivity) -> Result<UserActivity> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO user_activity (user_id, action, entity_type, entity_id, details, ip_address, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(activity.user_id)
    .bind(&activity.action)
    .bind(&activity.entity_type)
    .bind(activity.entity_id)
    .bind(&activity.details)
    .bind(&activity.ip_address)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to record activity")?;

    Ok(UserActivity {
        id: result.last_insert_rowid(),
        user_id: activity.user_id,
        action: activity.action.clone(),
        entity_type: activity.entity_type.clone(),
        entity_id: activity.entity_id,
        details: activity.details.clone(),
        ip_address: activity.ip_address.clone(),
        created_at: now,
    })
}

async fn list_activity_sqlite(
    pool: &SqlitePool,
    user_id: Option<i64>,
    params: &ListParams,
) -> Result<(Vec<UserActivity>, i64)> {
    let sql = format!(
        "SELECT {} FROM user_activity WHERE (? IS NULL OR user_id = ?) \
         ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
        ACTIVITY_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(user_id)
        .bind(user_id)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list activity")?;

    let total: i64 = sqlx::query("SELECT COUNT(*) AS count FROM user_activity WHERE (? IS NULL OR user_id = ?)")
        .bind(user_id)
        .bind(user_id)
        .fetch_one(pool)
        .await
        .context("Failed to count activity")?
        .get("count");

    Ok((rows.iter().map(row_to_activity_sqlite).collect(), total))
}

fn row_to_activity_sqlite(row: &sqlx::sqlite::SqliteRow) -> UserActivity {
    UserActivity {
        id: row.get("id"),
        user_id: row.get("user_id"),
        action: row.get("action"),
        entity_type: row.get("entity_type"),
        entity_id: row.get("entity_id"),
        details: row.get("details"),
        ip_address: row.get("ip_address"),
        created_at: row.get("created_at"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_activity_mysql(pool: &MySqlPool, activity: &NewActivity) -> Result<UserActivity> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO user_activity (user_id, action, entity_type, entity_id, details, ip_address, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(activity.user_id)
    .bind(&activity.action)
    .bind(&activity.entity_type)
    .bind(activity.entity_id)
    .bind(&activity.details)
    .bind(&activity.ip_address)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to record activity")?;

    Ok(UserActivity {
        id: result.last_insert_id() as i64,
        user_id: activity.user_id,
        action: activity.action.clone(),
        entity_type: activity.entity_type.clone(),
        entity_id: activity.entity_id,
        details: activity.details.clone(),
        ip_address: activity.ip_address.clone(),
        created_at: now,
    })
}

async fn list_activity_mysql(
    pool: &MySqlPool,
    user_id: Option<i64>,
    params: &ListParams,
) -> Result<(Vec<UserActivity>, i64)> {
    let sql = format!(
        "SELECT {} FROM user_activity WHERE (? IS NULL OR user_id = ?) \
         ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
        ACTIVITY_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(user_id)
        .bind(user_id)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list activity")?;

    let total: i64 = sqlx::query("SELECT COUNT(*) AS count FROM user_activity WHERE (? IS NULL OR user_id = ?)")
        .bind(user_id)
        .bind(user_id)
        .fetch_one(pool)
        .await
        .context("Failed to count activity")?
        .get("count");

    Ok((rows.iter().map(row_to_activity_mysql).collect(), total))
}

fn row_to_activity_mysql(row: &sqlx::mysql::MySqlRow) -> UserActivity {
    UserActivity {
        id: row.get("id"),
        user_id: row.get("user_id"),
        action: row.get("action"),
        entity_type: row.get("entity_type"),
        entity_id: row.get("entity_id"),
        details: row.get("details"),
        ip_address: row.get("ip_address"),
        created_at: row.get("created_at"),
    }
}
