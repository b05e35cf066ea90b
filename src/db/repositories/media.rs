//! Media library repository

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{ListParams, MediaFile, MediaType};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

const MEDIA_COLUMNS: &str = "id, filename, original_name, mime_type, size, url, media_type, alt_text, \
     caption, uploaded_by, created_at, updated_at";

#[async_trait]
pub trait MediaRepository: Send + Sync {
    async fn create(&self, media: &MediaFile) -> Result<MediaFile>;

    async fn get_by_id(&self, id: i64) -> Result<Option<MediaFile>>;

    /// Newest first; the filter restricts to the given media types when non-empty
    async fn list(&self, types: &[MediaType], params: &ListParams) -> Result<(Vec<MediaFile>, i64)>;

    /// Update alt text and caption
    async fn update(&self, media: &MediaFile) -> Result<MediaFile>;

    async fn delete(&self, id: i64) -> Result<bool>;

    async fn count(&self) -> Result<i64>;
}

pub struct SqlxMediaRepository {
    pool: DynDatabasePool,
}

impl SqlxMediaRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn MediaRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl MediaRepository for SqlxMediaRepository {
    async fn create(&self, media: &MediaFile) -> Result<MediaFile> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_media_sqlite(self.pool.sqlite()?, media).await,
            DatabaseDriver::Mysql => create_media_mysql(self.pool.mysql()?, media).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<MediaFile>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_media_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => get_media_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn list(&self, types: &[MediaType], params: &ListParams) -> Result<(Vec<MediaFile>, i64)> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_media_sqlite(self.pool.sqlite()?, types, params).await,
            DatabaseDriver::Mysql => list_media_mysql(self.pool.mysql()?, types, params).await,
        }
    }

    async fn update(&self, media: &MediaFile) -> Result<MediaFile> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_media_sqlite(self.pool.sqlite()?, media).await,
            DatabaseDriver::Mysql => update_media_mysql(self.pool.mysql()?, media).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_media_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => delete_media_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn count(&self) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => count_media_sqlite(self.pool.sqlite()?, &[]).await,
            DatabaseDriver::Mysql => count_media_mysql(self.pool.mysql()?, &[]).await,
        }
    }
}

/// `media_type IN (...)` clause for a type filter, empty when unfiltered
fn type_filter(types: &[MediaType]) -> String {
    if types.is_empty() {
        return String::new();
    }
    let list = types
        .iter()
        .map(|t| format!("'{}'", t.as_str()))
        .collect::<Vec<_>>()
        .join(", ");
    format!("WHERE media_type IN ({})", list)
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_media_sqlite(pool: &SqlitePool, media: &MediaFile) -> Result<MediaFile> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO media_files
            (filename, original_name, mime_type, size, url, media_type, alt_text, caption,
             uploaded_by, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&media.filename)
    .bind(&media.original_name)
    .bind(&media.mime_type)
    .bind(media.size)
    .bind(&media.url)
    .bind(media.media_type.as_str())
    .bind(&media.alt_text)
    .bind(&media.caption)
    .bind(media.uploaded_by)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create media record")?;

    Ok(MediaFile {
        id: result.last_insert_rowid(),
        created_at: now,
        updated_at: now,
        ..media.clone()
    })
}

async fn get_media_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<MediaFile>> {
    let sql = format!("SELECT {} FROM media_files WHERE id = ?", MEDIA_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get media file")?;
    row.map(|r| row_to_media_sqlite(&r)).transpose()
}

async fn list_media_sqlite(
    pool: &SqlitePool,
    types: &[MediaType],
    params: &ListParams,
) -> Result<(Vec<MediaFile>, i64)> {
    let sql = format!(
        "SELECT {} FROM media_files {} ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
        MEDIA_COLUMNS,
        type_filter(types)
    );
    let rows = sqlx::query(&sql)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list media files")?;

    let items = rows
        .iter()
        .map(row_to_media_sqlite)
        .collect::<Result<Vec<_>>>()?;
    let total = count_media_sqlite(pool, types).await?;
    Ok((items, total))
}

async fn update_media_sqlite(pool: &SqlitePool, media: &MediaFile) -> Result<MediaFile> {
    let now = Utc::now();
    sqlx::query("UPDATE media_files SET alt_text = ?, caption = ?, updated_at = ? WHERE id = ?")
        .bind(&media.alt_text)
        .bind(&media.caption)
        .bind(now)
        .bind(media.id)
        .execute(pool)
        .await
        .context("Failed to update media file")?;

    Ok(MediaFile {
        updated_at: now,
        ..media.clone()
    })
}

async fn delete_media_sqlite(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM media_files WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete media file")?;
    Ok(result.rows_affected() > 0)
}

async fn count_media_sqlite(pool: &SqlitePool, types: &[MediaType]) -> Result<i64> {
    let sql = format!("SELECT COUNT(*) AS count FROM media_files {}", type_filter(types));
    let row = sqlx::query(&sql)
        .fetch_one(pool)
        .await
        .context("Failed to count media files")?;
    Ok(row.get("count"))
}

fn row_to_media_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<MediaFile> {
    let media_type: String = row.get("media_type");

    Ok(MediaFile {
        id: row.get("id"),
        filename: row.get("filename"),
        original_name: row.get("original_name"),
        mime_type: row.get("mime_type"),
        size: row.get("size"),
        url: row.get("url"),
        media_type: MediaType::from_str(&media_type)?,
        alt_text: row.get("alt_text"),
        caption: row.get("caption"),
        uploaded_by: row.get("uploaded_by"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_media_mysql(pool: &MySqlPool, media: &MediaFile) -> Result<MediaFile> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO media_files
            (filename, original_name, mime_type, size, url, media_type, alt_text, caption,
             uploaded_by, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&media.filename)
    .bind(&media.original_name)
    .bind(&media.mime_type)
    .bind(media.size)
    .bind(&media.url)
    .bind(media.media_type.as_str())
    .bind(&media.alt_text)
    .bind(&media.caption)
    .bind(media.uploaded_by)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create media record")?;

    Ok(MediaFile {
        id: result.last_insert_id() as i64,
        created_at: now,
        updated_at: now,
        ..media.clone()
    })
}

async fn get_media_mysql(pool: &MySqlPool, id: i64) -> Result<Option<MediaFile>> {
    let sql = format!("SELECT {} FROM media_files WHERE id = ?", MEDIA_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get media file")?;
    row.map(|r| row_to_media_mysql(&r)).transpose()
}

async fn list_media_mysql(
    pool: &MySqlPool,
    types: &[MediaType],
    params: &ListParams,
) -> Result<(Vec<MediaFile>, i64)> {
    let sql = format!(
        "SELECT {} FROM media_files {} ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
        MEDIA_COLUMNS,
        type_filter(types)
    );
    let rows = sqlx::query(&sql)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list media files")?;

    let items = rows
        .iter()
        .map(row_to_media_mysql)
        .collect::<Result<Vec<_>>>()?;
    let total = count_media_mysql(pool, types).await?;
    Ok((items, total))
}

async fn update_media_mysql(pool: &MySqlPool, media: &MediaFile) -> Result<MediaFile> {
    let now = Utc::now();
    sqlx::query("UPDATE media_files SET alt_text = ?, caption = ?, updated_at = ? WHERE id = ?")
        .bind(&media.alt_text)
        .bind(&media.caption)
        .bind(now)
        .bind(media.id)
        .execute(pool)
        .await
        .context("Failed to update media file")?;

    Ok(MediaFile {
        updated_at: now,
        ..media.clone()
    })
}

async fn delete_media_mysql(pool: &MySqlPool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM media_files WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete media file")?;
    Ok(result.rows_affected() > 0)
}

async fn count_media_mysql(pool: &MySqlPool, types: &[MediaType]) -> Result<i64> {
    let sql = format!("SELECT COUNT(*) AS count FROM media_files {}", type_filter(types));
    let row = sqlx::query(&sql)
        .fetch_one(pool)
        .await
        .context("Failed to count media files")?;
    Ok(row.get("count"))
}

fn row_to_media_mysql(row: &sqlx::mysql::MySqlRow) -> Result<MediaFile> {
    let media_type: String = row.get("media_type");

    Ok(MediaFile {
        id: row.get("id"),
        filename: row.get("filename"),
        original_name: row.get("original_name"),
        mime_type: row.get("mime_type"),
        size: row.get("size"),
        url: row.get("url"),
        media_type: MediaType::from_str(&media_type)?,
        alt_text: row.get("alt_text"),
        caption: row.get("caption"),
        uploaded_by: row.get("uploaded_by"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
