//! Speech repository

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{ContentStatus, ListParams, Speech};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

const SPEECH_COLUMNS: &str = "id, slug, title, content, content_html, venue, delivered_at, video_url, \
     status, author_id, published_at, created_at, updated_at";

#[async_trait]
pub trait SpeechRepository: Send + Sync {
    async fn create(&self, speech: &Speech) -> Result<Speech>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Speech>>;

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Speech>>;

    /// Newest first; `status` restricts the listing when given
    async fn list(&self, status: Option<ContentStatus>, params: &ListParams) -> Result<(Vec<Speech>, i64)>;

    async fn update(&self, speech: &Speech) -> Result<Speech>;

    async fn delete(&self, id: i64) -> Result<bool>;

    async fn exists_by_slug(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool>;

    async fn count(&self, status: Option<ContentStatus>) -> Result<i64>;
}

pub struct SqlxSpeechRepository {
    pool: DynDatabasePool,
}

impl SqlxSpeechRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SpeechRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl SpeechRepository for SqlxSpeechRepository {
    async fn create(&self, speech: &Speech) -> Result<Speech> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_speech_sqlite(self.pool.sqlite()?, speech).await,
            DatabaseDriver::Mysql => create_speech_mysql(self.pool.mysql()?, speech).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Speech>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_speech_by_id_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => get_speech_by_id_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Speech>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_speech_by_slug_sqlite(self.pool.sqlite()?, slug).await,
            DatabaseDriver::Mysql => get_speech_by_slug_mysql(self.pool.mysql()?, slug).await,
        }
    }

    async fn list(&self, status: Option<ContentStatus>, params: &ListParams) -> Result<(Vec<Speech>, i64)> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_speeches_sqlite(self.pool.sqlite()?, status, params).await,
            DatabaseDriver::Mysql => list_speeches_mysql(self.pool.mysql()?, status, params).await,
        }
    }

    async fn update(&self, speech: &Speech) -> Result<Speech> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_speech_sqlite(self.pool.sqlite()?, speech).await,
            DatabaseDriver::Mysql => update_speech_mysql(self.pool.mysql()?, speech).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_speech_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => delete_speech_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn exists_by_slug(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => speech_slug_exists_sqlite(self.pool.sqlite()?, slug, exclude_id).await,
            DatabaseDriver::Mysql => speech_slug_exists_mysql(self.pool.mysql()?, slug, exclude_id).await,
        }
    }

    async fn count(&self, status: Option<ContentStatus>) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => count_speeches_sqlite(self.pool.sqlite()?, status).await,
            DatabaseDriver::Mysql => count_speeches_mysql(self.pool.mysql()?, status).await,
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_speech_sqlite(pool: &SqlitePool, speech: &Speech) -> Result<Speech> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO speeches
            (slug, title, content, content_html, venue, delivered_at, video_url,
             status, author_id, published_at, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&speech.slug)
    .bind(&speech.title)
    .bind(&speech.content)
    .bind(&speech.content_html)
    .bind(&speech.venue)
    .bind(speech.delivered_at)
    .bind(&speech.video_url)
    .bind(speech.status.as_str())
    .bind(speech.author_id)
    .bind(speech.published_at)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create speech")?;

    Ok(Speech {
        id: result.last_insert_rowid(),
        created_at: now,
        updated_at: now,
        ..speech.clone()
    })
}

async fn get_speech_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Speech>> {
    let sql = format!("SELECT {} FROM speeches WHERE id = ?", SPEECH_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get speech")?;
    row.map(|r| row_to_speech_sqlite(&r)).transpose()
}

async fn get_speech_by_slug_sqlite(pool: &SqlitePool, slug: &str) -> Result<Option<Speech>> {
    let sql = format!("SELECT {} FROM speeches WHERE slug = ?", SPEECH_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get speech by slug")?;
    row.map(|r| row_to_speech_sqlite(&r)).transpose()
}

async fn list_speeches_sqlite(
    pool: &SqlitePool,
    status: Option<ContentStatus>,
    params: &ListParams,
) -> Result<(Vec<Speech>, i64)> {
    let status_str = status.map(|s| s.as_str());
    let sql = format!(
        "SELECT {} FROM speeches WHERE (? IS NULL OR status = ?) \
         ORDER BY COALESCE(published_at, created_at) DESC, id DESC LIMIT ? OFFSET ?",
        SPEECH_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(status_str)
        .bind(status_str)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list speeches")?;

    let items = rows
        .iter()
        .map(row_to_speech_sqlite)
        .collect::<Result<Vec<_>>>()?;
    let total = count_speeches_sqlite(pool, status).await?;

    Ok((items, total))
}

async fn update_speech_sqlite(pool: &SqlitePool, speech: &Speech) -> Result<Speech> {
    let now = Utc::now();

    sqlx::query(
        r#"
        UPDATE speeches
        SET slug = ?, title = ?, content = ?, content_html = ?, venue = ?, delivered_at = ?,
            video_url = ?, status = ?, published_at = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&speech.slug)
    .bind(&speech.title)
    .bind(&speech.content)
    .bind(&speech.content_html)
    .bind(&speech.venue)
    .bind(speech.delivered_at)
    .bind(&speech.video_url)
    .bind(speech.status.as_str())
    .bind(speech.published_at)
    .bind(now)
    .bind(speech.id)
    .execute(pool)
    .await
    .context("Failed to update speech")?;

    Ok(Speech {
        updated_at: now,
        ..speech.clone()
    })
}

async fn delete_speech_sqlite(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM speeches WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete speech")?;
    Ok(result.rows_affected() > 0)
}

async fn speech_slug_exists_sqlite(pool: &SqlitePool, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
    let row = sqlx::query("SELECT COUNT(*) AS count FROM speeches WHERE slug = ? AND (? IS NULL OR id <> ?)")
        .bind(slug)
        .bind(exclude_id)
        .bind(exclude_id)
        .fetch_one(pool)
        .await
        .context("Failed to check speech slug")?;
    let count: i64 = row.get("count");
    Ok(count > 0)
}

async fn count_speeches_sqlite(pool: &SqlitePool, status: Option<ContentStatus>) -> Result<i64> {
    let status = status.map(|s| s.as_str());
    let row = sqlx::query("SELECT COUNT(*) AS count FROM speeches WHERE (? IS NULL OR status = ?)")
        .bind(status)
        .bind(status)
        .fetch_one(pool)
        .await
        .context("Failed to count speeches")?;
    Ok(row.get("count"))
}

fn row_to_speech_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Speech> {
    let status: String = row.get("status");

    Ok(Speech {
        id: row.get("id"),
        slug: row.get("slug"),
        title: row.get("title"),
        content: row.get("content"),
        content_html: row.get("content_html"),
        venue: row.get("venue"),
        delivered_at: row.get("delivered_at"),
        video_url: row.get("video_url"),
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

async fn create_speech_mysql(pool: &MySqlPool, speech: &Speech) -> Result<Speech> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO speeches
            (slug, title, content, content_html, venue, delivered_at, video_url,
             status, author_id, published_at, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&speech.slug)
    .bind(&speech.title)
    .bind(&speech.content)
    .bind(&speech.content_html)
    .bind(&speech.venue)
    .bind(speech.delivered_at)
    .bind(&speech.video_url)
    .bind(speech.status.as_str())
    .bind(speech.author_id)
    .bind(speech.published_at)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create speech")?;

    Ok(Speech {
        id: result.last_insert_id() as i64,
        created_at: now,
        updated_at: now,
        ..speech.clone()
    })
}

async fn get_speech_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Speech>> {
    let sql = format!("SELECT {} FROM speeches WHERE id = ?", SPEECH_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get speech")?;
    row.map(|r| row_to_speech_mysql(&r)).transpose()
}

async fn get_speech_by_slug_mysql(pool: &MySqlPool, slug: &str) -> Result<Option<Speech>> {
    let sql = format!("SELECT {} FROM speeches WHERE slug = ?", SPEECH_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get speech by slug")?;
    row.map(|r| row_to_speech_mysql(&r)).transpose()
}

async fn list_speeches_mysql(
    pool: &MySqlPool,
    status: Option<ContentStatus>,
    params: &ListParams,
) -> Result<(Vec<Speech>, i64)> {
    let status_str = status.map(|s| s.as_str());
    let sql = format!(
        "SELECT {} FROM speeches WHERE (? IS NULL OR status = ?) \
         ORDER BY COALESCE(published_at, created_at) DESC, id DESC LIMIT ? OFFSET ?",
        SPEECH_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(status_str)
        .bind(status_str)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list speeches")?;

    let items = rows
        .iter()
        .map(row_to_speech_mysql)
        .collect::<Result<Vec<_>>>()?;
    let total = count_speeches_mysql(pool, status).await?;

    Ok((items, total))
}

async fn update_speech_mysql(pool: &MySqlPool, speech: &Speech) -> Result<Speech> {
    let now = Utc::now();

    sqlx::query(
        r#"
        UPDATE speeches
        SET slug = ?, title = ?, content = ?, content_html = ?, venue = ?, delivered_at = ?,
            video_url = ?, status = ?, published_at = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&speech.slug)
    .bind(&speech.title)
    .bind(&speech.content)
    .bind(&speech.content_html)
    .bind(&speech.venue)
    .bind(speech.delivered_at)
    .bind(&speech.video_url)
    .bind(speech.status.as_str())
    .bind(speech.published_at)
    .bind(now)
    .bind(speech.id)
    .execute(pool)
    .await
    .context("Failed to update speech")?;

    Ok(Speech {
        updated_at: now,
        ..speech.clone()
    })
}

async fn delete_speech_mysql(pool: &MySqlPool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM speeches WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete speech")?;
    Ok(result.rows_affected() > 0)
}

async fn speech_slug_exists_mysql(pool: &MySqlPool, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
    let row = sqlx::query("SELECT COUNT(*) AS count FROM speeches WHERE slug = ? AND (? IS NULL OR id <> ?)")
        .bind(slug)
        .bind(exclude_id)
        .bind(exclude_id)
        .fetch_one(pool)
        .await
        .context("Failed to check speech slug")?;
    let count: i64 = row.get("count");
    Ok(count > 0)
}

async fn count_speeches_mysql(pool: &MySqlPool, status: Option<ContentStatus>) -> Result<i64> {
    let status = status.map(|s| s.as_str());
    let row = sqlx::query("SELECT COUNT(*) AS count FROM speeches WHERE (? IS NULL OR status = ?)")
        .bind(status)
        .bind(status)
        .fetch_one(pool)
        .await
        .context("Failed to count speeches")?;
    Ok(row.get("count"))
}

fn row_to_speech_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Speech> {
    let status: String = row.get("status");

    Ok(Speech {
        id: row.get("id"),
        slug: row.get("slug"),
        title: row.get("title"),
        content: row.get("content"),
        content_html: row.get("content_html"),
        venue: row.get("venue"),
        delivered_at: row.get("delivered_at"),
        video_url: row.get("video_url"),
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

    async fn setup_repo() -> SqlxSpeechRepository {
        let pool = create_test_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();
        SqlxSpeechRepository::new(pool)
    }

    fn speech(slug: &str) -> Speech {
        let now = Utc::now();
        Speech {
            id: 0,
            slug: slug.to_string(),
            title: "Budget debate".to_string(),
            content: "Madam Speaker".to_string(),
            content_html: "<p>Madam Speaker</p>".to_string(),
            venue: Some("National Assembly".to_string()),
            delivered_at: Some(now),
            video_url: None,
            status: ContentStatus::Draft,
            author_id: None,
            published_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_roundtrip_by_id_and_slug() {
        let repo = setup_repo().await;
        let created = repo.create(&speech("budget-debate")).await.unwrap();

        let by_id = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(by_id.venue.as_deref(), Some("National Assembly"));
        let by_slug = repo.get_by_slug("budget-debate").await.unwrap().unwrap();
        assert_eq!(by_slug.id, created.id);
        assert!(repo.get_by_id(created.id + 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_changes_stored_row() {
        let repo = setup_repo().await;
        let mut created = repo.create(&speech("town-hall")).await.unwrap();
        created.venue = Some("Town Hall".to_string());
        repo.update(&created).await.unwrap();

        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.venue.as_deref(), Some("Town Hall"));
        assert_eq!(fetched.title, "Budget debate");
    }

    #[tokio::test]
    async fn test_count_and_delete() {
        let repo = setup_repo().await;
        let a = repo.create(&speech("a")).await.unwrap();
        repo.create(&speech("b")).await.unwrap();
        assert_eq!(repo.count(None).await.unwrap(), 2);
        assert_eq!(repo.count(Some(ContentStatus::Published)).await.unwrap(), 0);

        assert!(repo.delete(a.id).await.unwrap());
        assert_eq!(repo.count(None).await.unwrap(), 1);
        assert!(repo.exists_by_slug("b", None).await.unwrap());
    }
}
