//! Social account and social post repository

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{ListParams, SocialAccount, SocialPost, SocialPostStatus};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

const ACCOUNT_COLUMNS: &str = "id, platform, handle, profile_url, is_active, created_at, updated_at";
const POST_COLUMNS: &str =
    "id, account_id, content, media_url, status, scheduled_at, published_at, created_by, created_at, updated_at";

#[async_trait]
pub trait SocialRepository: Send + Sync {
    async fn create_account(&self, account: &SocialAccount) -> Result<SocialAccount>;
    async fn get_account(&self, id: i64) -> Result<Option<SocialAccount>>;
    async fn list_accounts(&self) -> Result<Vec<SocialAccount>>;
    async fn update_account(&self, account: &SocialAccount) -> Result<SocialAccount>;
    /// Posts of the account go with it
    async fn delete_account(&self, id: i64) -> Result<bool>;

    async fn create_post(&self, post: &SocialPost) -> Result<SocialPost>;
    async fn get_post(&self, id: i64) -> Result<Option<SocialPost>>;
    async fn list_posts(&self, status: Option<SocialPostStatus>, params: &ListParams) -> Result<(Vec<SocialPost>, i64)>;
    async fn update_post(&self, post: &SocialPost) -> Result<SocialPost>;
    async fn delete_post(&self, id: i64) -> Result<bool>;

    /// Scheduled posts whose time has come, oldest first
    async fn list_due_posts(&self, now: DateTime<Utc>) -> Result<Vec<SocialPost>>;

    /// Move a post to `status`, stamping `published_at` when given
    async fn set_post_status(
        &self,
        id: i64,
        status: SocialPostStatus,
        published_at: Option<DateTime<Utc>>,
    ) -> Result<bool>;
}

pub struct SqlxSocialRepository {
    pool: DynDatabasePool,
}

impl SqlxSocialRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SocialRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl SocialRepository for SqlxSocialRepository {
    async fn create_account(&self, account: &SocialAccount) -> Result<SocialAccount> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_account_sqlite(self.pool.sqlite()?, account).await,
            DatabaseDriver::Mysql => create_account_mysql(self.pool.mysql()?, account).await,
        }
    }

    async fn get_account(&self, id: i64) -> Result<Option<SocialAccount>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_account_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => get_account_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn list_accounts(&self) -> Result<Vec<SocialAccount>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_accounts_sqlite(self.pool.sqlite()?).await,
            DatabaseDriver::Mysql => list_accounts_mysql(self.pool.mysql()?).await,
        }
    }

    async fn update_account(&self, account: &SocialAccount) -> Result<SocialAccount> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_account_sqlite(self.pool.sqlite()?, account).await,
            DatabaseDriver::Mysql => update_account_mysql(self.pool.mysql()?, account).await,
        }
    }

    async fn delete_account(&self, id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_account_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => delete_account_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn create_post(&self, post: &SocialPost) -> Result<SocialPost> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_post_sqlite(self.pool.sqlite()?, post).await,
            DatabaseDriver::Mysql => create_post_mysql(self.pool.mysql()?, post).await,
        }
    }

    async fn get_post(&self, id: i64) -> Result<Option<SocialPost>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_post_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => get_post_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn list_posts(&self, status: Option<SocialPostStatus>, params: &ListParams) -> Result<(Vec<SocialPost>, i64)> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_posts_sqlite(self.pool.sqlite()?, status, params).await,
            DatabaseDriver::Mysql => list_posts_mysql(self.pool.mysql()?, status, params).await,
        }
    }

    async fn update_post(&self, post: &SocialPost) -> Result<SocialPost> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_post_sqlite(self.pool.sqlite()?, post).await,
            DatabaseDriver::Mysql => update_post_mysql(self.pool.mysql()?, post).await,
        }
    }

    async fn delete_post(&self, id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_post_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => delete_post_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn list_due_posts(&self, now: DateTime<Utc>) -> Result<Vec<SocialPost>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => due_posts_sqlite(self.pool.sqlite()?, now).await,
            DatabaseDriver::Mysql => due_posts_mysql(self.pool.mysql()?, now).await,
        }
    }

    async fn set_post_status(
        &self,
        id: i64,
        status: SocialPostStatus,
        published_at: Option<DateTime<Utc>>,
    ) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => set_post_status_sqlite(self.pool.sqlite()?, id, status, published_at).await,
            DatabaseDriver::Mysql => set_post_status_mysql(self.pool.mysql()?, id, status, published_at).await,
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_account_sqlite(pool: &SqlitePool, account: &SocialAccount) -> Result<SocialAccount> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO social_accounts (platform, handle, profile_url, is_active, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&account.platform)
    .bind(&account.handle)
    .bind(&account.profile_url)
    .bind(account.is_active)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create social account")?;

    Ok(SocialAccount {
        id: result.last_insert_rowid(),
        created_at: now,
        updated_at: now,
        ..account.clone()
    })
}

async fn get_account_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<SocialAccount>> {
    let sql = format!("SELECT {} FROM social_accounts WHERE id = ?", ACCOUNT_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get social account")?;
    Ok(row.map(|r| row_to_account_sqlite(&r)))
}

async fn list_accounts_sqlite(pool: &SqlitePool) -> Result<Vec<SocialAccount>> {
    let sql = format!("SELECT {} FROM social_accounts ORDER BY platform, handle", ACCOUNT_COLUMNS);
    let rows = sqlx::query(&sql)
        .fetch_all(pool)
        .await
        .context("Failed to list social accounts")?;
    Ok(rows.iter().map(row_to_account_sqlite).collect())
}

async fn update_account_sqlite(pool: &SqlitePool, account: &SocialAccount) -> Result<SocialAccount> {
    let now = Utc::now();
    sqlx::query(
        "UPDATE social_accounts SET platform = ?, handle = ?, profile_url = ?, is_active = ?, updated_at = ? \
         WHERE id = ?",
    )
    .bind(&account.platform)
    .bind(&account.handle)
    .bind(&account.profile_url)
    .bind(account.is_active)
    .bind(now)
    .bind(account.id)
    .execute(pool)
    .await
    .context("Failed to update social account")?;

    Ok(SocialAccount {
        updated_at: now,
        ..account.clone()
    })
}

async fn delete_account_sqlite(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM social_accounts WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete social account")?;
    Ok(result.rows_affected() > 0)
}

async fn create_post_sqlite(pool: &SqlitePool, post: &SocialPost) -> Result<SocialPost> {
    let now = Utc::now();
    let result = sqlx::query(
        r#"
        INSERT INTO social_posts
            (account_id, content, media_url, status, scheduled_at, published_at, created_by, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(post.account_id)
    .bind(&post.content)
    .bind(&post.media_url)
    .bind(post.status.as_str())
    .bind(post.scheduled_at)
    .bind(post.published_at)
    .bind(post.created_by)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create social post")?;

    Ok(SocialPost {
        id: result.last_insert_rowid(),
        created_at: now,
        updated_at: now,
        ..post.clone()
    })
}

async fn get_post_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<SocialPost>> {
    let sql = format!("SELECT {} FROM social_posts WHERE id = ?", POST_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get social post")?;
    row.map(|r| row_to_post_sqlite(&r)).transpose()
}

async fn list_posts_sqlite(
    pool: &SqlitePool,
    status: Option<SocialPostStatus>,
    params: &ListParams,
) -> Result<(Vec<SocialPost>, i64)> {
    let status = status.map(|s| s.as_str());
    let sql = format!(
        "SELECT {} FROM social_posts WHERE (? IS NULL OR status = ?) \
         ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
        POST_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(status)
        .bind(status)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list social posts")?;
    let items = rows.iter().map(row_to_post_sqlite).collect::<Result<Vec<_>>>()?;

    let total: i64 = sqlx::query("SELECT COUNT(*) AS count FROM social_posts WHERE (? IS NULL OR status = ?)")
        .bind(status)
        .bind(status)
        .fetch_one(pool)
        .await
        .context("Failed to count social posts")?
        .get("count");

    Ok((items, total))
}

async fn update_post_sqlite(pool: &SqlitePool, post: &SocialPost) -> Result<SocialPost> {
    let now = Utc::now();
    sqlx::query(
        "UPDATE social_posts SET account_id = ?, content = ?, media_url = ?, status = ?, scheduled_at = ?, \
         published_at = ?, updated_at = ? WHERE id = ?",
    )
    .bind(post.account_id)
    .bind(&post.content)
    .bind(&post.media_url)
    .bind(post.status.as_str())
    .bind(post.scheduled_at)
    .bind(post.published_at)
    .bind(now)
    .bind(post.id)
    .execute(pool)
    .await
    .context("Failed to update social post")?;

    Ok(SocialPost {
        updated_at: now,
        ..post.clone()
    })
}

async fn delete_post_sqlite(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM social_posts WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete social post")?;
    Ok(result.rows_affected() > 0)
}

async fn due_posts_sqlite(pool: &SqlitePool, now: DateTime<Utc>) -> Result<Vec<SocialPost>> {
    let sql = format!(
        "SELECT {} FROM social_posts WHERE status = 'scheduled' AND scheduled_at IS NOT NULL \
         AND scheduled_at <= ? ORDER BY scheduled_at, id",
        POST_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(now)
        .fetch_all(pool)
        .await
        .context("Failed to list due social posts")?;
    rows.iter().map(row_to_post_sqlite).collect()
}

async fn set_post_status_sqlite(
    pool: &SqlitePool,
    id: i64,
    status: SocialPostStatus,
    published_at: Option<DateTime<Utc>>,
) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE social_posts SET status = ?, published_at = COALESCE(?, published_at), updated_at = ? WHERE id = ?",
    )
    .bind(status.as_str())
    .bind(published_at)
    .bind(Utc::now())
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update social post status")?;
    Ok(result.rows_affected() > 0)
}

fn row_to_account_sqlite(row: &sqlx::sqlite::SqliteRow) -> SocialAccount {
    SocialAccount {
        id: row.get("id"),
        platform: row.get("platform"),
        handle: row.get("handle"),
        profile_url: row.get("profile_url"),
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn row_to_post_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<SocialPost> {
    let status: String = row.get("status");

    Ok(SocialPost {
        id: row.get("id"),
        account_id: row.get("account_id"),
        content: row.get("content"),
        media_url: row.get("media_url"),
        status: SocialPostStatus::from_str(&status)?,
        scheduled_at: row.get("scheduled_at"),
        published_at: row.get("published_at"),
        created_by: row.get("created_by"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_account_mysql(pool: &MySqlPool, account: &SocialAccount) -> Result<SocialAccount> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO social_accounts (platform, handle, profile_url, is_active, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&account.platform)
    .bind(&account.handle)
    .bind(&account.profile_url)
    .bind(account.is_active)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create social account")?;

    Ok(SocialAccount {
        id: result.last_insert_id() as i64,
        created_at: now,
        updated_at: now,
        ..account.clone()
    })
}

async fn get_account_mysql(pool: &MySqlPool, id: i64) -> Result<Option<SocialAccount>> {
    let sql = format!("SELECT {} FROM social_accounts WHERE id = ?", ACCOUNT_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get social account")?;
    Ok(row.map(|r| row_to_account_mysql(&r)))
}

async fn list_accounts_mysql(pool: &MySqlPool) -> Result<Vec<SocialAccount>> {
    let sql = format!("SELECT {} FROM social_accounts ORDER BY platform, handle", ACCOUNT_COLUMNS);
    let rows = sqlx::query(&sql)
        .fetch_all(pool)
        .await
        .context("Failed to list social accounts")?;
    Ok(rows.iter().map(row_to_account_mysql).collect())
}

async fn update_account_mysql(pool: &MySqlPool, account: &SocialAccount) -> Result<SocialAccount> {
    let now = Utc::now();
    sqlx::query(
        "UPDATE social_accounts SET platform = ?, handle = ?, profile_url = ?, is_active = ?, updated_at = ? \
         WHERE id = ?",
    )
    .bind(&account.platform)
    .bind(&account.handle)
    .bind(&account.profile_url)
    .bind(account.is_active)
    .bind(now)
    .bind(account.id)
    .execute(pool)
    .await
    .context("Failed to update social account")?;

    Ok(SocialAccount {
        updated_at: now,
        ..account.clone()
    })
}

async fn delete_account_mysql(pool: &MySqlPool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM social_accounts WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete social account")?;
    Ok(result.rows_affected() > 0)
}

async fn create_post_mysql(pool: &MySqlPool, post: &SocialPost) -> Result<SocialPost> {
    let now = Utc::now();
    let result = sqlx::query(
        r#"
        INSERT INTO social_posts
            (account_id, content, media_url, status, scheduled_at, published_at, created_by, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(post.account_id)
    .bind(&post.content)
    .bind(&post.media_url)
    .bind(post.status.as_str())
    .bind(post.scheduled_at)
    .bind(post.published_at)
    .bind(post.created_by)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create social post")?;

    Ok(SocialPost {
        id: result.last_insert_id() as i64,
        created_at: now,
        updated_at: now,
        ..post.clone()
    })
}

async fn get_post_mysql(pool: &MySqlPool, id: i64) -> Result<Option<SocialPost>> {
    let sql = format!("SELECT {} FROM social_posts WHERE id = ?", POST_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get social post")?;
    row.map(|r| row_to_post_mysql(&r)).transpose()
}

async fn list_posts_mysql(
    pool: &MySqlPool,
    status: Option<SocialPostStatus>,
    params: &ListParams,
) -> Result<(Vec<SocialPost>, i64)> {
    let status = status.map(|s| s.as_str());
    let sql = format!(
        "SELECT {} FROM social_posts WHERE (? IS NULL OR status = ?) \
         ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
        POST_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(status)
        .bind(status)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list social posts")?;
    let items = rows.iter().map(row_to_post_mysql).collect::<Result<Vec<_>>>()?;

    let total: i64 = sqlx::query("SELECT COUNT(*) AS count FROM social_posts WHERE (? IS NULL OR status = ?)")
        .bind(status)
        .bind(status)
        .fetch_one(pool)
        .await
        .context("Failed to count social posts")?
        .get("count");

    Ok((items, total))
}

async fn update_post_mysql(pool: &MySqlPool, post: &SocialPost) -> Result<SocialPost> {
    let now = Utc::now();
    sqlx::query(
        "UPDATE social_posts SET account_id = ?, content = ?, media_url = ?, status = ?, scheduled_at = ?, \
         published_at = ?, updated_at = ? WHERE id = ?",
    )
    .bind(post.account_id)
    .bind(&post.content)
    .bind(&post.media_url)
    .bind(post.status.as_str())
    .bind(post.scheduled_at)
    .bind(post.published_at)
    .bind(now)
    .bind(post.id)
    .execute(pool)
    .await
    .context("Failed to update social post")?;

    Ok(SocialPost {
        updated_at: now,
        ..post.clone()
    })
}

async fn delete_post_mysql(pool: &MySqlPool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM social_posts WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete social post")?;
    Ok(result.rows_affected() > 0)
}

async fn due_posts_mysql(pool: &MySqlPool, now: DateTime<Utc>) -> Result<Vec<SocialPost>> {
    let sql = format!(
        "SELECT {} FROM social_posts WHERE status = 'scheduled' AND scheduled_at IS NOT NULL \
         AND scheduled_at <= ? ORDER BY scheduled_at, id",
        POST_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(now)
        .fetch_all(pool)
        .await
        .context("Failed to list due social posts")?;
    rows.iter().map(row_to_post_mysql).collect()
}

async fn set_post_status_mysql(
    pool: &MySqlPool,
    id: i64,
    status: SocialPostStatus,
    published_at: Option<DateTime<Utc>>,
) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE social_posts SET status = ?, published_at = COALESCE(?, published_at), updated_at = ? WHERE id = ?",
    )
    .bind(status.as_str())
    .bind(published_at)
    .bind(Utc::now())
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update social post status")?;
    Ok(result.rows_affected() > 0)
}

fn row_to_account_mysql(row: &sqlx::mysql::MySqlRow) -> SocialAccount {
    SocialAccount {
        id: row.get("id"),
        platform: row.get("platform"),
        handle: row.get("handle"),
        profile_url: row.get("profile_url"),
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn row_to_post_mysql(row: &sqlx::mysql::MySqlRow) -> Result<SocialPost> {
    let status: String = row.get("status");

    Ok(SocialPost {
        id: row.get("id"),
        account_id: row.get("account_id"),
        content: row.get("content"),
        media_url: row.get("media_url"),
        status: SocialPostStatus::from_str(&status)?,
        scheduled_at: row.get("scheduled_at"),
        published_at: row.get("published_at"),
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

    async fn setup() -> (SqlxSocialRepository, SocialAccount) {
        let pool = create_test_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();
        let repo = SqlxSocialRepository::new(pool);
        let now = Utc::now();
        let account = repo
            .create_account(&SocialAccount {
                id: 0,
                platform: "twitter".to_string(),
                handle: "@office".to_string(),
                profile_url: None,
                is_active: true,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();
        (repo, account)
    }

    fn post(account_id: i64, status: SocialPostStatus, scheduled_at: Option<DateTime<Utc>>) -> SocialPost {
        let now = Utc::now();
        SocialPost {
            id: 0,
            account_id,
            content: "Town hall tonight".to_string(),
            media_url: None,
            status,
            scheduled_at,
            published_at: None,
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_due_posts_only_scheduled_and_past() {
        let (repo, account) = setup().await;
        let now = Utc::now();

        let due = repo
            .create_post(&post(account.id, SocialPostStatus::Scheduled, Some(now - Duration::minutes(5))))
            .await
            .unwrap();
        repo.create_post(&post(account.id, SocialPostStatus::Scheduled, Some(now + Duration::hours(1))))
            .await
            .unwrap();
        repo.create_post(&post(account.id, SocialPostStatus::Draft, Some(now - Duration::hours(1))))
            .await
            .unwrap();

        let posts = repo.list_due_posts(now).await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id, due.id);

        repo.set_post_status(due.id, SocialPostStatus::Published, Some(now))
            .await
            .unwrap();
        assert!(repo.list_due_posts(now).await.unwrap().is_empty());
        let published = repo.get_post(due.id).await.unwrap().unwrap();
        assert!(published.published_at.is_some());
    }

    #[tokio::test]
    async fn test_deleting_account_removes_posts() {
        let (repo, account) = setup().await;
        let p = repo
            .create_post(&post(account.id, SocialPostStatus::Draft, None))
            .await
            .unwrap();

        assert!(repo.delete_account(account.id).await.unwrap());
        assert!(repo.get_post(p.id).await.unwrap().is_none());
        assert!(repo.list_accounts().await.unwrap().is_empty());
    }
}
