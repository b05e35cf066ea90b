//! Contact message repository

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{ContactMessage, ListParams, MessageStatus};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

const MESSAGE_COLUMNS: &str =
    "id, name, email, phone, subject, message, constituency, status, created_at, updated_at";

#[async_trait]
pub trait ContactRepository: Send + Sync {
    async fn create(&self, message: &ContactMessage) -> Result<ContactMessage>;
    async fn get_by_id(&self, id: i64) -> Result<Option<ContactMessage>>;
    async fn list(&self, status: Option<MessageStatus>, params: &ListParams) -> Result<(Vec<ContactMessage>, i64)>;
    /// Returns false when no row matched
    async fn update_status(&self, id: i64, status: MessageStatus) -> Result<bool>;
    async fn delete(&self, id: i64) -> Result<bool>;
    async fn count(&self, status: Option<MessageStatus>) -> Result<i64>;
}

pub struct SqlxContactRepository {
    pool: DynDatabasePool,
}

impl SqlxContactRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ContactRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ContactRepository for SqlxContactRepository {
    async fn create(&self, message: &ContactMessage) -> Result<ContactMessage> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_message_sqlite(self.pool.sqlite()?, message).await,
            DatabaseDriver::Mysql => create_message_mysql(self.pool.mysql()?, message).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<ContactMessage>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_message_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => get_message_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn list(&self, status: Option<MessageStatus>, params: &ListParams) -> Result<(Vec<ContactMessage>, i64)> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_messages_sqlite(self.pool.sqlite()?, status, params).await,
            DatabaseDriver::Mysql => list_messages_mysql(self.pool.mysql()?, status, params).await,
        }
    }

    async fn update_status(&self, id: i64, status: MessageStatus) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => set_message_status_sqlite(self.pool.sqlite()?, id, status).await,
            DatabaseDriver::Mysql => set_message_status_mysql(self.pool.mysql()?, id, status).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_message_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => delete_message_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn count(&self, status: Option<MessageStatus>) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => count_messages_sqlite(self.pool.sqlite()?, status).await,
            DatabaseDriver::Mysql => count_messages_mysql(self.pool.mysql()?, status).await,
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_message_sqlite(pool: &SqlitePool, message: &ContactMessage) -> Result<ContactMessage> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO contact_messages
            (name, email, phone, subject, message, constituency, status, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&message.name)
    .bind(&message.email)
    .bind(&message.phone)
    .bind(&message.subject)
    .bind(&message.message)
    .bind(&message.constituency)
    .bind(message.status.as_str())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to store contact message")?;

    Ok(ContactMessage {
        id: result.last_insert_rowid(),
        created_at: now,
        updated_at: now,
        ..message.clone()
    })
}

async fn get_message_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<ContactMessage>> {
    let sql = format!("SELECT {} FROM contact_messages WHERE id = ?", MESSAGE_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get contact message")?;
    row.map(|r| row_to_message_sqlite(&r)).transpose()
}

async fn list_messages_sqlite(
    pool: &SqlitePool,
    status: Option<MessageStatus>,
    params: &ListParams,
) -> Result<(Vec<ContactMessage>, i64)> {
    let status_str = status.map(|s| s.as_str());
    let sql = format!(
        "SELECT {} FROM contact_messages WHERE (? IS NULL OR status = ?) \
         ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
        MESSAGE_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(status_str)
        .bind(status_str)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list contact messages")?;

    let items = rows
        .iter()
        .map(row_to_message_sqlite)
        .collect::<Result<Vec<_>>>()?;
    let total = count_messages_sqlite(pool, status).await?;
    Ok((items, total))
}

async fn set_message_status_sqlite(pool: &SqlitePool, id: i64, status: MessageStatus) -> Result<bool> {
    let result = sqlx::query("UPDATE contact_messages SET status = ?, updated_at = ? WHERE id = ?")
        .bind(status.as_str())
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update contact message")?;
    Ok(result.rows_affected() > 0)
}

async fn delete_message_sqlite(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM contact_messages WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete contact message")?;
    Ok(result.rows_affected() > 0)
}

async fn count_messages_sqlite(pool: &SqlitePool, status: Option<MessageStatus>) -> Result<i64> {
    let status = status.map(|s| s.as_str());
    let row = sqlx::query("SELECT COUNT(*) AS count FROM contact_messages WHERE (? IS NULL OR status = ?)")
        .bind(status)
        .bind(status)
        .fetch_one(pool)
        .await
        .context("Failed to count contact messages")?;
    Ok(row.get("count"))
}

fn row_to_message_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<ContactMessage> {
    let status: String = row.get("status");

    Ok(ContactMessage {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        phone: row.get("phone"),
        subject: row.get("subject"),
        message: row.get("message"),
        constituency: row.get("constituency"),
        status: MessageStatus::from_str(&status)?,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_message_mysql(pool: &MySqlPool, message: &ContactMessage) -> Result<ContactMessage> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO contact_messages
            (name, email, phone, subject, message, constituency, status, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&message.name)
    .bind(&message.email)
    .bind(&message.phone)
    .bind(&message.subject)
    .bind(&message.message)
    .bind(&message.constituency)
    .bind(message.status.as_str())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to store contact message")?;

    Ok(ContactMessage {
        id: result.last_insert_id() as i64,
        created_at: now,
        updated_at: now,
        ..message.clone()
    })
}

async fn get_message_mysql(pool: &MySqlPool, id: i64) -> Result<Option<ContactMessage>> {
    let sql = format!("SELECT {} FROM contact_messages WHERE id = ?", MESSAGE_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get contact message")?;
    row.map(|r| row_to_message_mysql(&r)).transpose()
}

async fn list_messages_mysql(
    pool: &MySqlPool,
    status: Option<MessageStatus>,
    params: &ListParams,
) -> Result<(Vec<ContactMessage>, i64)> {
    let status_str = status.map(|s| s.as_str());
    let sql = format!(
        "SELECT {} FROM contact_messages WHERE (? IS NULL OR status = ?) \
         ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
        MESSAGE_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(status_str)
        .bind(status_str)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list contact messages")?;

    let items = rows
        .iter()
        .map(row_to_message_mysql)
        .collect::<Result<Vec<_>>>()?;
    let total = count_messages_mysql(pool, status).await?;
    Ok((items, total))
}

async fn set_message_status_mysql(pool: &MySqlPool, id: i64, status: MessageStatus) -> Result<bool> {
    let result = sqlx::query("UPDATE contact_messages SET status = ?, updated_at = ? WHERE id = ?")
        .bind(status.as_str())
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update contact message")?;
    Ok(result.rows_affected() > 0)
}

async fn delete_message_mysql(pool: &MySqlPool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM contact_messages WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete contact message")?;
    Ok(result.rows_affected() > 0)
}

async fn count_messages_mysql(pool: &MySqlPool, status: Option<MessageStatus>) -> Result<i64> {
    let status = status.map(|s| s.as_str());
    let row = sqlx::query("SELECT COUNT(*) AS count FROM contact_messages WHERE (? IS NULL OR status = ?)")
        .bind(status)
        .bind(status)
        .fetch_one(pool)
        .await
        .context("Failed to count contact messages")?;
    Ok(row.get("count"))
}

fn row_to_message_mysql(row: &sqlx::mysql::MySqlRow) -> Result<ContactMessage> {
    let status: String = row.get("status");

    Ok(ContactMessage {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        phone: row.get("phone"),
        subject: row.get("subject"),
        message: row.get("message"),
        constituency: row.get("constituency"),
        status: MessageStatus::from_str(&status)?,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations::run_migrations};

    #[tokio::test]
    async fn test_message_lifecycle() {
        let pool = create_test_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();
        let repo = SqlxContactRepository::new(pool);

        let now = Utc::now();
        let created = repo
            .create(&ContactMessage {
                id: 0,
                name: "Resident".to_string(),
                email: "resident@example.org".to_string(),
                phone: None,
                subject: Some("Street lights".to_string()),
                message: "The lights on Main St are out.".to_string(),
                constituency: Some("North".to_string()),
                status: MessageStatus::New,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();

        assert_eq!(repo.count(Some(MessageStatus::New)).await.unwrap(), 1);
        assert!(repo.update_status(created.id, MessageStatus::Read).await.unwrap());
        assert_eq!(repo.count(Some(MessageStatus::New)).await.unwrap(), 0);

        let (read, _) = repo.list(Some(MessageStatus::Read), &ListParams::default()).await.unwrap();
        assert_eq!(read[0].subject.as_deref(), Some("Street lights"));

        assert!(repo.delete(created.id).await.unwrap());
        assert!(!repo.update_status(created.id, MessageStatus::Archived).await.unwrap());
    }
}
