//! System settings repository
//!
//! Key/value rows in `system_settings`. Typed access lives in
//! `services::settings`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;

#[derive(Debug, Clone)]
pub struct Setting {
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

#[async_trait]
pub trait SettingsRepository: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Setting>>;

    async fn get_all(&self) -> Result<Vec<Setting>>;

    /// Insert or replace a single setting
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    async fn set_many(&self, settings: &HashMap<String, String>) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<bool>;
}

pub struct SqlxSettingsRepository {
    pool: DynDatabasePool,
}

impl SqlxSettingsRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SettingsRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl SettingsRepository for SqlxSettingsRepository {
    async fn get(&self, key: &str) -> Result<Option<Setting>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_setting_sqlite(self.pool.sqlite()?, key).await,
            DatabaseDriver::Mysql => get_setting_mysql(self.pool.mysql()?, key).await,
        }
    }

    async fn get_all(&self) -> Result<Vec<Setting>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => all_settings_sqlite(self.pool.sqlite()?).await,
            DatabaseDriver::Mysql => all_settings_mysql(self.pool.mysql()?).await,
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => set_setting_sqlite(self.pool.sqlite()?, key, value).await,
            DatabaseDriver::Mysql => set_setting_mysql(self.pool.mysql()?, key, value).await,
        }
    }

    async fn set_many(&self, settings: &HashMap<String, String>) -> Result<()> {
        for (key, value) in settings {
            self.set(key, value).await?;
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_setting_sqlite(self.pool.sqlite()?, key).await,
            DatabaseDriver::Mysql => delete_setting_mysql(self.pool.mysql()?, key).await,
        }
    }
}

// SQLite implementations
async fn get_setting_sqlite(pool: &SqlitePool, key: &str) -> Result<Option<Setting>> {
    let row = sqlx::query("SELECT setting_key, value, updated_at FROM system_settings WHERE setting_key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await
        .context("Failed to read setting")?;

    Ok(row.map(|r| Setting {
        key: r.get("setting_key"),
        value: r.get("value"),
        updated_at: r.get("updated_at"),
    }))
}

async fn all_settings_sqlite(pool: &SqlitePool) -> Result<Vec<Setting>> {
    let rows = sqlx::query("SELECT setting_key, value, updated_at FROM system_settings ORDER BY setting_key")
        .fetch_all(pool)
        .await
        .context("Failed to read settings")?;

    Ok(rows
        .into_iter()
        .map(|r| Setting {
            key: r.get("setting_key"),
            value: r.get("value"),
            updated_at: r.get("updated_at"),
        })
        .collect())
}

async fn set_setting_sqlite(pool: &SqlitePool, key: &str, value: &str) -> Result<()> {
    sqlx::query(
        "INSERT INTO system_settings (setting_key, value, updated_at) VALUES (?, ?, ?)
         ON CONFLICT(setting_key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
    )
    .bind(key)
    .bind(value)
    .bind(Utc::now())
    .execute(pool)
    .await
    .with_context(|| format!("Failed to store setting {}", key))?;
    Ok(())
}

async fn delete_setting_sqlite(pool: &SqlitePool, key: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM system_settings WHERE setting_key = ?")
        .bind(key)
        .execute(pool)
        .await
        .context("Failed to delete setting")?;
    Ok(result.rows_affected() > 0)
}

// MySQL implementations
async fn get_setting_mysql(pool: &MySqlPool, key: &str) -> Result<Option<Setting>> {
    let row = sqlx::query("SELECT setting_key, value, updated_at FROM system_settings WHERE setting_key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await
        .context("Failed to read setting")?;

    Ok(row.map(|r| Setting {
        key: r.get("setting_key"),
        value: r.get("value"),
        updated_at: r.get("updated_at"),
    }))
}

async fn all_settings_mysql(pool: &MySqlPool) -> Result<Vec<Setting>> {
    let rows = sqlx::query("SELECT setting_key, value, updated_at FROM system_settings ORDER BY setting_key")
        .fetch_all(pool)
        .await
        .context("Failed to read settings")?;

    Ok(rows
        .into_iter()
        .map(|r| Setting {
            key: r.get("setting_key"),
            value: r.get("value"),
            updated_at: r.get("updated_at"),
        })
        .collect())
}

async fn set_setting_mysql(pool: &MySqlPool, key: &str, value: &str) -> Result<()> {
    sqlx::query(
        "INSERT INTO system_settings (setting_key, value, updated_at) VALUES (?, ?, ?)
         ON DUPLICATE KEY UPDATE value = VALUES(value), updated_at = VALUES(updated_at)",
    )
    .bind(key)
    .bind(value)
    .bind(Utc::now())
    .execute(pool)
    .await
    .with_context(|| format!("Failed to store setting {}", key))?;
    Ok(())
}

async fn delete_setting_mysql(pool: &MySqlPool, key: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM system_settings WHERE setting_key = ?")
        .bind(key)
        .execute(pool)
        .await
        .context("Failed to delete setting")?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations::run_migrations};

    #[tokio::test]
    async fn test_set_overwrites_existing_value() {
        let pool = create_test_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();
        let repo = SqlxSettingsRepository::new(pool);

        assert_eq!(repo.get("site_name").await.unwrap().unwrap().value, "Podium");
        repo.set("site_name", "Office of the Member").await.unwrap();
        assert_eq!(
            repo.get("site_name").await.unwrap().unwrap().value,
            "Office of the Member"
        );

        let mut batch = HashMap::new();
        batch.insert("contact_email".to_string(), "office@example.org".to_string());
        batch.insert("items_per_page".to_string(), "20".to_string());
        repo.set_many(&batch).await.unwrap();

        let all = repo.get_all().await.unwrap();
        assert_eq!(all.len(), 4);
        assert!(all.windows(2).all(|w| w[0].key <= w[1].key));

        assert!(repo.delete("contact_email").await.unwrap());
        assert!(repo.get("contact_email").await.unwrap().is_none());
    }
}
