//! Database layer
//!
//! Podium stores everything in one relational database:
//! - SQLite (default, single-file deployment)
//! - MySQL (for hosted deployments)
//!
//! The `DatabasePool` trait hides the backend. Repositories match on
//! `pool.driver()` and run the dialect-specific query.
//!
//! ```ignore
//! let pool = create_pool(&config.database).await?;
//! migrations::run_migrations(&pool).await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, DatabasePool, DynDatabasePool, MysqlDatabase, SqliteDatabase,
};

/// Whether `err` was caused by a UNIQUE constraint rejecting a write.
///
/// Services check uniqueness before inserting; this catches the writer that
/// lost a race between that check and the insert.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<sqlx::Error>(),
            Some(sqlx::Error::Database(db)) if db.is_unique_violation()
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[tokio::test]
    async fn test_is_unique_violation() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        pool.execute("CREATE TABLE tags (name TEXT NOT NULL UNIQUE, weight INTEGER NOT NULL)")
            .await
            .unwrap();
        pool.execute("INSERT INTO tags (name, weight) VALUES ('roads', 1)")
            .await
            .unwrap();

        let sqlite = pool.sqlite().unwrap();
        let duplicate = sqlx::query("INSERT INTO tags (name, weight) VALUES ('roads', 2)")
            .execute(sqlite)
            .await
            .context("Failed to insert tag")
            .unwrap_err();
        assert!(is_unique_violation(&duplicate));

        let not_null = sqlx::query("INSERT INTO tags (name) VALUES ('parks')")
            .execute(sqlite)
            .await
            .context("Failed to insert tag")
            .unwrap_err();
        assert!(!is_unique_violation(&not_null));
        assert!(!is_unique_violation(&anyhow::anyhow!("unrelated")));
    }
}
