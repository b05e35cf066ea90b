//! SEO page metadata and keyword repository

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{ListParams, SeoKeyword, SeoPage};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

const PAGE_COLUMNS: &str = "id, path, title, meta_description, keywords, og_image, canonical_url, no_index, \
     score, created_at, updated_at";
const KEYWORD_COLUMNS: &str =
    "id, keyword, target_path, search_volume, current_position, tracked, created_at, updated_at";

#[async_trait]
pub trait SeoRepository: Send + Sync {
    async fn create_page(&self, page: &SeoPage) -> Result<SeoPage>;
    async fn get_page(&self, id: i64) -> Result<Option<SeoPage>>;
    async fn get_page_by_path(&self, path: &str) -> Result<Option<SeoPage>>;
    /// Ordered by path
    async fn list_pages(&self, params: &ListParams) -> Result<(Vec<SeoPage>, i64)>;
    /// Every page, lowest score first
    async fn all_pages_by_score(&self) -> Result<Vec<SeoPage>>;
    async fn update_page(&self, page: &SeoPage) -> Result<SeoPage>;
    async fn delete_page(&self, id: i64) -> Result<bool>;
    async fn path_exists(&self, path: &str, exclude_id: Option<i64>) -> Result<bool>;

    async fn create_keyword(&self, keyword: &SeoKeyword) -> Result<SeoKeyword>;
    async fn get_keyword(&self, id: i64) -> Result<Option<SeoKeyword>>;
    async fn list_keywords(&self, params: &ListParams) -> Result<(Vec<SeoKeyword>, i64)>;
    async fn update_keyword(&self, keyword: &SeoKeyword) -> Result<SeoKeyword>;
    async fn delete_keyword(&self, id: i64) -> Result<bool>;
    async fn keyword_exists(&self, keyword: &str, exclude_id: Option<i64>) -> Result<bool>;
}

pub struct SqlxSeoRepository {
    pool: DynDatabasePool,
}

impl SqlxSeoRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SeoRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl SeoRepository for SqlxSeoRepository {
    async fn create_page(&self, page: &SeoPage) -> Result<SeoPage> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_page_sqlite(self.pool.sqlite()?, page).await,
            DatabaseDriver::Mysql => create_page_mysql(self.pool.mysql()?, page).await,
        }
    }

    async fn get_page(&self, id: i64) -> Result<Option<SeoPage>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_page_by_id_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => get_page_by_id_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn get_page_by_path(&self, path: &str) -> Result<Option<SeoPage>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_page_by_path_sqlite(self.pool.sqlite()?, path).await,
            DatabaseDriver::Mysql => get_page_by_path_mysql(self.pool.mysql()?, path).await,
        }
    }

    async fn list_pages(&self, params: &ListParams) -> Result<(Vec<SeoPage>, i64)> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_pages_sqlite(self.pool.sqlite()?, params).await,
            DatabaseDriver::Mysql => list_pages_mysql(self.pool.mysql()?, params).await,
        }
    }

    async fn all_pages_by_score(&self) -> Result<Vec<SeoPage>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => pages_by_score_sqlite(self.pool.sqlite()?).await,
            DatabaseDriver::Mysql => pages_by_score_mysql(self.pool.mysql()?).await,
        }
    }

    async fn update_page(&self, page: &SeoPage) -> Result<SeoPage> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_page_sqlite(self.pool.sqlite()?, page).await,
            DatabaseDriver::Mysql => update_page_mysql(self.pool.mysql()?, page).await,
        }
    }

    async fn delete_page(&self, id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_page_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => delete_page_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn path_exists(&self, path: &str, exclude_id: Option<i64>) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => path_exists_sqlite(self.pool.sqlite()?, path, exclude_id).await,
            DatabaseDriver::Mysql => path_exists_mysql(self.pool.mysql()?, path, exclude_id).await,
        }
    }

    async fn create_keyword(&self, keyword: &SeoKeyword) -> Result<SeoKeyword> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_keyword_sqlite(self.pool.sqlite()?, keyword).await,
            DatabaseDriver::Mysql => create_keyword_mysql(self.pool.mysql()?, keyword).await,
        }
    }

    async fn get_keyword(&self, id: i64) -> Result<Option<SeoKeyword>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_keyword_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => get_keyword_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn list_keywords(&self, params: &ListParams) -> Result<(Vec<SeoKeyword>, i64)> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_keywords_sqlite(self.pool.sqlite()?, params).await,
            DatabaseDriver::Mysql => list_keywords_mysql(self.pool.mysql()?, params).await,
        }
    }

    async fn update_keyword(&self, keyword: &SeoKeyword) -> Result<SeoKeyword> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_keyword_sqlite(self.pool.sqlite()?, keyword).await,
            DatabaseDriver::Mysql => update_keyword_mysql(self.pool.mysql()?, keyword).await,
        }
    }

    async fn delete_keyword(&self, id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_keyword_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => delete_keyword_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn keyword_exists(&self, keyword: &str, exclude_id: Option<i64>) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => keyword_exists_sqlite(self.pool.sqlite()?, keyword, exclude_id).await,
            DatabaseDriver::Mysql => keyword_exists_mysql(self.pool.mysql()?, keyword, exclude_id).await,
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_page_sqlite(pool: &SqlitePool, page: &SeoPage) -> Result<SeoPage> {
    let now = Utc::now();
    let result = sqlx::query(
        r#"
        INSERT INTO seo_pages
            (path, title, meta_description, keywords, og_image, canonical_url, no_index, score, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&page.path)
    .bind(&page.title)
    .bind(&page.meta_description)
    .bind(&page.keywords)
    .bind(&page.og_image)
    .bind(&page.canonical_url)
    .bind(page.no_index)
    .bind(page.score)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create SEO page")?;

    Ok(SeoPage {
        id: result.last_insert_rowid(),
        created_at: now,
        updated_at: now,
        ..page.clone()
    })
}

async fn get_page_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<SeoPage>> {
    let sql = format!("SELECT {} FROM seo_pages WHERE id = ?", PAGE_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get SEO page")?;
    Ok(row.map(|r| row_to_page_sqlite(&r)))
}

async fn get_page_by_path_sqlite(pool: &SqlitePool, path: &str) -> Result<Option<SeoPage>> {
    let sql = format!("SELECT {} FROM seo_pages WHERE path = ?", PAGE_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(path)
        .fetch_optional(pool)
        .await
        .context("Failed to get SEO page by path")?;
    Ok(row.map(|r| row_to_page_sqlite(&r)))
}

async fn list_pages_sqlite(pool: &SqlitePool, params: &ListParams) -> Result<(Vec<SeoPage>, i64)> {
    let sql = format!("SELECT {} FROM seo_pages ORDER BY path LIMIT ? OFFSET ?", PAGE_COLUMNS);
    let rows = sqlx::query(&sql)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list SEO pages")?;
    let total: i64 = sqlx::query("SELECT COUNT(*) AS count FROM seo_pages")
        .fetch_one(pool)
        .await
        .context("Failed to count SEO pages")?
        .get("count");
    Ok((rows.iter().map(row_to_page_sqlite).collect(), total))
}

async fn pages_by_score_sqlite(pool: &SqlitePool) -> Result<Vec<SeoPage>> {
    let sql = format!("SELECT {} FROM seo_pages ORDER BY score ASC, path ASC", PAGE_COLUMNS);
    let rows = sqlx::query(&sql)
        .fetch_all(pool)
        .await
        .context("Failed to load SEO pages")?;
    Ok(rows.iter().map(row_to_page_sqlite).collect())
}

async fn update_page_sqlite(pool: &SqlitePool, page: &SeoPage) -> Result<SeoPage> {
    let now = Utc::now();
    sqlx::query(
        r#"
        UPDATE seo_pages SET path = ?, title = ?, meta_description = ?, keywords = ?, og_image = ?,
            canonical_url = ?, no_index = ?, score = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&page.path)
    .bind(&page.title)
    .bind(&page.meta_description)
    .bind(&page.keywords)
    .bind(&page.og_image)
    .bind(&page.canonical_url)
    .bind(page.no_index)
    .bind(page.score)
    .bind(now)
    .bind(page.id)
    .execute(pool)
    .await
    .context("Failed to update SEO page")?;

    Ok(SeoPage {
        updated_at: now,
        ..page.clone()
    })
}

async fn delete_page_sqlite(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM seo_pages WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete SEO page")?;
    Ok(result.rows_affected() > 0)
}

async fn path_exists_sqlite(pool: &SqlitePool, path: &str, exclude_id: Option<i64>) -> Result<bool> {
    let row = sqlx::query("SELECT COUNT(*) AS count FROM seo_pages WHERE path = ? AND (? IS NULL OR id <> ?)")
        .bind(path)
        .bind(exclude_id)
        .bind(exclude_id)
        .fetch_one(pool)
        .await
        .context("Failed to check SEO path")?;
    let count: i64 = row.get("count");
    Ok(count > 0)
}

async fn create_keyword_sqlite(pool: &SqlitePool, keyword: &SeoKeyword) -> Result<SeoKeyword> {
    let now = Utc::now();
    let result = sqlx::query(
        r#"
        INSERT INTO seo_keywords
            (keyword, target_path, search_volume, current_position, tracked, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&keyword.keyword)
    .bind(&keyword.target_path)
    .bind(keyword.search_volume)
    .bind(keyword.current_position)
    .bind(keyword.tracked)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create SEO keyword")?;

    Ok(SeoKeyword {
        id: result.last_insert_rowid(),
        created_at: now,
        updated_at: now,
        ..keyword.clone()
    })
}

async fn get_keyword_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<SeoKeyword>> {
    let sql = format!("SELECT {} FROM seo_keywords WHERE id = ?", KEYWORD_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get SEO keyword")?;
    Ok(row.map(|r| row_to_keyword_sqlite(&r)))
}

async fn list_keywords_sqlite(pool: &SqlitePool, params: &ListParams) -> Result<(Vec<SeoKeyword>, i64)> {
    let sql = format!(
        "SELECT {} FROM seo_keywords ORDER BY keyword LIMIT ? OFFSET ?",
        KEYWORD_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list SEO keywords")?;
    let total: i64 = sqlx::query("SELECT COUNT(*) AS count FROM seo_keywords")
        .fetch_one(pool)
        .await
        .context("Failed to count SEO keywords")?
        .get("count");
    Ok((rows.iter().map(row_to_keyword_sqlite).collect(), total))
}

async fn update_keyword_sqlite(pool: &SqlitePool, keyword: &SeoKeyword) -> Result<SeoKeyword> {
    let now = Utc::now();
    sqlx::query(
        "UPDATE seo_keywords SET keyword = ?, target_path = ?, search_volume = ?, current_position = ?, \
         tracked = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&keyword.keyword)
    .bind(&keyword.target_path)
    .bind(keyword.search_volume)
    .bind(keyword.current_position)
    .bind(keyword.tracked)
    .bind(now)
    .bind(keyword.id)
    .execute(pool)
    .await
    .context("Failed to update SEO keyword")?;

    Ok(SeoKeyword {
        updated_at: now,
        ..keyword.clone()
    })
}

async fn delete_keyword_sqlite(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM seo_keywords WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete SEO keyword")?;
    Ok(result.rows_affected() > 0)
}

async fn keyword_exists_sqlite(pool: &SqlitePool, keyword: &str, exclude_id: Option<i64>) -> Result<bool> {
    let row = sqlx::query(
        "SELECT COUNT(*) AS count FROM seo_keywords WHERE keyword = ? AND (? IS NULL OR id <> ?)",
    )
    .bind(keyword)
    .bind(exclude_id)
    .bind(exclude_id)
    .fetch_one(pool)
    .await
    .context("Failed to check SEO keyword")?;
    let count: i64 = row.get("count");
    Ok(count > 0)
}

fn row_to_page_sqlite(row: &sqlx::sqlite::SqliteRow) -> SeoPage {
    SeoPage {
        id: row.get("id"),
        path: row.get("path"),
        title: row.get("title"),
        meta_description: row.get("meta_description"),
        keywords: row.get("keywords"),
        og_image: row.get("og_image"),
        canonical_url: row.get("canonical_url"),
        no_index: row.get("no_index"),
        score: row.get("score"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn row_to_keyword_sqlite(row: &sqlx::sqlite::SqliteRow) -> SeoKeyword {
    SeoKeyword {
        id: row.get("id"),
        keyword: row.get("keyword"),
        target_path: row.get("target_path"),
        search_volume: row.get("search_volume"),
        current_position: row.get("current_position"),
        tracked: row.get("tracked"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_page_mysql(pool: &MySqlPool, page: &SeoPage) -> Result<SeoPage> {
    let now = Utc::now();
    let result = sqlx::query(
        r#"
        INSERT INTO seo_pages
            (path, title, meta_description, keywords, og_image, canonical_url, no_index, score, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&page.path)
    .bind(&page.title)
    .bind(&page.meta_description)
    .bind(&page.keywords)
    .bind(&page.og_image)
    .bind(&page.canonical_url)
    .bind(page.no_index)
    .bind(page.score)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create SEO page")?;

    Ok(SeoPage {
        id: result.last_insert_id() as i64,
        created_at: now,
        updated_at: now,
        ..page.clone()
    })
}

async fn get_page_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<SeoPage>> {
    let sql = format!("SELECT {} FROM seo_pages WHERE id = ?", PAGE_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get SEO page")?;
    Ok(row.map(|r| row_to_page_mysql(&r)))
}

async fn get_page_by_path_mysql(pool: &MySqlPool, path: &str) -> Result<Option<SeoPage>> {
    let sql = format!("SELECT {} FROM seo_pages WHERE path = ?", PAGE_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(path)
        .fetch_optional(pool)
        .await
        .context("Failed to get SEO page by path")?;
    Ok(row.map(|r| row_to_page_mysql(&r)))
}

async fn list_pages_mysql(pool: &MySqlPool, params: &ListParams) -> Result<(Vec<SeoPage>, i64)> {
    let sql = format!("SELECT {} FROM seo_pages ORDER BY path LIMIT ? OFFSET ?", PAGE_COLUMNS);
    let rows = sqlx::query(&sql)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list SEO pages")?;
    let total: i64 = sqlx::query("SELECT COUNT(*) AS count FROM seo_pages")
        .fetch_one(pool)
        .await
        .context("Failed to count SEO pages")?
        .get("count");
    Ok((rows.iter().map(row_to_page_mysql).collect(), total))
}

async fn pages_by_score_mysql(pool: &MySqlPool) -> Result<Vec<SeoPage>> {
    let sql = format!("SELECT {} FROM seo_pages ORDER BY score ASC, path ASC", PAGE_COLUMNS);
    let rows = sqlx::query(&sql)
        .fetch_all(pool)
        .await
        .context("Failed to load SEO pages")?;
    Ok(rows.iter().map(row_to_page_mysql).collect())
}

async fn update_page_mysql(pool: &MySqlPool, page: &SeoPage) -> Result<SeoPage> {
    let now = Utc::now();
    sqlx::query(
        r#"
        UPDATE seo_pages SET path = ?, title = ?, meta_description = ?, keywords = ?, og_image = ?,
            canonical_url = ?, no_index = ?, score = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&page.path)
    .bind(&page.title)
    .bind(&page.meta_description)
    .bind(&page.keywords)
    .bind(&page.og_image)
    .bind(&page.canonical_url)
    .bind(page.no_index)
    .bind(page.score)
    .bind(now)
    .bind(page.id)
    .execute(pool)
    .await
    .context("Failed to update SEO page")?;

    Ok(SeoPage {
        updated_at: now,
        ..page.clone()
    })
}

async fn delete_page_mysql(pool: &MySqlPool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM seo_pages WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete SEO page")?;
    Ok(result.rows_affected() > 0)
}

async fn path_exists_mysql(pool: &MySqlPool, path: &str, exclude_id: Option<i64>) -> Result<bool> {
    let row = sqlx::query("SELECT COUNT(*) AS count FROM seo_pages WHERE path = ? AND (? IS NULL OR id <> ?)")
        .bind(path)
        .bind(exclude_id)
        .bind(exclude_id)
        .fetch_one(pool)
        .await
        .context("Failed to check SEO path")?;
    let count: i64 = row.get("count");
    Ok(count > 0)
}

async fn create_keyword_mysql(pool: &MySqlPool, keyword: &SeoKeyword) -> Result<SeoKeyword> {
    let now = Utc::now();
    let result = sqlx::query(
        r#"
        INSERT INTO seo_keywords
            (keyword, target_path, search_volume, current_position, tracked, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&keyword.keyword)
    .bind(&keyword.target_path)
    .bind(keyword.search_volume)
    .bind(keyword.current_position)
    .bind(keyword.tracked)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create SEO keyword")?;

    Ok(SeoKeyword {
        id: result.last_insert_id() as i64,
        created_at: now,
        updated_at: now,
        ..keyword.clone()
    })
}

async fn get_keyword_mysql(pool: &MySqlPool, id: i64) -> Result<Option<SeoKeyword>> {
    let sql = format!("SELECT {} FROM seo_keywords WHERE id = ?", KEYWORD_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get SEO keyword")?;
    Ok(row.map(|r| row_to_keyword_mysql(&r)))
}

async fn list_keywords_mysql(pool: &MySqlPool, params: &ListParams) -> Result<(Vec<SeoKeyword>, i64)> {
    let sql = format!(
        "SELECT {} FROM seo_keywords ORDER BY keyword LIMIT ? OFFSET ?",
        KEYWORD_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list SEO keywords")?;
    let total: i64 = sqlx::query("SELECT COUNT(*) AS count FROM seo_keywords")
        .fetch_one(pool)
        .await
        .context("Failed to count SEO keywords")?
        .get("count");
    Ok((rows.iter().map(row_to_keyword_mysql).collect(), total))
}

async fn update_keyword_mysql(pool: &MySqlPool, keyword: &SeoKeyword) -> Result<SeoKeyword> {
    let now = Utc::now();
    sqlx::query(
        "UPDATE seo_keywords SET keyword = ?, target_path = ?, search_volume = ?, current_position = ?, \
         tracked = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&keyword.keyword)
    .bind(&keyword.target_path)
    .bind(keyword.search_volume)
    .bind(keyword.current_position)
    .bind(keyword.tracked)
    .bind(now)
    .bind(keyword.id)
    .execute(pool)
    .await
    .context("Failed to update SEO keyword")?;

    Ok(SeoKeyword {
        updated_at: now,
        ..keyword.clone()
    })
}

async fn delete_keyword_mysql(pool: &MySqlPool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM seo_keywords WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete SEO keyword")?;
    Ok(result.rows_affected() > 0)
}

async fn keyword_exists_mysql(pool: &MySqlPool, keyword: &str, exclude_id: Option<i64>) -> Result<bool> {
    let row = sqlx::query(
        "SELECT COUNT(*) AS count FROM seo_keywords WHERE keyword = ? AND (? IS NULL OR id <> ?)",
    )
    .bind(keyword)
    .bind(exclude_id)
    .bind(exclude_id)
    .fetch_one(pool)
    .await
    .context("Failed to check SEO keyword")?;
    let count: i64 = row.get("count");
    Ok(count > 0)
}

fn row_to_page_mysql(row: &sqlx::mysql::MySqlRow) -> SeoPage {
    SeoPage {
        id: row.get("id"),
        path: row.get("path"),
        title: row.get("title"),
        meta_description: row.get("meta_description"),
        keywords: row.get("keywords"),
        og_image: row.get("og_image"),
        canonical_url: row.get("canonical_url"),
        no_index: row.get("no_index"),
        score: row.get("score"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn row_to_keyword_mysql(row: &sqlx::mysql::MySqlRow) -> SeoKeyword {
    SeoKeyword {
        id: row.get("id"),
        keyword: row.get("keyword"),
        target_path: row.get("target_path"),
        search_volume: row.get("search_volume"),
        current_position: row.get("current_position"),
        tracked: row.get("tracked"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
