//! Database backups
//!
//! A backup is one gzip-compressed JSON document holding every content
//! table, written to `backup.dir/backup-YYYYMMDD-HHMMSS.json.gz`. User
//! records are exported without their password hashes.

use crate::config::BackupConfig;
use crate::db::repositories::{
    ContactRepository, MediaRepository, NewsRepository, ReportRepository, ScheduleRepository,
    SeoRepository, SettingsRepository, SocialRepository, SpeechRepository, UserRepository,
};
use crate::models::{
    ContactMessage, ListParams, MediaFile, NewsArticle, Report, ScheduledPost, SeoKeyword, SeoPage,
    SocialAccount, SocialPost, Speech, User,
};
use anyhow::Context;
use chrono::{DateTime, Utc};
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::Serialize;
use std::collections::BTreeMap;
use std::future::Future;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs;

const BACKUP_PREFIX: &str = "backup-";
const BACKUP_SUFFIX: &str = ".json.gz";
const EXPORT_PAGE: u32 = 100;
const FORMAT_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    #[error("Invalid backup name: {0}")]
    InvalidName(String),

    #[error("Backup not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// A backup file on disk
#[derive(Debug, Clone, Serialize)]
pub struct BackupInfo {
    pub name: String,
    pub size: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct BackupDocument {
    format_version: u32,
    app_version: &'static str,
    created_at: DateTime<Utc>,
    users: Vec<User>,
    news: Vec<NewsArticle>,
    speeches: Vec<Speech>,
    reports: Vec<Report>,
    media: Vec<MediaFile>,
    messages: Vec<ContactMessage>,
    social_accounts: Vec<SocialAccount>,
    social_posts: Vec<SocialPost>,
    schedule: Vec<ScheduledPost>,
    seo_pages: Vec<SeoPage>,
    seo_keywords: Vec<SeoKeyword>,
    settings: BTreeMap<String, String>,
}

/// Repositories read by a backup
pub struct BackupSources {
    pub users: Arc<dyn UserRepository>,
    pub news: Arc<dyn NewsRepository>,
    pub speeches: Arc<dyn SpeechRepository>,
    pub reports: Arc<dyn ReportRepository>,
    pub media: Arc<dyn MediaRepository>,
    pub contact: Arc<dyn ContactRepository>,
    pub social: Arc<dyn SocialRepository>,
    pub schedule: Arc<dyn ScheduleRepository>,
    pub seo: Arc<dyn SeoRepository>,
    pub settings: Arc<dyn SettingsRepository>,
}

/// Whether `name` looks like a backup this service wrote
pub fn is_valid_backup_name(name: &str) -> bool {
    name.starts_with(BACKUP_PREFIX)
        && name.ends_with(BACKUP_SUFFIX)
        && name.len() > BACKUP_PREFIX.len() + BACKUP_SUFFIX.len()
        && !name.contains(['/', '\\'])
        && !name.contains("..")
}

/// Fetch every page of a paginated listing
async fn collect_all<T, F, Fut>(mut fetch: F) -> anyhow::Result<Vec<T>>
where
    F: FnMut(ListParams) -> Fut,
    Fut: Future<Output = anyhow::Result<(Vec<T>, i64)>>,
{
    let mut all = Vec::new();
    let mut page = 1;
    loop {
        let (items, total) = fetch(ListParams::new(page, EXPORT_PAGE)).await?;
        let done = items.is_empty() || all.len() + items.len() >= total.max(0) as usize;
        all.extend(items);
        if done {
            return Ok(all);
        }
        page += 1;
    }
}

pub struct BackupService {
    sources: BackupSources,
    dir: PathBuf,
}

impl BackupService {
    pub fn new(sources: BackupSources, config: &BackupConfig) -> Self {
        Self {
            sources,
            dir: config.dir.clone(),
        }
    }

    async fn snapshot(&self) -> anyhow::Result<BackupDocument> {
        let s = &self.sources;

        let users = collect_all(|p| {
            let repo = s.users.clone();
            async move { repo.list(&p).await }
        })
        .await
        .context("Failed to export users")?;
        let news = collect_all(|p| {
            let repo = s.news.clone();
            async move { repo.list(None, &p).await }
        })
        .await
        .context("Failed to export news")?;
        let speeches = collect_all(|p| {
            let repo = s.speeches.clone();
            async move { repo.list(None, &p).await }
        })
        .await
        .context("Failed to export speeches")?;
        let reports = collect_all(|p| {
            let repo = s.reports.clone();
            async move { repo.list(None, &p).await }
        })
        .await
        .context("Failed to export reports")?;
        let media = collect_all(|p| {
            let repo = s.media.clone();
            async move { repo.list(&[], &p).await }
        })
        .await
        .context("Failed to export media")?;
        let messages = collect_all(|p| {
            let repo = s.contact.clone();
            async move { repo.list(None, &p).await }
        })
        .await
        .context("Failed to export messages")?;
        let social_posts = collect_all(|p| {
            let repo = s.social.clone();
            async move { repo.list_posts(None, &p).await }
        })
        .await
        .context("Failed to export social posts")?;
        let schedule = collect_all(|p| {
            let repo = s.schedule.clone();
            async move { repo.list(None, &p).await }
        })
        .await
        .context("Failed to export schedule")?;
        let seo_pages = collect_all(|p| {
            let repo = s.seo.clone();
            async move { repo.list_pages(&p).await }
        })
        .await
        .context("Failed to export SEO pages")?;
        let seo_keywords = collect_all(|p| {
            let repo = s.seo.clone();
            async move { repo.list_keywords(&p).await }
        })
        .await
        .context("Failed to export SEO keywords")?;

        let social_accounts = s
            .social
            .list_accounts()
            .await
            .context("Failed to export social accounts")?;
        let settings = s
            .settings
            .get_all()
            .await
            .context("Failed to export settings")?
            .into_iter()
            .map(|setting| (setting.key, setting.value))
            .collect();

        Ok(BackupDocument {
            format_version: FORMAT_VERSION,
            app_version: env!("CARGO_PKG_VERSION"),
            created_at: Utc::now(),
            users,
            news,
            speeches,
            reports,
            media,
            messages,
            social_accounts,
            social_posts,
            schedule,
            seo_pages,
            seo_keywords,
            settings,
        })
    }

    /// Write a new backup and return its file info
    pub async fn create(&self) -> Result<BackupInfo, BackupError> {
        let document = self.snapshot().await?;

        let json = serde_json::to_vec(&document).context("Failed to serialize backup")?;
        let mut encoder = GzEncoder::new(Vec::with_capacity(json.len() / 4), Compression::default());
        encoder.write_all(&json).context("Failed to compress backup")?;
        let bytes = encoder.finish().context("Failed to compress backup")?;

        fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create backup dir {}", self.dir.display()))?;

        let stamp = document.created_at.format("%Y%m%d-%H%M%S").to_string();
        let mut name = format!("{}{}{}", BACKUP_PREFIX, stamp, BACKUP_SUFFIX);
        let mut n = 2;
        while fs::try_exists(self.dir.join(&name)).await.unwrap_or(false) {
            name = format!("{}{}-{}{}", BACKUP_PREFIX, stamp, n, BACKUP_SUFFIX);
            n += 1;
        }

        let path = self.dir.join(&name);
        fs::write(&path, &bytes)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        tracing::info!("Backup {} written ({} bytes)", name, bytes.len());
        Ok(BackupInfo {
            name,
            size: bytes.len() as u64,
            created_at: document.created_at,
        })
    }

    /// Backups on disk, newest first
    pub async fn list(&self) -> Result<Vec<BackupInfo>, BackupError> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(anyhow::Error::new(e).context("Failed to read backup dir").into()),
        };

        let mut backups = Vec::new();
        while let Some(entry) = entries.next_entry().await.context("Failed to read backup dir")? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !is_valid_backup_name(&name) {
                continue;
            }
            let meta = match entry.metadata().await {
                Ok(meta) if meta.is_file() => meta,
                _ => continue,
            };
            let created_at = meta
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());
            backups.push(BackupInfo {
                name,
                size: meta.len(),
                created_at,
            });
        }

        backups.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.name.cmp(&a.name)));
        Ok(backups)
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, BackupError> {
        if !is_valid_backup_name(name) {
            return Err(BackupError::InvalidName(name.to_string()));
        }
        Ok(self.dir.join(name))
    }

    /// Raw archive bytes
    pub async fn read(&self, name: &str) -> Result<Vec<u8>, BackupError> {
        let path = self.path_for(name)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(BackupError::NotFound(name.to_string()))
            }
            Err(e) => Err(anyhow::Error::new(e).context("Failed to read backup").into()),
        }
    }

    pub async fn delete(&self, name: &str) -> Result<(), BackupError> {
        let path = self.path_for(name)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!("Backup {} deleted", name);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(BackupError::NotFound(name.to_string()))
            }
            Err(e) => Err(anyhow::Error::new(e).context("Failed to delete backup").into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::*;
    use crate::db::{create_test_pool, migrations, DynDatabasePool};
    use crate::models::{ContentStatus, UserRole};
    use flate2::read::GzDecoder;
    use std::io::Read;
    use tempfile::TempDir;

    fn sources(pool: DynDatabasePool) -> BackupSources {
        BackupSources {
            users: SqlxUserRepository::boxed(pool.clone()),
            news: SqlxNewsRepository::boxed(pool.clone()),
            speeches: SqlxSpeechRepository::boxed(pool.clone()),
            reports: SqlxReportRepository::boxed(pool.clone()),
            media: SqlxMediaRepository::boxed(pool.clone()),
            contact: SqlxContactRepository::boxed(pool.clone()),
            social: SqlxSocialRepository::boxed(pool.clone()),
            schedule: SqlxScheduleRepository::boxed(pool.clone()),
            seo: SqlxSeoRepository::boxed(pool.clone()),
            settings: SqlxSettingsRepository::boxed(pool),
        }
    }

    async fn setup() -> (TempDir, DynDatabasePool, BackupService) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let dir = TempDir::new().expect("Failed to create temp dir");
        let config = BackupConfig {
            dir: dir.path().to_path_buf(),
        };
        let service = BackupService::new(sources(pool.clone()), &config);
        (dir, pool, service)
    }

    #[test]
    fn test_backup_names() {
        assert!(is_valid_backup_name("backup-20250101-120000.json.gz"));
        assert!(!is_valid_backup_name("backup-.json.gz"));
        assert!(!is_valid_backup_name("../backup-1.json.gz"));
        assert!(!is_valid_backup_name("backup-1/../x.json.gz"));
        assert!(!is_valid_backup_name("notes.txt"));
    }

    #[tokio::test]
    async fn test_create_list_read_delete() {
        let (_dir, pool, service) = setup().await;

        let users = SqlxUserRepository::new(pool.clone());
        users
            .create(&User::new(
                "admin@example.org".to_string(),
                "Admin".to_string(),
                "$argon2id$secret-hash".to_string(),
                UserRole::SuperAdmin,
            ))
            .await
            .unwrap();
        let news = SqlxNewsRepository::new(pool.clone());
        let now = Utc::now();
        for i in 0..3 {
            news.create(&NewsArticle {
                id: 0,
                slug: format!("item-{}", i),
                title: format!("Item {}", i),
                excerpt: None,
                content: String::new(),
                content_html: String::new(),
                category: None,
                featured_image: None,
                status: ContentStatus::Draft,
                author_id: None,
                published_at: None,
                view_count: 0,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();
        }

        let info = service.create().await.unwrap();
        assert!(is_valid_backup_name(&info.name));

        let listed = service.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, info.name);

        let bytes = service.read(&info.name).await.unwrap();
        let mut json = String::new();
        GzDecoder::new(bytes.as_slice()).read_to_string(&mut json).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(doc["news"].as_array().unwrap().len(), 3);
        assert_eq!(doc["users"][0]["email"], "admin@example.org");
        assert!(!json.contains("secret-hash"));
        assert_eq!(doc["settings"]["site_name"], "Podium");

        service.delete(&info.name).await.unwrap();
        assert!(service.list().await.unwrap().is_empty());
        assert!(matches!(
            service.delete(&info.name).await,
            Err(BackupError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_same_second_backups_do_not_overwrite() {
        let (_dir, _pool, service) = setup().await;
        let a = service.create().await.unwrap();
        let b = service.create().await.unwrap();
        assert_ne!(a.name, b.name);
        assert_eq!(service.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_rejects_path_traversal() {
        let (_dir, _pool, service) = setup().await;
        assert!(matches!(
            service.read("../config.yml").await,
            Err(BackupError::InvalidName(_))
        ));
    }

    #[tokio::test]
    async fn test_collect_all_pages() {
        let items: Vec<u32> = (0..250).collect();
        let all = collect_all(|p| {
            let items = items.clone();
            async move {
                let start = p.offset() as usize;
                let end = (start + p.limit() as usize).min(items.len());
                Ok((items[start.min(end)..end].to_vec(), items.len() as i64))
            }
        })
        .await
        .unwrap();
        assert_eq!(all.len(), 250);
    }
}
