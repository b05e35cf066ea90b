//! Media library service
//!
//! Stores uploaded files under the configured upload directory with a UUID
//! file name and keeps one `media_files` row per file.

use crate::cache::{self, SharedCache};
use crate::config::UploadConfig;
use crate::db::repositories::MediaRepository;
use crate::models::{ListParams, MediaFile, MediaType, PagedResult, UpdateMediaInput};
use anyhow::Context;
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("Media file not found")]
    NotFound,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// A file received from a multipart upload
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub original_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Media types shown in the public gallery
pub const GALLERY_TYPES: [MediaType; 2] = [MediaType::Image, MediaType::Video];

pub struct MediaService {
    repo: Arc<dyn MediaRepository>,
    config: Arc<UploadConfig>,
    cache: SharedCache,
}

impl MediaService {
    pub fn new(repo: Arc<dyn MediaRepository>, config: Arc<UploadConfig>, cache: SharedCache) -> Self {
        Self { repo, config, cache }
    }

    /// Validate, write to disk and record an upload
    pub async fn upload(
        &self,
        file: UploadedFile,
        alt_text: Option<String>,
        caption: Option<String>,
        uploaded_by: Option<i64>,
    ) -> Result<MediaFile, MediaError> {
        let mime = file.content_type.to_ascii_lowercase();
        if !self.config.is_type_allowed(&mime) {
            return Err(MediaError::ValidationError(format!(
                "File type {} is not allowed",
                file.content_type
            )));
        }
        if file.data.is_empty() {
            return Err(MediaError::ValidationError("File is empty".to_string()));
        }
        if file.data.len() as u64 > self.config.max_file_size {
            return Err(MediaError::ValidationError(format!(
                "File too large. Maximum size: {} MB",
                self.config.max_file_size / 1024 / 1024
            )));
        }

        fs::create_dir_all(&self.config.path)
            .await
            .with_context(|| format!("Failed to create upload dir {}", self.config.path.display()))?;

        // The client's filename never picks the extension the file is served with
        let ext = self.config.get_extension(&mime);
        let filename = format!("{}.{}", Uuid::new_v4(), ext);
        let path = self.config.path.join(&filename);
        fs::write(&path, &file.data)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        let now = Utc::now();
        let record = MediaFile {
            id: 0,
            url: format!("{}/{}", self.config.public_prefix.trim_end_matches('/'), filename),
            filename,
            original_name: file.original_name,
            media_type: MediaType::from_mime(&mime),
            mime_type: mime,
            size: file.data.len() as i64,
            alt_text: non_blank(alt_text),
            caption: non_blank(caption),
            uploaded_by,
            created_at: now,
            updated_at: now,
        };

        let created = match self.repo.create(&record).await {
            Ok(created) => created,
            Err(e) => {
                remove_file(&path).await;
                return Err(e.into());
            }
        };
        tracing::info!("Uploaded {} ({} bytes)", created.filename, created.size);
        cache::invalidate(&self.cache, cache::MEDIA_SCOPE).await;
        Ok(created)
    }

    pub async fn get(&self, id: i64) -> Result<MediaFile, MediaError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to load media file")?
            .ok_or(MediaError::NotFound)
    }

    /// Admin listing; an empty `types` slice means every type
    pub async fn list(
        &self,
        types: &[MediaType],
        params: &ListParams,
    ) -> Result<PagedResult<MediaFile>, MediaError> {
        let (items, total) = self.repo.list(types, params).await?;
        Ok(PagedResult::new(items, total, params))
    }

    /// Public gallery: images and videos, or one of them
    pub async fn gallery(
        &self,
        media_type: Option<MediaType>,
        params: &ListParams,
    ) -> Result<PagedResult<MediaFile>, MediaError> {
        let types: Vec<MediaType> = match media_type {
            Some(t) if GALLERY_TYPES.contains(&t) => vec![t],
            Some(t) => {
                return Err(MediaError::ValidationError(format!(
                    "{} files are not part of the gallery",
                    t
                )))
            }
            None => GALLERY_TYPES.to_vec(),
        };

        let filter = media_type.map(|t| t.as_str());
        let key = cache::list_key(cache::MEDIA_SCOPE, params.page, params.per_page, filter);
        if let Ok(Some(cached)) = self.cache.get(&key).await {
            return Ok(cached);
        }

        let page = self.list(&types, params).await?;
        if let Err(e) = self.cache.set(&key, &page).await {
            tracing::warn!("Failed to cache gallery: {}", e);
        }
        Ok(page)
    }

    pub async fn update(&self, id: i64, input: UpdateMediaInput) -> Result<MediaFile, MediaError> {
        let mut media = self.get(id).await?;
        if input.alt_text.is_some() {
            media.alt_text = non_blank(input.alt_text);
        }
        if input.caption.is_some() {
            media.caption = non_blank(input.caption);
        }
        media.updated_at = Utc::now();

        let updated = self.repo.update(&media).await?;
        cache::invalidate(&self.cache, cache::MEDIA_SCOPE).await;
        Ok(updated)
    }

    /// Remove the record, then the file. A file already gone is only logged.
    pub async fn delete(&self, id: i64) -> Result<MediaFile, MediaError> {
        let media = self.get(id).await?;
        if !self.repo.delete(id).await? {
            return Err(MediaError::NotFound);
        }

        remove_file(&self.config.path.join(&media.filename)).await;
        cache::invalidate(&self.cache, cache::MEDIA_SCOPE).await;
        Ok(media)
    }

    pub async fn count(&self) -> Result<i64, MediaError> {
        Ok(self.repo.count().await?)
    }
}

async fn remove_file(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        tracing::warn!("Could not remove {}: {}", path.display(), e);
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let v = v.trim();
        (!v.is_empty()).then(|| v.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::create_cache;
    use crate::config::CacheConfig;
    use crate::db::repositories::SqlxMediaRepository;
    use crate::db::{create_test_pool, migrations};
    use tempfile::TempDir;

    async fn setup_service(max_file_size: u64) -> (TempDir, MediaService) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let dir = TempDir::new().expect("Failed to create temp dir");
        let config = UploadConfig {
            path: dir.path().to_path_buf(),
            max_file_size,
            ..Default::default()
        };
        let service = MediaService::new(
            SqlxMediaRepository::boxed(pool),
            Arc::new(config),
            create_cache(&CacheConfig::default()),
        );
        (dir, service)
    }

    fn png(name: &str) -> UploadedFile {
        UploadedFile {
            original_name: name.to_string(),
            content_type: "image/png".to_string(),
            data: vec![0x89, b'P', b'N', b'G', 1, 2, 3],
        }
    }

    #[tokio::test]
    async fn test_stored_extension_follows_mime_type() {
        let (dir, service) = setup_service(1024).await;
        let disguised = UploadedFile {
            original_name: "x.html".to_string(),
            content_type: "image/png".to_string(),
            data: b"<script>alert(1)</script>".to_vec(),
        };
        let media = service.upload(disguised, None, None, None).await.unwrap();

        assert_eq!(media.original_name, "x.html");
        assert!(media.filename.ends_with(".png"));
        assert!(media.url.ends_with(".png"));
        assert!(dir.path().join(&media.filename).exists());

        let jpeg = UploadedFile {
            original_name: "Photo".to_string(),
            content_type: "image/jpeg".to_string(),
            data: vec![0xFF, 0xD8, 0xFF],
        };
        let media = service.upload(jpeg, None, None, None).await.unwrap();
        assert!(media.filename.ends_with(".jpg"));
    }

    #[tokio::test]
    async fn test_upload_writes_file_and_record() {
        let (dir, service) = setup_service(1024).await;
        let media = service
            .upload(png("rally.png"), Some("Rally".to_string()), None, None)
            .await
            .unwrap();

        assert_eq!(media.media_type, MediaType::Image);
        assert_eq!(media.original_name, "rally.png");
        assert!(media.filename.ends_with(".png"));
        assert_eq!(media.url, format!("/uploads/{}", media.filename));
        assert!(dir.path().join(&media.filename).exists());
        assert_eq!(media.alt_text.as_deref(), Some("Rally"));
    }

    #[tokio::test]
    async fn test_upload_rejects_type_and_size() {
        let (_dir, service) = setup_service(4).await;

        let exe = UploadedFile {
            original_name: "x.exe".to_string(),
            content_type: "application/x-msdownload".to_string(),
            data: vec![1],
        };
        assert!(matches!(
            service.upload(exe, None, None, None).await,
            Err(MediaError::ValidationError(_))
        ));
        assert!(matches!(
            service.upload(png("big.png"), None, None, None).await,
            Err(MediaError::ValidationError(_))
        ));
        assert_eq!(service.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_tolerates_missing_file() {
        let (dir, service) = setup_service(1024).await;
        let media = service.upload(png("a.png"), None, None, None).await.unwrap();
        std::fs::remove_file(dir.path().join(&media.filename)).unwrap();

        service.delete(media.id).await.unwrap();
        assert!(matches!(service.get(media.id).await, Err(MediaError::NotFound)));
    }

    #[tokio::test]
    async fn test_gallery_excludes_documents() {
        let (_dir, service) = setup_service(1024).await;
        service.upload(png("a.png"), None, None, None).await.unwrap();
        let pdf = UploadedFile {
            original_name: "report.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            data: b"%PDF-1.4".to_vec(),
        };
        service.upload(pdf, None, None, None).await.unwrap();

        let page = service.gallery(None, &ListParams::default()).await.unwrap();
        assert_eq!(page.total, 1);
        assert!(service
            .gallery(Some(MediaType::Document), &ListParams::default())
            .await
            .is_err());

        let all = service.list(&[], &ListParams::default()).await.unwrap();
        assert_eq!(all.total, 2);
    }

    #[tokio::test]
    async fn test_update_metadata() {
        let (_dir, service) = setup_service(1024).await;
        let media = service.upload(png("a.png"), None, None, None).await.unwrap();

        let updated = service
            .update(
                media.id,
                UpdateMediaInput {
                    caption: Some("Opening of the clinic".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.caption.as_deref(), Some("Opening of the clinic"));
        assert!(updated.alt_text.is_none());
    }
}
