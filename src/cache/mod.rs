//! Cache layer for public read paths
//!
//! Public list and detail responses are cached under `<scope>:...` keys.
//! Admin mutations call [`invalidate`] with the scope they touched.

pub mod memory;

pub use memory::MemoryCache;

use crate::config::CacheConfig;
use crate::models::ContentKind;
use std::sync::Arc;
use std::time::Duration;

pub type SharedCache = Arc<MemoryCache>;

pub fn create_cache(config: &CacheConfig) -> SharedCache {
    Arc::new(MemoryCache::new(
        config.max_capacity,
        Duration::from_secs(config.ttl_seconds),
    ))
}

/// Cache scope for site-wide settings
pub const SITE_SCOPE: &str = "site:";
/// Cache scope for the public media gallery
pub const MEDIA_SCOPE: &str = "media:";
/// Cache scope for public SEO lookups
pub const SEO_SCOPE: &str = "seo:";

/// Scope for one kind of content, e.g. `news:`
pub fn content_scope(kind: ContentKind) -> String {
    format!("{}:", kind.as_str())
}

pub fn list_key(scope: &str, page: u32, per_page: u32, filter: Option<&str>) -> String {
    format!("{}list:{}:{}:{}", scope, page, per_page, filter.unwrap_or("-"))
}

pub fn item_key(scope: &str, id: &str) -> String {
    format!("{}item:{}", scope, id)
}

/// Drop every entry under `scope`
pub async fn invalidate(cache: &MemoryCache, scope: &str) {
    cache.delete_prefix(scope).await;
    tracing::debug!("Cache scope {} invalidated", scope);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_live_under_their_scope() {
        let scope = content_scope(ContentKind::Speech);
        assert_eq!(scope, "speech:");
        assert!(list_key(&scope, 2, 10, None).starts_with("speech:"));
        assert_eq!(item_key(&scope, "budget-day"), "speech:item:budget-day");
        assert_ne!(list_key(MEDIA_SCOPE, 1, 10, Some("image")), list_key(MEDIA_SCOPE, 1, 10, None));
    }

    #[tokio::test]
    async fn test_invalidate_scope() {
        let cache = create_cache(&CacheConfig::default());
        let news = content_scope(ContentKind::News);
        cache.set(&list_key(&news, 1, 10, None), &"page").await.unwrap();
        cache.set(&list_key(SITE_SCOPE, 1, 1, None), &"site").await.unwrap();

        invalidate(&cache, &news).await;

        assert!(cache.get::<String>(&list_key(&news, 1, 10, None)).await.unwrap().is_none());
        assert!(cache.get::<String>(&list_key(SITE_SCOPE, 1, 1, None)).await.unwrap().is_some());
    }
}
