//! Settings service
//!
//! Settings live in the `system_settings` key/value table. `SystemSettings`
//! is the typed view over the keys Podium knows about; missing or unparsable
//! values fall back to the defaults.

use crate::cache::{self, SharedCache};
use crate::db::repositories::SettingsRepository;
use crate::services::user::is_valid_email;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use thiserror::Error;

/// Known setting keys
pub mod keys {
    pub const SITE_NAME: &str = "site_name";
    pub const SITE_TAGLINE: &str = "site_tagline";
    pub const BIOGRAPHY: &str = "biography";
    pub const CONSTITUENCY: &str = "constituency";
    pub const CONTACT_EMAIL: &str = "contact_email";
    pub const CONTACT_PHONE: &str = "contact_phone";
    pub const OFFICE_ADDRESS: &str = "office_address";
    pub const ITEMS_PER_PAGE: &str = "items_per_page";
    pub const MAINTENANCE_MODE: &str = "maintenance_mode";
    pub const SOCIAL_LINKS: &str = "social_links";
}

const SETTINGS_CACHE_KEY: &str = "site:settings";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemSettings {
    pub site_name: String,
    pub site_tagline: String,
    pub biography: String,
    pub constituency: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub office_address: String,
    pub items_per_page: u32,
    pub maintenance_mode: bool,
    /// Platform name to profile URL
    pub social_links: BTreeMap<String, String>,
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            site_name: "Podium".to_string(),
            site_tagline: String::new(),
            biography: String::new(),
            constituency: String::new(),
            contact_email: String::new(),
            contact_phone: String::new(),
            office_address: String::new(),
            items_per_page: 10,
            maintenance_mode: false,
            social_links: BTreeMap::new(),
        }
    }
}

impl SystemSettings {
    fn from_map(map: &HashMap<String, String>) -> Self {
        let defaults = Self::default();
        let text = |key: &str, default: String| map.get(key).cloned().unwrap_or(default);

        Self {
            site_name: text(keys::SITE_NAME, defaults.site_name),
            site_tagline: text(keys::SITE_TAGLINE, defaults.site_tagline),
            biography: text(keys::BIOGRAPHY, defaults.biography),
            constituency: text(keys::CONSTITUENCY, defaults.constituency),
            contact_email: text(keys::CONTACT_EMAIL, defaults.contact_email),
            contact_phone: text(keys::CONTACT_PHONE, defaults.contact_phone),
            office_address: text(keys::OFFICE_ADDRESS, defaults.office_address),
            items_per_page: map
                .get(keys::ITEMS_PER_PAGE)
                .and_then(|v| v.parse().ok())
                .filter(|n| (1..=100).contains(n))
                .unwrap_or(defaults.items_per_page),
            maintenance_mode: map
                .get(keys::MAINTENANCE_MODE)
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.maintenance_mode),
            social_links: map
                .get(keys::SOCIAL_LINKS)
                .and_then(|v| serde_json::from_str(v).ok())
                .unwrap_or(defaults.social_links),
        }
    }

    /// What the public site is allowed to see
    pub fn public_view(&self) -> PublicSiteInfo {
        PublicSiteInfo {
            site_name: self.site_name.clone(),
            site_tagline: self.site_tagline.clone(),
            biography: self.biography.clone(),
            constituency: self.constituency.clone(),
            contact_email: self.contact_email.clone(),
            contact_phone: self.contact_phone.clone(),
            office_address: self.office_address.clone(),
            maintenance_mode: self.maintenance_mode,
            social_links: self.social_links.clone(),
        }
    }
}

/// Public subset returned by `/api/site`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicSiteInfo {
    pub site_name: String,
    pub site_tagline: String,
    pub biography: String,
    pub constituency: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub office_address: String,
    pub maintenance_mode: bool,
    pub social_links: BTreeMap<String, String>,
}

/// Partial settings update
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSettingsInput {
    pub site_name: Option<String>,
    pub site_tagline: Option<String>,
    pub biography: Option<String>,
    pub constituency: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub office_address: Option<String>,
    pub items_per_page: Option<u32>,
    pub maintenance_mode: Option<bool>,
    pub social_links: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Error)]
pub enum SettingsServiceError {
    #[error("Invalid setting value: {0}")]
    InvalidValue(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub struct SettingsService {
    repo: Arc<dyn SettingsRepository>,
    cache: SharedCache,
}

impl SettingsService {
    pub fn new(repo: Arc<dyn SettingsRepository>, cache: SharedCache) -> Self {
        Self { repo, cache }
    }

    pub async fn get_settings(&self) -> Result<SystemSettings, SettingsServiceError> {
        if let Ok(Some(cached)) = self.cache.get(SETTINGS_CACHE_KEY).await {
            return Ok(cached);
        }

        let map: HashMap<String, String> = self
            .repo
            .get_all()
            .await?
            .into_iter()
            .map(|s| (s.key, s.value))
            .collect();
        let settings = SystemSettings::from_map(&map);

        if let Err(e) = self.cache.set(SETTINGS_CACHE_KEY, &settings).await {
            tracing::warn!("Failed to cache settings: {}", e);
        }
        Ok(settings)
    }

    pub async fn public_info(&self) -> Result<PublicSiteInfo, SettingsServiceError> {
        Ok(self.get_settings().await?.public_view())
    }

    /// Validate and store the supplied fields; returns the new settings
    pub async fn update(
        &self,
        input: UpdateSettingsInput,
    ) -> Result<SystemSettings, SettingsServiceError> {
        let mut changes: HashMap<String, String> = HashMap::new();

        if let Some(name) = input.site_name {
            let name = name.trim();
            if name.is_empty() {
                return Err(SettingsServiceError::InvalidValue(
                    "site_name cannot be empty".to_string(),
                ));
            }
            changes.insert(keys::SITE_NAME.to_string(), name.to_string());
        }
        if let Some(email) = input.contact_email {
            let email = email.trim().to_lowercase();
            if !email.is_empty() && !is_valid_email(&email) {
                return Err(SettingsServiceError::InvalidValue(
                    "contact_email is not a valid email".to_string(),
                ));
            }
            changes.insert(keys::CONTACT_EMAIL.to_string(), email);
        }
        if let Some(n) = input.items_per_page {
            if !(1..=100).contains(&n) {
                return Err(SettingsServiceError::InvalidValue(
                    "items_per_page must be between 1 and 100".to_string(),
                ));
            }
            changes.insert(keys::ITEMS_PER_PAGE.to_string(), n.to_string());
        }
        if let Some(links) = input.social_links {
            let json = serde_json::to_string(&links)
                .map_err(|e| SettingsServiceError::InvalidValue(e.to_string()))?;
            changes.insert(keys::SOCIAL_LINKS.to_string(), json);
        }
        if let Some(flag) = input.maintenance_mode {
            changes.insert(keys::MAINTENANCE_MODE.to_string(), flag.to_string());
        }

        let texts = [
            (keys::SITE_TAGLINE, input.site_tagline),
            (keys::BIOGRAPHY, input.biography),
            (keys::CONSTITUENCY, input.constituency),
            (keys::CONTACT_PHONE, input.contact_phone),
            (keys::OFFICE_ADDRESS, input.office_address),
        ];
        for (key, value) in texts {
            if let Some(value) = value {
                changes.insert(key.to_string(), value.trim().to_string());
            }
        }

        if !changes.is_empty() {
            self.repo.set_many(&changes).await?;
            tracing::info!("{} setting(s) updated", changes.len());
        }
        cache::invalidate(&self.cache, cache::SITE_SCOPE).await;
        self.get_settings().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::create_cache;
    use crate::config::CacheConfig;
    use crate::db::repositories::SqlxSettingsRepository;
    use crate::db::{create_test_pool, migrations};

    async fn service() -> SettingsService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SettingsService::new(
            SqlxSettingsRepository::boxed(pool),
            create_cache(&CacheConfig::default()),
        )
    }

    #[test]
    fn test_from_map_falls_back_on_bad_values() {
        let mut map = HashMap::new();
        map.insert(keys::ITEMS_PER_PAGE.to_string(), "500".to_string());
        map.insert(keys::MAINTENANCE_MODE.to_string(), "maybe".to_string());
        map.insert(keys::SOCIAL_LINKS.to_string(), "not json".to_string());
        map.insert(keys::CONSTITUENCY.to_string(), "North".to_string());

        let settings = SystemSettings::from_map(&map);
        assert_eq!(settings.items_per_page, 10);
        assert!(!settings.maintenance_mode);
        assert!(settings.social_links.is_empty());
        assert_eq!(settings.constituency, "North");
        assert_eq!(settings.site_name, "Podium");
    }

    #[tokio::test]
    async fn test_defaults_from_seeded_table() {
        let service = service().await;
        let settings = service.get_settings().await.unwrap();
        assert_eq!(settings.site_name, "Podium");
        assert_eq!(settings.items_per_page, 10);
    }

    #[tokio::test]
    async fn test_update_and_read_back() {
        let service = service().await;
        let mut links = BTreeMap::new();
        links.insert("twitter".to_string(), "https://twitter.com/office".to_string());

        let updated = service
            .update(UpdateSettingsInput {
                site_name: Some("Office of the MP".to_string()),
                items_per_page: Some(20),
                contact_email: Some("Office@Example.org".to_string()),
                social_links: Some(links.clone()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(updated.site_name, "Office of the MP");
        assert_eq!(updated.items_per_page, 20);
        assert_eq!(updated.contact_email, "office@example.org");
        assert_eq!(updated.social_links, links);

        let public = service.public_info().await.unwrap();
        assert_eq!(public.site_name, "Office of the MP");
    }

    #[tokio::test]
    async fn test_update_validation() {
        let service = service().await;
        for input in [
            UpdateSettingsInput {
                items_per_page: Some(0),
                ..Default::default()
            },
            UpdateSettingsInput {
                items_per_page: Some(101),
                ..Default::default()
            },
            UpdateSettingsInput {
                contact_email: Some("nope".to_string()),
                ..Default::default()
            },
            UpdateSettingsInput {
                site_name: Some("  ".to_string()),
                ..Default::default()
            },
        ] {
            assert!(matches!(
                service.update(input).await,
                Err(SettingsServiceError::InvalidValue(_))
            ));
        }
        assert_eq!(service.get_settings().await.unwrap().items_per_page, 10);
    }
}
