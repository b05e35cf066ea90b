//! Configuration management
//!
//! This module handles loading and parsing configuration for Podium.
//! Configuration can be loaded from:
//! - config.yml file
//! - Environment variables (override file settings)
//!
//! Missing optional values are filled with sensible defaults. Values that are
//! present but unusable are replaced by defaults in [`Config::sanitize`], which
//! reports a warning for each replacement instead of aborting startup.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::models::UserRole;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Upload configuration
    #[serde(default)]
    pub upload: UploadConfig,
    /// Authentication configuration
    #[serde(default)]
    pub auth: AuthConfig,
    /// Backup configuration
    #[serde(default)]
    pub backup: BackupConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origin (for cookie-based auth)
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database driver (sqlite or mysql)
    #[serde(default)]
    pub driver: DatabaseDriver,
    /// Database connection URL
    #[serde(default = "default_database_url")]
    pub url: String,
    /// Upper bound on pooled connections; in-memory SQLite always uses one
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: DatabaseDriver::default(),
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

impl DatabaseConfig {
    pub fn sqlite_memory() -> Self {
        Self {
            driver: DatabaseDriver::Sqlite,
            url: ":memory:".to_string(),
            max_connections: 1,
        }
    }
}

fn default_database_url() -> String {
    "data/podium.db".to_string()
}

fn default_max_connections() -> u32 {
    10
}

/// Database driver type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseDriver {
    /// SQLite (default)
    #[default]
    Sqlite,
    /// MySQL
    Mysql,
}

/// Cache configuration for public read paths
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache TTL in seconds
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,
    /// Maximum number of cached entries
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl(),
            max_capacity: default_max_capacity(),
        }
    }
}

fn default_ttl() -> u64 {
    300
}

fn default_max_capacity() -> u64 {
    10_000
}

/// Upload configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Upload directory path
    #[serde(default = "default_upload_path")]
    pub path: PathBuf,
    /// Public URL prefix under which uploaded files are served
    #[serde(default = "default_public_prefix")]
    pub public_prefix: String,
    /// Maximum file size in bytes (default: 25MB)
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Allowed MIME types
    #[serde(default = "default_allowed_types")]
    pub allowed_types: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            path: default_upload_path(),
            public_prefix: default_public_prefix(),
            max_file_size: default_max_file_size(),
            allowed_types: default_allowed_types(),
        }
    }
}

fn default_upload_path() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_public_prefix() -> String {
    "/uploads".to_string()
}

fn default_max_file_size() -> u64 {
    25 * 1024 * 1024
}

fn default_allowed_types() -> Vec<String> {
    vec![
        "image/jpeg".to_string(),
        "image/png".to_string(),
        "image/gif".to_string(),
        "image/webp".to_string(),
        "video/mp4".to_string(),
        "video/webm".to_string(),
        "audio/mpeg".to_string(),
        "application/pdf".to_string(),
    ]
}

impl UploadConfig {
    /// Check if a MIME type is allowed
    pub fn is_type_allowed(&self, mime_type: &str) -> bool {
        self.allowed_types.iter().any(|t| t == mime_type)
    }

    /// Get file extension for a MIME type
    pub fn get_extension(&self, mime_type: &str) -> &'static str {
        match mime_type {
            "image/jpeg" => "jpg",
            "image/png" => "png",
            "image/gif" => "gif",
            "image/webp" => "webp",
            "video/mp4" => "mp4",
            "video/webm" => "webm",
            "audio/mpeg" => "mp3",
            "application/pdf" => "pdf",
            _ => "bin",
        }
    }
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Session lifetime in days
    #[serde(default = "default_session_days")]
    pub session_days: i64,
    /// Demo account that logs in without touching the user store
    #[serde(default)]
    pub demo: DemoAccountConfig,
    /// Super admin created on first start when the user store is empty
    #[serde(default)]
    pub bootstrap_admin: Option<BootstrapAdminConfig>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_days: default_session_days(),
            demo: DemoAccountConfig::default(),
            bootstrap_admin: None,
        }
    }
}

fn default_session_days() -> i64 {
    7
}

/// Demo account settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoAccountConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_demo_email")]
    pub email: String,
    #[serde(default = "default_demo_password")]
    pub password: String,
    #[serde(default = "default_demo_name")]
    pub name: String,
    #[serde(default = "default_demo_role")]
    pub role: UserRole,
}

impl Default for DemoAccountConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            email: default_demo_email(),
            password: default_demo_password(),
            name: default_demo_name(),
            role: default_demo_role(),
        }
    }
}

fn default_demo_email() -> String {
    "demo@podium.local".to_string()
}

fn default_demo_password() -> String {
    "demo1234".to_string()
}

fn default_demo_name() -> String {
    "Demo User".to_string()
}

fn default_demo_role() -> UserRole {
    UserRole::Viewer
}

/// Initial super admin credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapAdminConfig {
    pub email: String,
    pub password: String,
    #[serde(default = "default_admin_name")]
    pub name: String,
}

fn default_admin_name() -> String {
    "Administrator".to_string()
}

/// Backup configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupConfig {
    /// Directory where backup archives are written
    #[serde(default = "default_backup_dir")]
    pub dir: PathBuf,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            dir: default_backup_dir(),
        }
    }
}

fn default_backup_dir() -> PathBuf {
    PathBuf::from("backups")
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError {
        path: String,
        message: String,
    },
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(&content).map_err(|e| {
            ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            }
        })?;

        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Environment variables follow the pattern:
    /// - PODIUM_SERVER_HOST
    /// - PODIUM_SERVER_PORT
    /// - PODIUM_SERVER_CORS_ORIGIN
    /// - PODIUM_DATABASE_DRIVER
    /// - PODIUM_DATABASE_URL
    /// - PODIUM_UPLOAD_PATH
    /// - PODIUM_BACKUP_DIR
    /// - PODIUM_DEMO_ENABLED
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("PODIUM_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("PODIUM_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Ok(cors_origin) = std::env::var("PODIUM_SERVER_CORS_ORIGIN") {
            self.server.cors_origin = cors_origin;
        }

        if let Ok(driver) = std::env::var("PODIUM_DATABASE_DRIVER") {
            match driver.to_lowercase().as_str() {
                "sqlite" => self.database.driver = DatabaseDriver::Sqlite,
                "mysql" => self.database.driver = DatabaseDriver::Mysql,
                _ => {} // Ignore invalid values
            }
        }
        if let Ok(url) = std::env::var("PODIUM_DATABASE_URL") {
            self.database.url = url;
        }

        if let Ok(path) = std::env::var("PODIUM_UPLOAD_PATH") {
            self.upload.path = PathBuf::from(path);
        }
        if let Ok(dir) = std::env::var("PODIUM_BACKUP_DIR") {
            self.backup.dir = PathBuf::from(dir);
        }
        if let Ok(enabled) = std::env::var("PODIUM_DEMO_ENABLED") {
            match enabled.to_lowercase().as_str() {
                "1" | "true" | "yes" => self.auth.demo.enabled = true,
                "0" | "false" | "no" => self.auth.demo.enabled = false,
                _ => {}
            }
        }
    }

    /// Replace unusable values with defaults.
    ///
    /// Returns one human-readable warning per replaced value. The caller is
    /// expected to log them; startup continues with the corrected config.
    pub fn sanitize(&mut self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.database.url.trim().is_empty() {
            warnings.push(format!(
                "database.url is empty, falling back to '{}'",
                default_database_url()
            ));
            self.database.driver = DatabaseDriver::Sqlite;
            self.database.url = default_database_url();
        } else if self.database.driver == DatabaseDriver::Mysql
            && !self.database.url.contains('@')
            && !self.database.url.starts_with("mysql://")
        {
            warnings.push(format!(
                "database.url '{}' does not look like a MySQL URL",
                self.database.url
            ));
        }

        if self.database.max_connections == 0 {
            warnings.push(format!(
                "database.max_connections must be at least 1, using {}",
                default_max_connections()
            ));
            self.database.max_connections = default_max_connections();
        }

        if self.server.cors_origin.parse::<axum::http::HeaderValue>().is_err() {
            warnings.push(format!(
                "server.cors_origin '{}' is not a valid header value, falling back to '{}'",
                self.server.cors_origin,
                default_cors_origin()
            ));
            self.server.cors_origin = default_cors_origin();
        }

        if self.auth.session_days <= 0 {
            warnings.push(format!(
                "auth.session_days must be positive, falling back to {}",
                default_session_days()
            ));
            self.auth.session_days = default_session_days();
        }

        if self.cache.ttl_seconds == 0 {
            warnings.push(format!(
                "cache.ttl_seconds must be positive, falling back to {}",
                default_ttl()
            ));
            self.cache.ttl_seconds = default_ttl();
        }

        let prefix = self.upload.public_prefix.trim_end_matches('/');
        if !prefix.starts_with('/') || prefix.starts_with("/api") {
            warnings.push(format!(
                "upload.public_prefix '{}' must start with '/' and stay outside /api, falling back to '{}'",
                self.upload.public_prefix,
                default_public_prefix()
            ));
            self.upload.public_prefix = default_public_prefix();
        } else {
            self.upload.public_prefix = prefix.to_string();
        }

        if self.upload.max_file_size == 0 {
            warnings.push(format!(
                "upload.max_file_size must be positive, falling back to {}",
                default_max_file_size()
            ));
            self.upload.max_file_size = default_max_file_size();
        }

        if self.upload.allowed_types.is_empty() {
            warnings.push("upload.allowed_types is empty, falling back to defaults".to_string());
            self.upload.allowed_types = default_allowed_types();
        }

        if self.auth.demo.enabled {
            if self.auth.demo.password.len() < 8 || !self.auth.demo.email.contains('@') {
                warnings.push(
                    "auth.demo has an invalid email or a password shorter than 8 characters, demo login disabled"
                        .to_string(),
                );
                self.auth.demo.enabled = false;
            } else {
                warnings.push(format!(
                    "demo login is enabled for '{}' with role {}",
                    self.auth.demo.email, self.auth.demo.role
                ));
            }
        }

        if let Some(admin) = &self.auth.bootstrap_admin {
            if admin.password.len() < 8 || !admin.email.contains('@') {
                warnings.push(
                    "auth.bootstrap_admin has an invalid email or a password shorter than 8 characters, ignored"
                        .to_string(),
                );
                self.auth.bootstrap_admin = None;
            }
        }

        warnings
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared mutex for config tests that modify environment variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());


/// Property-based tests for configuration parsing
#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        #[test]
        fn property_port_round_trips_through_yaml(port in 1u16..=65535u16) {
            let mut file = NamedTempFile::new().unwrap();
            write!(file, "server:\n  port: {}\n", port).unwrap();

            let config = Config::load(file.path()).unwrap();
            prop_assert_eq!(config.server.port, port);
            prop_assert_eq!(config.server.host, "0.0.0.0");
        }

        #[test]
        fn property_sanitize_never_leaves_invalid_session_days(days in -1000i64..=1000i64) {
            let mut config = Config::default();
            config.auth.session_days = days;
            config.sanitize();
            prop_assert!(config.auth.session_days > 0);
        }
    }
}
