//! Services layer - Business logic
//!
//! Services validate input, enforce the content and role rules, coordinate
//! repositories with the cache, and never see HTTP types.

pub mod activity;
pub mod backup;
pub mod contact;
pub mod content;
pub mod dashboard;
pub mod markdown;
pub mod media;
pub mod password;
pub mod rate_limiter;
pub mod schedule;
pub mod search;
pub mod seo;
pub mod settings;
pub mod social;
pub mod user;

pub use activity::ActivityService;
pub use backup::{BackupError, BackupInfo, BackupService, BackupSources};
pub use contact::{ContactError, ContactService};
pub use content::{generate_slug, ContentError, ContentService};
pub use dashboard::{DashboardService, DashboardSummary};
pub use markdown::MarkdownRenderer;
pub use media::{MediaError, MediaService, UploadedFile};
pub use password::{hash_password, verify_password};
pub use rate_limiter::LoginRateLimiter;
pub use schedule::{ScheduleError, ScheduleService};
pub use search::{SearchHit, SearchService};
pub use seo::{SeoError, SeoService};
pub use settings::{SettingsService, SettingsServiceError, SystemSettings};
pub use social::{SocialError, SocialService};
pub use user::{normalize_email, LoginInput, UserService, UserServiceError};
