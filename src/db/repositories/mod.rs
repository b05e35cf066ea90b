//! Database repositories
//!
//! One async trait plus one sqlx implementation per entity. Every
//! implementation dispatches on the configured driver.

pub mod activity;
pub mod contact;
pub mod media;
pub mod news;
pub mod report;
pub mod schedule;
pub mod search;
pub mod seo;
pub mod session;
pub mod settings;
pub mod social;
pub mod speech;
pub mod user;

pub use activity::{ActivityRepository, SqlxActivityRepository};
pub use contact::{ContactRepository, SqlxContactRepository};
pub use media::{MediaRepository, SqlxMediaRepository};
pub use news::{NewsRepository, SqlxNewsRepository};
pub use report::{ReportRepository, SqlxReportRepository};
pub use schedule::{ScheduleRepository, SqlxScheduleRepository};
pub use search::{SearchRepository, SearchRow, SqlxSearchRepository};
pub use seo::{SeoRepository, SqlxSeoRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use settings::{Setting, SettingsRepository, SqlxSettingsRepository};
pub use social::{SocialRepository, SqlxSocialRepository};
pub use speech::{SpeechRepository, SqlxSpeechRepository};
pub use user::{SqlxUserRepository, UserRepository};
