//! Data models
//!
//! This module contains the data structures used throughout Podium:
//! - Database entities (users, sessions, news, speeches, reports, media,
//!   contact messages, social posts, schedule, SEO, activity)
//! - API input types
//! - Shared status and pagination types

mod activity;
mod contact;
mod content;
mod media;
mod news;
mod report;
mod schedule;
mod seo;
mod session;
mod social;
mod speech;
mod user;

pub use activity::{NewActivity, UserActivity};
pub use contact::{ContactMessage, CreateContactInput, MessageStatus, MAX_MESSAGE_LENGTH};
pub use content::{ContentKind, ContentStatus, ListParams, PagedResult};
pub use media::{MediaFile, MediaType, UpdateMediaInput};
pub use news::{CreateNewsInput, NewsArticle, UpdateNewsInput};
pub use report::{CreateReportInput, Report, UpdateReportInput};
pub use schedule::{
    CreateScheduleInput, PublishReport, ScheduleStatus, ScheduledPost, UpdateScheduleInput,
};
pub use seo::{
    CreateSeoKeywordInput, CreateSeoPageInput, SeoAuditEntry, SeoKeyword, SeoPage,
    UpdateSeoKeywordInput, UpdateSeoPageInput,
};
pub use session::Session;
pub use social::{
    CreateSocialAccountInput, CreateSocialPostInput, SocialAccount, SocialPost, SocialPostStatus,
    UpdateSocialAccountInput, UpdateSocialPostInput,
};
pub use speech::{CreateSpeechInput, Speech, UpdateSpeechInput};
pub use user::{
    CreateUserInput, UpdateProfileInput, UpdateUserInput, User, UserRole, UserStatus,
    DEMO_USER_ID,
};
