//! User model
//!
//! This module defines the User entity, the five-level role hierarchy used to
//! gate admin actions, and related input types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Id used for the demo account, which never exists in the user store.
pub const DEMO_USER_ID: i64 = 0;

/// User entity representing a back-office account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: i64,
    /// Email address (unique, used as login)
    pub email: String,
    /// Display name
    pub name: String,
    /// Password hash (argon2id, or bcrypt for imported accounts)
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// User role
    pub role: UserRole,
    /// User status (active/inactive)
    pub status: UserStatus,
    /// Short biography shown on the profile page
    pub bio: Option<String>,
    /// Avatar URL
    pub avatar: Option<String>,
    /// Last successful login
    pub last_login_at: Option<DateTime<Utc>>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new User with the given parameters.
    ///
    /// The password must already be hashed, see `services::password::hash_password()`.
    pub fn new(email: String, name: String, password_hash: String, role: UserRole) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by the database
            email,
            name,
            password_hash,
            role,
            status: UserStatus::Active,
            bio: None,
            avatar: None,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Build the synthetic demo user. It has no password hash and no row.
    pub fn demo(email: String, name: String, role: UserRole) -> Self {
        let mut user = Self::new(email, name, String::new(), role);
        user.id = DEMO_USER_ID;
        user
    }

    /// Whether this is the synthetic demo account
    pub fn is_demo(&self) -> bool {
        self.id == DEMO_USER_ID
    }

    /// Check whether the user's role is at least `required`
    pub fn has_role(&self, required: UserRole) -> bool {
        self.role.has_at_least(required)
    }

    /// Check if the user is a super admin
    pub fn is_super_admin(&self) -> bool {
        self.role == UserRole::SuperAdmin
    }

    /// Check if the user is active
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }
}

/// User role for authorization.
///
/// Roles form a strict hierarchy; a role inherits every right of the roles
/// below it.
///
/// | role           | level |
/// |----------------|-------|
/// | super_admin    | 5     |
/// | content_editor | 4     |
/// | media_manager  | 3     |
/// | news_editor    | 2     |
/// | viewer         | 1     |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    SuperAdmin,
    ContentEditor,
    MediaManager,
    NewsEditor,
    Viewer,
}

impl UserRole {
    /// All roles from highest to lowest
    pub const ALL: [UserRole; 5] = [
        UserRole::SuperAdmin,
        UserRole::ContentEditor,
        UserRole::MediaManager,
        UserRole::NewsEditor,
        UserRole::Viewer,
    ];

    /// Position in the hierarchy (higher is more privileged)
    pub fn level(&self) -> u8 {
        match self {
            UserRole::SuperAdmin => 5,
            UserRole::ContentEditor => 4,
            UserRole::MediaManager => 3,
            UserRole::NewsEditor => 2,
            UserRole::Viewer => 1,
        }
    }

    /// Whether this role meets or exceeds `required`
    pub fn has_at_least(&self, required: UserRole) -> bool {
        self.level() >= required.level()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::SuperAdmin => "super_admin",
            UserRole::ContentEditor => "content_editor",
            UserRole::MediaManager => "media_manager",
            UserRole::NewsEditor => "news_editor",
            UserRole::Viewer => "viewer",
        }
    }
}

impl Default for UserRole {
    fn default() -> Self {
        Self::Viewer
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "super_admin" => Ok(UserRole::SuperAdmin),
            "content_editor" => Ok(UserRole::ContentEditor),
            "media_manager" => Ok(UserRole::MediaManager),
            "news_editor" => Ok(UserRole::NewsEditor),
            "viewer" => Ok(UserRole::Viewer),
            _ => Err(anyhow::anyhow!("Invalid user role: {}", s)),
        }
    }
}

/// User status for account state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    /// Active - normal access
    Active,
    /// Inactive - cannot login
    Inactive,
}

impl Default for UserStatus {
    fn default() -> Self {
        Self::Active
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserStatus::Active => write!(f, "active"),
            UserStatus::Inactive => write!(f, "inactive"),
        }
    }
}

impl FromStr for UserStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(UserStatus::Active),
            "inactive" => Ok(UserStatus::Inactive),
            _ => Err(anyhow::anyhow!("Invalid user status: {}", s)),
        }
    }
}

/// Input for creating a new user (before password hashing)
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserInput {
    pub email: String,
    pub name: String,
    /// Plaintext password (will be hashed)
    pub password: String,
    /// Defaults to viewer
    #[serde(default)]
    pub role: Option<UserRole>,
}

/// Input for updating a user from the user management screen
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserInput {
    pub name: Option<String>,
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
}

/// Input for updating one's own profile
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfileInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn role_strategy() -> impl Strategy<Value = UserRole> {
        prop_oneof![
            Just(UserRole::SuperAdmin),
            Just(UserRole::ContentEditor),
            Just(UserRole::MediaManager),
            Just(UserRole::NewsEditor),
            Just(UserRole::Viewer),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn property_hierarchy_is_transitive(a in role_strategy(), b in role_strategy(), c in role_strategy()) {
            if a.has_at_least(b) && b.has_at_least(c) {
                prop_assert!(a.has_at_least(c));
            }
        }

        #[test]
        fn property_hierarchy_is_total(a in role_strategy(), b in role_strategy()) {
            prop_assert!(a.has_at_least(b) || b.has_at_least(a));
        }

        #[test]
        fn property_super_admin_passes_every_gate(required in role_strategy()) {
            prop_assert!(UserRole::SuperAdmin.has_at_least(required));
        }

        #[test]
        fn property_viewer_only_passes_viewer_gate(required in role_strategy()) {
            prop_assert_eq!(UserRole::Viewer.has_at_least(required), required == UserRole::Viewer);
        }
    }
}
