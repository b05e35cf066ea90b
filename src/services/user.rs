//! User service
//!
//! Credentials login, sessions, the in-memory demo account, profile
//! management and super-admin user administration.

use crate::config::{AuthConfig, BootstrapAdminConfig, DemoAccountConfig};
use crate::db::is_unique_violation;
use crate::db::repositories::{SessionRepository, UserRepository};
use crate::models::{
    CreateUserInput, ListParams, PagedResult, Session, UpdateProfileInput, UpdateUserInput, User,
    UserRole, UserStatus,
};
use crate::services::password::{hash_password, verify_password, MIN_PASSWORD_LENGTH};
use anyhow::Context;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("User not found")]
    NotFound,

    #[error("Session expired")]
    SessionExpired,

    #[error("Session not found")]
    SessionNotFound,

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
    session_days: i64,
    demo: DemoAccountConfig,
    /// Demo sessions never reach the database
    demo_sessions: RwLock<HashMap<String, Session>>,
}

impl UserService {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
        auth: &AuthConfig,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            session_days: auth.session_days,
            demo: auth.demo.clone(),
            demo_sessions: RwLock::new(HashMap::new()),
        }
    }

    fn demo_user(&self) -> User {
        User::demo(self.demo.email.clone(), self.demo.name.clone(), self.demo.role)
    }

    fn is_demo_login(&self, input: &LoginInput) -> bool {
        self.demo.enabled
            && input.email.trim().eq_ignore_ascii_case(&self.demo.email)
            && input.password == self.demo.password
    }

    fn new_session(&self, user_id: i64) -> Session {
        Session::start(user_id, Duration::days(self.session_days), Utc::now())
    }

    /// Log in with e-mail and password.
    ///
    /// The demo account is matched first and never touches the user store.
    pub async fn login(&self, input: &LoginInput) -> Result<(User, Session), UserServiceError> {
        if self.is_demo_login(input) {
            let session = self.new_session(crate::models::DEMO_USER_ID);
            self.demo_sessions
                .write()
                .await
                .insert(session.id.clone(), session.clone());
            tracing::info!("Demo account logged in");
            return Ok((self.demo_user(), session));
        }

        let email = normalize_email(&input.email);
        let user = self
            .user_repo
            .get_by_email(&email)
            .await
            .context("Failed to look up user")?
            .ok_or_else(|| UserServiceError::AuthenticationError(INVALID_CREDENTIALS.to_string()))?;

        let valid = verify_password(&input.password, &user.password_hash).unwrap_or_else(|e| {
            tracing::warn!("Stored password hash for user {} is unusable: {}", user.id, e);
            false
        });
        if !valid {
            return Err(UserServiceError::AuthenticationError(INVALID_CREDENTIALS.to_string()));
        }

        if !user.is_active() {
            return Err(UserServiceError::AuthenticationError(
                "This account is inactive".to_string(),
            ));
        }

        let now = Utc::now();
        self.user_repo
            .touch_last_login(user.id, now)
            .await
            .context("Failed to record login time")?;

        let session = self
            .session_repo
            .create(&self.new_session(user.id))
            .await
            .context("Failed to create session")?;

        Ok((
            User {
                last_login_at: Some(now),
                ..user
            },
            session,
        ))
    }

    pub async fn logout(&self, session_id: &str) -> Result<(), UserServiceError> {
        if self.demo_sessions.write().await.remove(session_id).is_some() {
            return Ok(());
        }
        self.session_repo
            .delete(session_id)
            .await
            .context("Failed to delete session")?;
        Ok(())
    }

    /// Resolve a session token to its user.
    ///
    /// Expired sessions are deleted on sight.
    pub async fn validate_session(&self, session_id: &str) -> Result<User, UserServiceError> {
        let demo_session = self.demo_sessions.read().await.get(session_id).cloned();
        if let Some(session) = demo_session {
            if session.is_expired() {
                self.demo_sessions.write().await.remove(session_id);
                return Err(UserServiceError::SessionExpired);
            }
            return Ok(self.demo_user());
        }

        let session = self
            .session_repo
            .get_by_id(session_id)
            .await
            .context("Failed to load session")?
            .ok_or(UserServiceError::SessionNotFound)?;

        if session.is_expired() {
            self.session_repo
                .delete(session_id)
                .await
                .context("Failed to delete expired session")?;
            return Err(UserServiceError::SessionExpired);
        }

        let user = self
            .user_repo
            .get_by_id(session.user_id)
            .await
            .context("Failed to load session user")?
            .ok_or(UserServiceError::SessionNotFound)?;

        if !user.is_active() {
            return Err(UserServiceError::AuthenticationError(
                "This account is inactive".to_string(),
            ));
        }

        Ok(user)
    }

    /// Remove expired database and demo sessions, returning how many went
    pub async fn cleanup_expired_sessions(&self) -> Result<u64, UserServiceError> {
        let now = Utc::now();
        let removed = self
            .session_repo
            .delete_expired(now)
            .await
            .context("Failed to purge expired sessions")?;

        let mut demo = self.demo_sessions.write().await;
        let before = demo.len();
        demo.retain(|_, s| !s.is_expired_at(now));
        Ok(removed + (before - demo.len()) as u64)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<User, UserServiceError> {
        if id == crate::models::DEMO_USER_ID && self.demo.enabled {
            return Ok(self.demo_user());
        }
        self.user_repo
            .get_by_id(id)
            .await
            .context("Failed to get user")?
            .ok_or(UserServiceError::NotFound)
    }

    pub async fn list_users(&self, params: &ListParams) -> Result<PagedResult<User>, UserServiceError> {
        let (items, total) = self.user_repo.list(params).await.context("Failed to list users")?;
        Ok(PagedResult::new(items, total, params))
    }

    pub async fn create_user(&self, input: CreateUserInput) -> Result<User, UserServiceError> {
        let email = normalize_email(&input.email);
        validate_email(&email)?;
        let name = validate_name(&input.name)?;
        validate_new_password(&input.password)?;

        self.ensure_email_free(&email, None).await?;

        let hash = hash_password(&input.password).context("Failed to hash password")?;
        let user = User::new(email, name, hash, input.role.unwrap_or_default());
        let created = self
            .user_repo
            .create(&user)
            .await
            .context("Failed to create user")
            .map_err(|e| email_write_error(e, &user.email))?;
        tracing::info!("Created user {} with role {}", created.id, created.role);
        Ok(created)
    }

    /// Change name, role or status of another account.
    ///
    /// A super admin may not demote or deactivate themself.
    pub async fn update_user(
        &self,
        actor: &User,
        id: i64,
        input: UpdateUserInput,
    ) -> Result<User, UserServiceError> {
        let mut user = self.get_by_id(id).await?;

        if actor.id == user.id {
            if matches!(input.role, Some(role) if role != UserRole::SuperAdmin) && actor.is_super_admin() {
                return Err(UserServiceError::ValidationError(
                    "You cannot remove your own super admin role".to_string(),
                ));
            }
            if input.status == Some(UserStatus::Inactive) {
                return Err(UserServiceError::ValidationError(
                    "You cannot deactivate your own account".to_string(),
                ));
            }
        }

        if let Some(name) = input.name {
            user.name = validate_name(&name)?;
        }
        if let Some(role) = input.role {
            user.role = role;
        }
        if let Some(status) = input.status {
            user.status = status;
            if status == UserStatus::Inactive {
                self.session_repo
                    .delete_by_user(user.id)
                    .await
                    .context("Failed to revoke sessions")?;
            }
        }

        Ok(self.user_repo.update(&user).await.context("Failed to update user")?)
    }

    pub async fn delete_user(&self, actor: &User, id: i64) -> Result<(), UserServiceError> {
        if actor.id == id {
            return Err(UserServiceError::ValidationError(
                "You cannot delete your own account".to_string(),
            ));
        }
        self.get_by_id(id).await?;
        self.user_repo.delete(id).await.context("Failed to delete user")?;
        Ok(())
    }

    pub async fn update_profile(
        &self,
        user: &User,
        input: UpdateProfileInput,
    ) -> Result<User, UserServiceError> {
        if user.is_demo() {
            return Err(UserServiceError::ValidationError(
                "The demo account cannot be modified".to_string(),
            ));
        }

        let mut current = self.get_by_id(user.id).await?;

        if let Some(name) = input.name {
            current.name = validate_name(&name)?;
        }
        if let Some(email) = input.email {
            let email = normalize_email(&email);
            validate_email(&email)?;
            self.ensure_email_free(&email, Some(current.id)).await?;
            current.email = email;
        }
        if let Some(bio) = input.bio {
            current.bio = non_blank(bio);
        }
        if let Some(avatar) = input.avatar {
            current.avatar = non_blank(avatar);
        }

        self.user_repo
            .update(&current)
            .await
            .context("Failed to update profile")
            .map_err(|e| email_write_error(e, &current.email))
    }

    pub async fn change_password(
        &self,
        user: &User,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), UserServiceError> {
        if user.is_demo() {
            return Err(UserServiceError::ValidationError(
                "The demo account cannot change its password".to_string(),
            ));
        }

        let mut current = self.get_by_id(user.id).await?;
        let valid = verify_password(current_password, &current.password_hash)
            .context("Failed to verify password")?;
        if !valid {
            return Err(UserServiceError::ValidationError(
                "Current password is incorrect".to_string(),
            ));
        }
        validate_new_password(new_password)?;

        current.password_hash = hash_password(new_password).context("Failed to hash password")?;
        self.user_repo
            .update(&current)
            .await
            .context("Failed to store password")?;
        Ok(())
    }

    /// Create the configured super admin when the user store is empty
    pub async fn ensure_bootstrap_admin(
        &self,
        admin: Option<&BootstrapAdminConfig>,
    ) -> Result<Option<User>, UserServiceError> {
        let Some(admin) = admin else {
            return Ok(None);
        };
        if self.user_repo.count().await.context("Failed to count users")? > 0 {
            return Ok(None);
        }

        let created = self
            .create_user(CreateUserInput {
                email: admin.email.clone(),
                name: admin.name.clone(),
                password: admin.password.clone(),
                role: Some(UserRole::SuperAdmin),
            })
            .await?;
        tracing::info!("Bootstrap super admin {} created", created.email);
        Ok(Some(created))
    }

    async fn ensure_email_free(&self, email: &str, own_id: Option<i64>) -> Result<(), UserServiceError> {
        let existing = self
            .user_repo
            .get_by_email(email)
            .await
            .context("Failed to check email")?;
        match existing {
            Some(other) if Some(other.id) != own_id => Err(email_taken(email)),
            _ => Ok(()),
        }
    }
}

fn email_taken(email: &str) -> UserServiceError {
    UserServiceError::Conflict(format!("Email '{}' is already in use", email))
}

/// The users.email index rejected the write after the lookup said it was free
fn email_write_error(err: anyhow::Error, email: &str) -> UserServiceError {
    if is_unique_violation(&err) {
        email_taken(email)
    } else {
        UserServiceError::InternalError(err)
    }
}

/// Canonical form of an e-mail address for lookups and rate limiting
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Loose address check: one `@` with text on both sides, no spaces
pub fn is_valid_email(email: &str) -> bool {
    let shaped = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@') && !email.contains(' ')
        }
        None => false,
    };
    shaped && email.len() <= 255
}

fn validate_email(email: &str) -> Result<(), UserServiceError> {
    if is_valid_email(email) {
        Ok(())
    } else {
        Err(UserServiceError::ValidationError("A valid email is required".to_string()))
    }
}

fn validate_name(name: &str) -> Result<String, UserServiceError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(UserServiceError::ValidationError("Name is required".to_string()));
    }
    if name.chars().count() > 255 {
        return Err(UserServiceError::ValidationError(
            "Name must be at most 255 characters".to_string(),
        ));
    }
    Ok(name.to_string())
}

fn validate_new_password(password: &str) -> Result<(), UserServiceError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(UserServiceError::ValidationError(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxSessionRepository, SqlxUserRepository};
    use crate::db::{create_test_pool, migrations::run_migrations};

    async fn service_with(auth: AuthConfig) -> UserService {
        let pool = create_test_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();
        UserService::new(
            SqlxUserRepository::boxed(pool.clone()),
            SqlxSessionRepository::boxed(pool),
            &auth,
        )
    }

    async fn service() -> UserService {
        service_with(AuthConfig::default()).await
    }

    fn new_user(email: &str, role: UserRole) -> CreateUserInput {
        CreateUserInput {
            email: email.to_string(),
            name: "Staffer".to_string(),
            password: "password123".to_string(),
            role: Some(role),
        }
    }

    fn login(email: &str, password: &str) -> LoginInput {
        LoginInput {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_login_and_validate_session() {
        let svc = service().await;
        svc.create_user(new_user("Editor@Example.org", UserRole::NewsEditor))
            .await
            .unwrap();

        let (user, session) = svc.login(&login("editor@example.org", "password123")).await.unwrap();
        assert_eq!(user.email, "editor@example.org");
        assert!(user.last_login_at.is_some());

        let resolved = svc.validate_session(&session.id).await.unwrap();
        assert_eq!(resolved.id, user.id);

        svc.logout(&session.id).await.unwrap();
        assert!(matches!(
            svc.validate_session(&session.id).await,
            Err(UserServiceError::SessionNotFound)
        ));
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_email_look_the_same() {
        let svc = service().await;
        svc.create_user(new_user("a@example.org", UserRole::Viewer)).await.unwrap();

        let wrong = svc.login(&login("a@example.org", "nope-nope")).await.unwrap_err();
        let unknown = svc.login(&login("b@example.org", "nope-nope")).await.unwrap_err();
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn test_inactive_user_cannot_login() {
        let svc = service().await;
        let admin = svc.create_user(new_user("root@example.org", UserRole::SuperAdmin)).await.unwrap();
        let staff = svc.create_user(new_user("x@example.org", UserRole::Viewer)).await.unwrap();

        svc.update_user(
            &admin,
            staff.id,
            UpdateUserInput {
                status: Some(UserStatus::Inactive),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let err = svc.login(&login("x@example.org", "password123")).await.unwrap_err();
        assert!(matches!(err, UserServiceError::AuthenticationError(_)));
    }

    #[tokio::test]
    async fn test_legacy_bcrypt_hash_logs_in() {
        let svc = service().await;
        let mut user = svc.create_user(new_user("old@example.org", UserRole::Viewer)).await.unwrap();
        user.password_hash = bcrypt::hash("legacy-password", 4).unwrap();
        svc.user_repo.update(&user).await.unwrap();

        assert!(svc.login(&login("old@example.org", "legacy-password")).await.is_ok());
    }

    #[tokio::test]
    async fn test_demo_login_bypasses_database() {
        let mut auth = AuthConfig::default();
        auth.demo.enabled = true;
        let svc = service_with(auth).await;

        let (user, session) = svc.login(&login("DEMO@podium.local", "demo1234")).await.unwrap();
        assert!(user.is_demo());
        assert_eq!(svc.user_repo.count().await.unwrap(), 0);

        let resolved = svc.validate_session(&session.id).await.unwrap();
        assert!(resolved.is_demo());

        let err = svc
            .update_profile(&resolved, UpdateProfileInput::default())
            .await
            .unwrap_err();
        assert!(matches!(err, UserServiceError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_demo_disabled_rejects_demo_credentials() {
        let svc = service().await;
        assert!(svc.login(&login("demo@podium.local", "demo1234")).await.is_err());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let svc = service().await;
        svc.create_user(new_user("dup@example.org", UserRole::Viewer)).await.unwrap();
        let err = svc
            .create_user(new_user("DUP@example.org", UserRole::Viewer))
            .await
            .unwrap_err();
        assert!(matches!(err, UserServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_email_index_rejection_is_conflict() {
        let svc = service().await;
        let first = svc.create_user(new_user("race@example.org", UserRole::Viewer)).await.unwrap();

        // Insert that slipped past the lookup
        let err = svc
            .user_repo
            .create(&first)
            .await
            .context("Failed to create user")
            .unwrap_err();
        assert!(matches!(
            email_write_error(err, &first.email),
            UserServiceError::Conflict(msg) if msg.contains("race@example.org")
        ));
        assert!(matches!(
            email_write_error(anyhow::anyhow!("connection reset"), &first.email),
            UserServiceError::InternalError(_)
        ));
    }

    #[tokio::test]
    async fn test_short_password_rejected() {
        let svc = service().await;
        let mut input = new_user("p@example.org", UserRole::Viewer);
        input.password = "short".to_string();
        assert!(matches!(
            svc.create_user(input).await,
            Err(UserServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_super_admin_cannot_demote_or_delete_self() {
        let svc = service().await;
        let admin = svc.create_user(new_user("root@example.org", UserRole::SuperAdmin)).await.unwrap();

        let demote = svc
            .update_user(
                &admin,
                admin.id,
                UpdateUserInput {
                    role: Some(UserRole::Viewer),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(demote, Err(UserServiceError::ValidationError(_))));
        assert!(matches!(
            svc.delete_user(&admin, admin.id).await,
            Err(UserServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_change_password_requires_current() {
        let svc = service().await;
        let user = svc.create_user(new_user("me@example.org", UserRole::Viewer)).await.unwrap();

        let wrong = svc.change_password(&user, "not-it", "brand-new-pass").await;
        assert!(matches!(wrong, Err(UserServiceError::ValidationError(_))));

        svc.change_password(&user, "password123", "brand-new-pass").await.unwrap();
        assert!(svc.login(&login("me@example.org", "brand-new-pass")).await.is_ok());
    }

    #[tokio::test]
    async fn test_profile_email_must_stay_unique() {
        let svc = service().await;
        svc.create_user(new_user("taken@example.org", UserRole::Viewer)).await.unwrap();
        let me = svc.create_user(new_user("me@example.org", UserRole::Viewer)).await.unwrap();

        let err = svc
            .update_profile(
                &me,
                UpdateProfileInput {
                    email: Some("taken@example.org".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, UserServiceError::Conflict(_)));

        let updated = svc
            .update_profile(
                &me,
                UpdateProfileInput {
                    bio: Some("Chief of staff".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.bio.as_deref(), Some("Chief of staff"));
    }

    #[tokio::test]
    async fn test_bootstrap_admin_only_on_empty_store() {
        let svc = service().await;
        let admin = BootstrapAdminConfig {
            email: "boot@example.org".to_string(),
            password: "bootstrap-pass".to_string(),
            name: "Admin".to_string(),
        };

        let created = svc.ensure_bootstrap_admin(Some(&admin)).await.unwrap().unwrap();
        assert_eq!(created.role, UserRole::SuperAdmin);
        assert!(svc.ensure_bootstrap_admin(Some(&admin)).await.unwrap().is_none());
        assert!(svc.ensure_bootstrap_admin(None).await.unwrap().is_none());
    }
}
