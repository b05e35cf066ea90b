//! Login sessions

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A signed-in session. `id` doubles as the bearer token and cookie value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Start a session for `user_id` with a fresh random token
    pub fn start(user_id: i64, lifetime: Duration, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            expires_at: now + lifetime,
            created_at: now,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_and_expiry() {
        let now = Utc::now();
        let session = Session::start(7, Duration::days(7), now);
        assert_eq!(session.user_id, 7);
        assert_eq!(session.expires_at - session.created_at, Duration::days(7));
        assert!(!session.is_expired_at(now + Duration::days(6)));
        assert!(session.is_expired_at(now + Duration::days(8)));
        assert_ne!(session.id, Session::start(7, Duration::days(7), now).id);
    }
}
