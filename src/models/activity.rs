//! Audit trail of back-office actions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One recorded action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserActivity {
    pub id: i64,
    /// Acting user; `None` for the demo account and anonymous actions
    pub user_id: Option<i64>,
    /// Verb such as `create`, `update`, `delete`, `login`
    pub action: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<i64>,
    pub details: Option<String>,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A not-yet-stored activity entry
#[derive(Debug, Clone, Default)]
pub struct NewActivity {
    pub user_id: Option<i64>,
    pub action: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<i64>,
    pub details: Option<String>,
    pub ip_address: Option<String>,
}

impl NewActivity {
    pub fn new(user_id: Option<i64>, action: impl Into<String>) -> Self {
        Self {
            user_id,
            action: action.into(),
            ..Default::default()
        }
    }

    pub fn entity(mut self, entity_type: impl Into<String>, entity_id: Option<i64>) -> Self {
        self.entity_type = Some(entity_type.into());
        self.entity_id = entity_id;
        self
    }

    pub fn details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn ip(mut self, ip: Option<String>) -> Self {
        self.ip_address = ip;
        self
    }
}
