//! Constituency contact portal
//!
//! Public submissions are validated and stored with status `new`. Opening a
//! message in the back-office marks it `read`.

use crate::db::repositories::ContactRepository;
use crate::models::{
    ContactMessage, CreateContactInput, ListParams, MessageStatus, PagedResult, MAX_MESSAGE_LENGTH,
};
use crate::services::user::is_valid_email;
use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum ContactError {
    #[error("Message not found")]
    NotFound,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub struct ContactService {
    repo: Arc<dyn ContactRepository>,
}

impl ContactService {
    pub fn new(repo: Arc<dyn ContactRepository>) -> Self {
        Self { repo }
    }

    pub async fn submit(&self, input: CreateContactInput) -> Result<ContactMessage, ContactError> {
        let name = input.name.trim();
        if name.is_empty() || name.chars().count() > 255 {
            return Err(ContactError::ValidationError(
                "Name is required (at most 255 characters)".to_string(),
            ));
        }
        let email = input.email.trim().to_lowercase();
        if !is_valid_email(&email) {
            return Err(ContactError::ValidationError("A valid email is required".to_string()));
        }
        let message = input.message.trim();
        if message.is_empty() {
            return Err(ContactError::ValidationError("Message is required".to_string()));
        }
        if message.chars().count() > MAX_MESSAGE_LENGTH {
            return Err(ContactError::ValidationError(format!(
                "Message must be at most {} characters",
                MAX_MESSAGE_LENGTH
            )));
        }

        let now = Utc::now();
        let record = ContactMessage {
            id: 0,
            name: name.to_string(),
            email,
            phone: trimmed(input.phone),
            subject: trimmed(input.subject),
            message: message.to_string(),
            constituency: trimmed(input.constituency),
            status: MessageStatus::New,
            created_at: now,
            updated_at: now,
        };

        let created = self.repo.create(&record).await?;
        tracing::info!("Contact message {} received", created.id);
        Ok(created)
    }

    pub async fn list(
        &self,
        status: Option<MessageStatus>,
        params: &ListParams,
    ) -> Result<PagedResult<ContactMessage>, ContactError> {
        let (items, total) = self
            .repo
            .list(status, params)
            .await
            .context("Failed to list messages")?;
        Ok(PagedResult::new(items, total, params))
    }

    /// Fetch a message for reading; a `new` message becomes `read`
    pub async fn open(&self, id: i64) -> Result<ContactMessage, ContactError> {
        let mut message = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to load message")?
            .ok_or(ContactError::NotFound)?;

        if message.status == MessageStatus::New {
            self.repo.update_status(id, MessageStatus::Read).await?;
            message.status = MessageStatus::Read;
        }
        Ok(message)
    }

    pub async fn set_status(&self, id: i64, status: MessageStatus) -> Result<(), ContactError> {
        if !self.repo.update_status(id, status).await? {
            return Err(ContactError::NotFound);
        }
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<(), ContactError> {
        if !self.repo.delete(id).await? {
            return Err(ContactError::NotFound);
        }
        Ok(())
    }

    pub async fn unread_count(&self) -> Result<i64, ContactError> {
        Ok(self.repo.count(Some(MessageStatus::New)).await?)
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let v = v.trim();
        (!v.is_empty()).then(|| v.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxContactRepository;
    use crate::db::{create_test_pool, migrations};

    async fn service() -> ContactService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        ContactService::new(SqlxContactRepository::boxed(pool))
    }

    fn input(message: &str) -> CreateContactInput {
        CreateContactInput {
            name: "Ada".to_string(),
            email: "Ada@Example.org".to_string(),
            message: message.to_string(),
            constituency: Some("North ward".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_submit_and_open_marks_read() {
        let service = service().await;
        let created = service.submit(input("The bridge needs repair")).await.unwrap();
        assert_eq!(created.status, MessageStatus::New);
        assert_eq!(created.email, "ada@example.org");
        assert_eq!(service.unread_count().await.unwrap(), 1);

        let opened = service.open(created.id).await.unwrap();
        assert_eq!(opened.status, MessageStatus::Read);
        assert_eq!(service.unread_count().await.unwrap(), 0);

        service.set_status(created.id, MessageStatus::Replied).await.unwrap();
        let again = service.open(created.id).await.unwrap();
        assert_eq!(again.status, MessageStatus::Replied);
    }

    #[tokio::test]
    async fn test_submit_validation() {
        let service = service().await;

        assert!(service.submit(input("   ")).await.is_err());
        assert!(service.submit(input(&"x".repeat(MAX_MESSAGE_LENGTH + 1))).await.is_err());
        assert!(service.submit(input(&"x".repeat(MAX_MESSAGE_LENGTH))).await.is_ok());

        let mut bad_email = input("Hello");
        bad_email.email = "not-an-email".to_string();
        assert!(matches!(
            service.submit(bad_email).await,
            Err(ContactError::ValidationError(_))
        ));

        let mut no_name = input("Hello");
        no_name.name = " ".to_string();
        assert!(service.submit(no_name).await.is_err());
    }

    #[tokio::test]
    async fn test_missing_message() {
        let service = service().await;
        assert!(matches!(service.open(9).await, Err(ContactError::NotFound)));
        assert!(matches!(service.delete(9).await, Err(ContactError::NotFound)));
        assert!(matches!(
            service.set_status(9, MessageStatus::Archived).await,
            Err(ContactError::NotFound)
        ));
    }
}
