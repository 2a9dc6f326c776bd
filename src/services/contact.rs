//! Contact form service.
//!
//! Messages are stored first. The notification mail to the site owner is
//! best effort; a broken relay must not lose the message or fail the page.

use crate::db::repositories::ContactRepository;
use crate::models::{Contact, NewContact};
use crate::services::mailer::Mailer;
use anyhow::Context;
use std::sync::Arc;

/// Error types for contact service operations
#[derive(Debug, thiserror::Error)]
pub enum ContactServiceError {
    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Contact service.
pub struct ContactService {
    contact_repo: Arc<dyn ContactRepository>,
    mailer: Arc<Mailer>,
}

impl ContactService {
    pub fn new(contact_repo: Arc<dyn ContactRepository>, mailer: Arc<Mailer>) -> Self {
        Self {
            contact_repo,
            mailer,
        }
    }

    /// Store a contact message and notify the site owner.
    pub async fn submit(&self, input: NewContact) -> Result<Contact, ContactServiceError> {
        self.validate(&input)?;

        let contact = self
            .contact_repo
            .create(&input)
            .await
            .context("Failed to store contact message")?;

        if let Err(err) = self
            .mailer
            .send_contact_notification(
                &contact.name,
                &contact.email,
                &contact.subject,
                &contact.body,
            )
            .await
        {
            tracing::warn!(error = %err, "Failed to send contact notification mail");
        }

        tracing::info!(contact_id = contact.id, "Stored contact message");

        Ok(contact)
    }

    fn validate(&self, input: &NewContact) -> Result<(), ContactServiceError> {
        if input.name.trim().is_empty() {
            return Err(ContactServiceError::ValidationError(
                "Name cannot be empty".to_string(),
            ));
        }
        if input.email.trim().is_empty() || !input.email.contains('@') {
            return Err(ContactServiceError::ValidationError(
                "Invalid email format".to_string(),
            ));
        }
        if input.subject.trim().is_empty() {
            return Err(ContactServiceError::ValidationError(
                "Subject cannot be empty".to_string(),
            ));
        }
        if input.body.trim().is_empty() {
            return Err(ContactServiceError::ValidationError(
                "Message cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MailConfig;
    use crate::db::repositories::{ContactRepository, SqlxContactRepository};
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> (Arc<dyn ContactRepository>, ContactService) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let repo = SqlxContactRepository::boxed(pool);
        let mailer = Arc::new(Mailer::new(MailConfig {
            smtp_host: None,
            smtp_port: 587,
            smtp_username: None,
            smtp_password: None,
            from: "byline@example.com".to_string(),
        }));

        (repo.clone(), ContactService::new(repo, mailer))
    }

    fn valid_input() -> NewContact {
        NewContact {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            subject: "Hello".to_string(),
            body: "Love the site".to_string(),
        }
    }

    #[tokio::test]
    async fn test_submit_stores_message() {
        let (repo, service) = setup().await;

        let contact = service.submit(valid_input()).await.expect("Submit should succeed");

        assert_eq!(contact.name, "Ada");
        assert_eq!(repo.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_submit_rejects_incomplete_input() {
        let (_repo, service) = setup().await;

        let empty_name = NewContact {
            name: String::new(),
            ..valid_input()
        };
        let bad_email = NewContact {
            email: "not-an-email".to_string(),
            ..valid_input()
        };
        let empty_body = NewContact {
            body: "  ".to_string(),
            ..valid_input()
        };

        for input in [empty_name, bad_email, empty_body] {
            let result = service.submit(input).await;
            assert!(matches!(
                result,
                Err(ContactServiceError::ValidationError(_))
            ));
        }
    }
}
