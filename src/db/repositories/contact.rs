//! Contact repository for messages sent through the contact form.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use crate::models::{Contact, NewContact};

/// Data access for the `contacts` table.
#[async_trait]
pub trait ContactRepository: Send + Sync {
    /// Stores a new contact message.
    async fn create(&self, new_contact: &NewContact) -> Result<Contact>;

    /// Lists every stored message, newest first.
    async fn list_all(&self) -> Result<Vec<Contact>>;
}

/// SQLite-backed implementation of [`ContactRepository`].
pub struct SqlxContactRepository {
    pool: SqlitePool,
}

impl SqlxContactRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: SqlitePool) -> Arc<dyn ContactRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ContactRepository for SqlxContactRepository {
    async fn create(&self, new_contact: &NewContact) -> Result<Contact> {
        let now = chrono::Utc::now();
        let result = sqlx::query(
            "INSERT INTO contacts (name, email, subject, body, is_answered, created_at) \
             VALUES (?, ?, ?, ?, 0, ?)",
        )
        .bind(&new_contact.name)
        .bind(&new_contact.email)
        .bind(&new_contact.subject)
        .bind(&new_contact.body)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create contact message")?;

        let id = result.last_insert_rowid();
        let row = sqlx::query(
            "SELECT id, name, email, subject, body, is_answered, created_at \
             FROM contacts WHERE id = ?",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .context("Created contact message not found")?;

        Ok(row_to_contact(&row))
    }

    async fn list_all(&self) -> Result<Vec<Contact>> {
        let rows = sqlx::query(
            "SELECT id, name, email, subject, body, is_answered, created_at \
             FROM contacts ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list contact messages")?;

        Ok(rows.iter().map(row_to_contact).collect())
    }
}

fn row_to_contact(row: &SqliteRow) -> Contact {
    Contact {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        subject: row.get("subject"),
        body: row.get("body"),
        is_answered: row.get("is_answered"),
        created_at: row.get("created_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;
    use crate::db::migrations::run_migrations;

    async fn setup() -> SqlxContactRepository {
        let pool = create_test_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();
        SqlxContactRepository::new(pool)
    }

    #[tokio::test]
    async fn test_create_contact() {
        let repo = setup().await;

        let contact = repo
            .create(&NewContact {
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                subject: "Hello".to_string(),
                body: "Love the site".to_string(),
            })
            .await
            .unwrap();

        assert!(contact.id > 0);
        assert_eq!(contact.name, "Ada");
        assert!(!contact.is_answered);
    }

    #[tokio::test]
    async fn test_list_all_newest_first() {
        let repo = setup().await;
        for subject in ["first", "second"] {
            repo.create(&NewContact {
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                subject: subject.to_string(),
                body: String::new(),
            })
            .await
            .unwrap();
        }

        let messages = repo.list_all().await.unwrap();

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].subject, "second");
    }
}
