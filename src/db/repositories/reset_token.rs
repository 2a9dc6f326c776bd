//! Password reset token repository.
//!
//! Tokens are single use: the confirm flow deletes the row it consumed, and
//! starting a new reset clears any tokens the user still had outstanding.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use crate::models::PasswordResetToken;

/// Data access for the `password_reset_tokens` table.
#[async_trait]
pub trait ResetTokenRepository: Send + Sync {
    /// Stores a new reset token.
    async fn create(&self, token: &PasswordResetToken) -> Result<PasswordResetToken>;

    /// Looks up a token by its value.
    async fn get(&self, token: &str) -> Result<Option<PasswordResetToken>>;

    /// Deletes a single token.
    async fn delete(&self, token: &str) -> Result<()>;

    /// Deletes every token issued to a user.
    async fn delete_for_user(&self, user_id: i64) -> Result<()>;

    /// Deletes all tokens past their expiry, returning how many were removed.
    async fn delete_expired(&self) -> Result<u64>;
}

/// SQLite-backed implementation of [`ResetTokenRepository`].
pub struct SqlxResetTokenRepository {
    pool: SqlitePool,
}

impl SqlxResetTokenRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: SqlitePool) -> Arc<dyn ResetTokenRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ResetTokenRepository for SqlxResetTokenRepository {
    async fn create(&self, token: &PasswordResetToken) -> Result<PasswordResetToken> {
        sqlx::query(
            "INSERT INTO password_reset_tokens (token, user_id, expires_at, created_at) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(&token.token)
        .bind(token.user_id)
        .bind(token.expires_at)
        .bind(token.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to create reset token")?;

        Ok(token.clone())
    }

    async fn get(&self, token: &str) -> Result<Option<PasswordResetToken>> {
        let row = sqlx::query(
            "SELECT token, user_id, expires_at, created_at \
             FROM password_reset_tokens WHERE token = ?",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get reset token")?;

        Ok(row.map(|r| row_to_token(&r)))
    }

    async fn delete(&self, token: &str) -> Result<()> {
        sqlx::query("DELETE FROM password_reset_tokens WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await
            .context("Failed to delete reset token")?;

        Ok(())
    }

    async fn delete_for_user(&self, user_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM password_reset_tokens WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .context("Failed to delete reset tokens for user")?;

        Ok(())
    }

    async fn delete_expired(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM password_reset_tokens WHERE expires_at < ?")
            .bind(chrono::Utc::now())
            .execute(&self.pool)
            .await
            .context("Failed to delete expired reset tokens")?;

        Ok(result.rows_affected())
    }
}

fn row_to_token(row: &SqliteRow) -> PasswordResetToken {
    PasswordResetToken {
        token: row.get("token"),
        user_id: row.get("user_id"),
        expires_at: row.get("expires_at"),
        created_at: row.get("created_at"),
    }
}
