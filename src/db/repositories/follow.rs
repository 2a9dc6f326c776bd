//! Follow repository.
//!
//! The `follows` table carries a UNIQUE (user_id, author_id) pair, so
//! duplicate subscriptions are impossible at the storage layer. Inserts go
//! through `INSERT OR IGNORE` and report via the affected-row count whether
//! a new relation actually appeared.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

/// Data access for the `follows` table.
#[async_trait]
pub trait FollowRepository: Send + Sync {
    /// Records that `user_id` follows `author_id`. Returns `false` when the
    /// relation already existed.
    async fn insert_if_absent(&self, user_id: i64, author_id: i64) -> Result<bool>;

    /// Removes the relation. Returns `false` when there was nothing to remove.
    async fn delete(&self, user_id: i64, author_id: i64) -> Result<bool>;

    /// Checks whether `user_id` follows `author_id`.
    async fn exists(&self, user_id: i64, author_id: i64) -> Result<bool>;

    /// Counts how many authors a user follows.
    async fn count_following(&self, user_id: i64) -> Result<i64>;

    /// Counts how many users follow an author.
    async fn count_followers(&self, author_id: i64) -> Result<i64>;
}

/// SQLite-backed implementation of [`FollowRepository`].
pub struct SqlxFollowRepository {
    pool: SqlitePool,
}

impl SqlxFollowRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: SqlitePool) -> Arc<dyn FollowRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl FollowRepository for SqlxFollowRepository {
    async fn insert_if_absent(&self, user_id: i64, author_id: i64) -> Result<bool> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO follows (user_id, author_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(user_id)
        .bind(author_id)
        .bind(chrono::Utc::now())
        .execute(&self.pool)
        .await
        .context("Failed to create follow")?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, user_id: i64, author_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM follows WHERE user_id = ? AND author_id = ?")
            .bind(user_id)
            .bind(author_id)
            .execute(&self.pool)
            .await
            .context("Failed to delete follow")?;

        Ok(result.rows_affected() > 0)
    }

    async fn exists(&self, user_id: i64, author_id: i64) -> Result<bool> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS count FROM follows WHERE user_id = ? AND author_id = ?",
        )
        .bind(user_id)
        .bind(author_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to check follow")?;

        let count: i64 = row.get("count");
        Ok(count > 0)
    }

    async fn count_following(&self, user_id: i64) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM follows WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .context("Failed to count following")?;

        Ok(row.get("count"))
    }

    async fn count_followers(&self, author_id: i64) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM follows WHERE author_id = ?")
            .bind(author_id)
            .fetch_one(&self.pool)
            .await
            .context("Failed to count followers")?;

        Ok(row.get("count"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;
    use crate::db::migrations::run_migrations;
    use crate::db::repositories::user::{SqlxUserRepository, UserRepository};
    use crate::models::NewUser;

    async fn setup() -> (SqlitePool, SqlxFollowRepository) {
        let pool = create_test_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();
        (pool.clone(), SqlxFollowRepository::new(pool))
    }

    async fn create_user(pool: &SqlitePool, username: &str) -> i64 {
        SqlxUserRepository::new(pool.clone())
            .create(&NewUser {
                username: username.to_string(),
                email: format!("{username}@example.com"),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_insert_and_exists() {
        let (pool, repo) = setup().await;
        let reader = create_user(&pool, "reader").await;
        let author = create_user(&pool, "author").await;

        assert!(!repo.exists(reader, author).await.unwrap());
        assert!(repo.insert_if_absent(reader, author).await.unwrap());
        assert!(repo.exists(reader, author).await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_insert_reports_absent() {
        let (pool, repo) = setup().await;
        let reader = create_user(&pool, "reader").await;
        let author = create_user(&pool, "author").await;

        assert!(repo.insert_if_absent(reader, author).await.unwrap());
        assert!(!repo.insert_if_absent(reader, author).await.unwrap());
        assert_eq!(repo.count_following(reader).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_follow() {
        let (pool, repo) = setup().await;
        let reader = create_user(&pool, "reader").await;
        let author = create_user(&pool, "author").await;

        repo.insert_if_absent(reader, author).await.unwrap();
        assert!(repo.delete(reader, author).await.unwrap());
        assert!(!repo.exists(reader, author).await.unwrap());
        assert!(!repo.delete(reader, author).await.unwrap());
    }

    #[tokio::test]
    async fn test_follow_is_directional() {
        let (pool, repo) = setup().await;
        let reader = create_user(&pool, "reader").await;
        let author = create_user(&pool, "author").await;

        repo.insert_if_absent(reader, author).await.unwrap();

        assert!(repo.exists(reader, author).await.unwrap());
        assert!(!repo.exists(author, reader).await.unwrap());
        assert_eq!(repo.count_following(reader).await.unwrap(), 1);
        assert_eq!(repo.count_followers(author).await.unwrap(), 1);
        assert_eq!(repo.count_followers(reader).await.unwrap(), 0);
    }
}
