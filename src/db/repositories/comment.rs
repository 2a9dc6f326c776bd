//! Comment repository.
//!
//! Comments render oldest first under a post, opposite to post listings.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use crate::models::{Comment, CommentWithAuthor, NewComment};

/// Data access for the `comments` table.
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Inserts a new comment.
    async fn create(&self, new_comment: &NewComment) -> Result<Comment>;

    /// Lists a window of a post's comments, oldest first, with author names
    /// joined.
    async fn list_by_post(
        &self,
        post_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CommentWithAuthor>>;

    /// Counts comments on a post.
    async fn count_by_post(&self, post_id: i64) -> Result<i64>;
}

/// SQLite-backed implementation of [`CommentRepository`].
pub struct SqlxCommentRepository {
    pool: SqlitePool,
}

impl SqlxCommentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: SqlitePool) -> Arc<dyn CommentRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CommentRepository for SqlxCommentRepository {
    async fn create(&self, new_comment: &NewComment) -> Result<Comment> {
        let now = chrono::Utc::now();
        let result = sqlx::query(
            "INSERT INTO comments (post_id, author_id, text, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(new_comment.post_id)
        .bind(new_comment.author_id)
        .bind(&new_comment.text)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create comment")?;

        let id = result.last_insert_rowid();
        let row = sqlx::query(
            "SELECT id, post_id, author_id, text, created_at FROM comments WHERE id = ?",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .context("Created comment not found")?;

        Ok(row_to_comment(&row))
    }

    async fn list_by_post(
        &self,
        post_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CommentWithAuthor>> {
        let rows = sqlx::query(
            "SELECT c.id, c.post_id, c.author_id, c.text, c.created_at, \
             u.username AS author_username \
             FROM comments c \
             JOIN users u ON u.id = c.author_id \
             WHERE c.post_id = ? \
             ORDER BY c.created_at ASC, c.id ASC \
             LIMIT ? OFFSET ?",
        )
        .bind(post_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list comments")?;

        Ok(rows.iter().map(row_to_comment_with_author).collect())
    }

    async fn count_by_post(&self, post_id: i64) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM comments WHERE post_id = ?")
            .bind(post_id)
            .fetch_one(&self.pool)
            .await
            .context("Failed to count comments")?;

        Ok(row.get("count"))
    }
}

fn row_to_comment(row: &SqliteRow) -> Comment {
    Comment {
        id: row.get("id"),
        post_id: row.get("post_id"),
        author_id: row.get("author_id"),
        text: row.get("text"),
        created_at: row.get("created_at"),
    }
}

fn row_to_comment_with_author(row: &SqliteRow) -> CommentWithAuthor {
    CommentWithAuthor {
        id: row.get("id"),
        post_id: row.get("post_id"),
        author_id: row.get("author_id"),
        author_username: row.get("author_username"),
        text: row.get("text"),
        created_at: row.get("created_at"),
    }
}
