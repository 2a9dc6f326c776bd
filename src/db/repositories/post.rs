//! Post repository covering the global listing, group, profile, and feed
//! queries.
//!
//! Every listing returns [`PostWithMeta`] rows so templates never chase the
//! author or group with follow-up queries. Ordering is always newest first,
//! with the row id as a tiebreaker for posts created in the same instant.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use crate::models::{NewPost, Post, PostWithMeta, UpdatePost};

const META_SELECT: &str = "SELECT p.id, p.text, p.author_id, p.group_id, p.image, p.created_at, \
     u.username AS author_username, g.title AS group_title, g.slug AS group_slug \
     FROM posts p \
     JOIN users u ON u.id = p.author_id \
     LEFT JOIN groups g ON g.id = p.group_id";

const META_ORDER: &str = "ORDER BY p.created_at DESC, p.id DESC LIMIT ? OFFSET ?";

/// Data access for the `posts` table.
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Inserts a new post.
    async fn create(&self, new_post: &NewPost) -> Result<Post>;

    /// Updates a post's text, group, and (when provided) image.
    async fn update(&self, id: i64, update: &UpdatePost) -> Result<Post>;

    /// Looks up a post by id.
    async fn get_by_id(&self, id: i64) -> Result<Option<Post>>;

    /// Looks up a post by id with author and group names joined in.
    async fn get_with_meta(&self, id: i64) -> Result<Option<PostWithMeta>>;

    /// Lists a page of all posts, newest first.
    async fn list_recent(&self, limit: i64, offset: i64) -> Result<Vec<PostWithMeta>>;

    /// Counts all posts.
    async fn count_all(&self) -> Result<i64>;

    /// Lists a page of posts tagged to a group.
    async fn list_by_group(&self, group_id: i64, limit: i64, offset: i64)
        -> Result<Vec<PostWithMeta>>;

    /// Counts posts tagged to a group.
    async fn count_by_group(&self, group_id: i64) -> Result<i64>;

    /// Lists a page of posts by one author.
    async fn list_by_author(
        &self,
        author_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PostWithMeta>>;

    /// Counts posts by one author.
    async fn count_by_author(&self, author_id: i64) -> Result<i64>;

    /// Lists a page of posts from authors the user follows.
    async fn list_feed(&self, user_id: i64, limit: i64, offset: i64)
        -> Result<Vec<PostWithMeta>>;

    /// Counts posts from authors the user follows.
    async fn count_feed(&self, user_id: i64) -> Result<i64>;
}

/// SQLite-backed implementation of [`PostRepository`].
pub struct SqlxPostRepository {
    pool: SqlitePool,
}

impl SqlxPostRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: SqlitePool) -> Arc<dyn PostRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl PostRepository for SqlxPostRepository {
    async fn create(&self, new_post: &NewPost) -> Result<Post> {
        let now = chrono::Utc::now();
        let result = sqlx::query(
            "INSERT INTO posts (text, author_id, group_id, image, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&new_post.text)
        .bind(new_post.author_id)
        .bind(new_post.group_id)
        .bind(&new_post.image)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create post")?;

        let id = result.last_insert_rowid();
        self.get_by_id(id).await?.context("Created post not found")
    }

    async fn update(&self, id: i64, update: &UpdatePost) -> Result<Post> {
        // A missing image means "keep what is stored", so it stays out of the
        // SET list entirely rather than overwriting with NULL.
        match &update.image {
            Some(image) => {
                sqlx::query("UPDATE posts SET text = ?, group_id = ?, image = ? WHERE id = ?")
                    .bind(&update.text)
                    .bind(update.group_id)
                    .bind(image)
                    .bind(id)
                    .execute(&self.pool)
                    .await
                    .context("Failed to update post")?;
            }
            None => {
                sqlx::query("UPDATE posts SET text = ?, group_id = ? WHERE id = ?")
                    .bind(&update.text)
                    .bind(update.group_id)
                    .bind(id)
                    .execute(&self.pool)
                    .await
                    .context("Failed to update post")?;
            }
        }

        self.get_by_id(id).await?.context("Updated post not found")
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Post>> {
        let row = sqlx::query(
            "SELECT id, text, author_id, group_id, image, created_at FROM posts WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get post by id")?;

        Ok(row.map(|r| row_to_post(&r)))
    }

    async fn get_with_meta(&self, id: i64) -> Result<Option<PostWithMeta>> {
        let sql = format!("{META_SELECT} WHERE p.id = ?");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get post with meta")?;

        Ok(row.map(|r| row_to_post_with_meta(&r)))
    }

    async fn list_recent(&self, limit: i64, offset: i64) -> Result<Vec<PostWithMeta>> {
        let sql = format!("{META_SELECT} {META_ORDER}");
        let rows = sqlx::query(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list posts")?;

        Ok(rows.iter().map(row_to_post_with_meta).collect())
    }

    async fn count_all(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM posts")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count posts")?;

        Ok(row.get("count"))
    }

    async fn list_by_group(
        &self,
        group_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PostWithMeta>> {
        let sql = format!("{META_SELECT} WHERE p.group_id = ? {META_ORDER}");
        let rows = sqlx::query(&sql)
            .bind(group_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list posts by group")?;

        Ok(rows.iter().map(row_to_post_with_meta).collect())
    }

    async fn count_by_group(&self, group_id: i64) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM posts WHERE group_id = ?")
            .bind(group_id)
            .fetch_one(&self.pool)
            .await
            .context("Failed to count posts by group")?;

        Ok(row.get("count"))
    }

    async fn list_by_author(
        &self,
        author_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PostWithMeta>> {
        let sql = format!("{META_SELECT} WHERE p.author_id = ? {META_ORDER}");
        let rows = sqlx::query(&sql)
            .bind(author_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list posts by author")?;

        Ok(rows.iter().map(row_to_post_with_meta).collect())
    }

    async fn count_by_author(&self, author_id: i64) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM posts WHERE author_id = ?")
            .bind(author_id)
            .fetch_one(&self.pool)
            .await
            .context("Failed to count posts by author")?;

        Ok(row.get("count"))
    }

    async fn list_feed(
        &self,
        user_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PostWithMeta>> {
        let sql = format!(
            "{META_SELECT} JOIN follows f ON f.author_id = p.author_id WHERE f.user_id = ? {META_ORDER}"
        );
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list feed posts")?;

        Ok(rows.iter().map(row_to_post_with_meta).collect())
    }

    async fn count_feed(&self, user_id: i64) -> Result<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS count FROM posts p \
             JOIN follows f ON f.author_id = p.author_id WHERE f.user_id = ?",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to count feed posts")?;

        Ok(row.get("count"))
    }
}

fn row_to_post(row: &SqliteRow) -> Post {
    Post {
        id: row.get("id"),
        text: row.get("text"),
        author_id: row.get("author_id"),
        group_id: row.get("group_id"),
        image: row.get("image"),
        created_at: row.get("created_at"),
    }
}

fn row_to_post_with_meta(row: &SqliteRow) -> PostWithMeta {
    PostWithMeta {
        id: row.get("id"),
        text: row.get("text"),
        author_id: row.get("author_id"),
        author_username: row.get("author_username"),
        group_id: row.get("group_id"),
        group_title: row.get("group_title"),
        group_slug: row.get("group_slug"),
        image: row.get("image"),
        created_at: row.get("created_at"),
    }
}
