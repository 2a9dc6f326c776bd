//! Group repository for the communities posts can be filed under.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use crate::models::{Group, NewGroup};

/// Data access for the `groups` table.
#[async_trait]
pub trait GroupRepository: Send + Sync {
    /// Creates a new group.
    async fn create(&self, new_group: &NewGroup) -> Result<Group>;

    /// Looks up a group by its numeric id.
    async fn get_by_id(&self, id: i64) -> Result<Option<Group>>;

    /// Looks up a group by its URL slug.
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Group>>;

    /// Lists every group, newest first.
    async fn list_all(&self) -> Result<Vec<Group>>;
}

/// SQLite-backed implementation of [`GroupRepository`].
pub struct SqlxGroupRepository {
    pool: SqlitePool,
}

impl SqlxGroupRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: SqlitePool) -> Arc<dyn GroupRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl GroupRepository for SqlxGroupRepository {
    async fn create(&self, new_group: &NewGroup) -> Result<Group> {
        let now = chrono::Utc::now();
        let result = sqlx::query(
            "INSERT INTO groups (title, slug, description, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&new_group.title)
        .bind(&new_group.slug)
        .bind(&new_group.description)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create group")?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .context("Created group not found")
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Group>> {
        let row = sqlx::query(
            "SELECT id, title, slug, description, created_at FROM groups WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get group by id")?;

        Ok(row.map(|r| row_to_group(&r)))
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Group>> {
        let row = sqlx::query(
            "SELECT id, title, slug, description, created_at FROM groups WHERE slug = ?",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get group by slug")?;

        Ok(row.map(|r| row_to_group(&r)))
    }

    async fn list_all(&self) -> Result<Vec<Group>> {
        let rows = sqlx::query(
            "SELECT id, title, slug, description, created_at FROM groups ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list groups")?;

        Ok(rows.iter().map(row_to_group).collect())
    }
}

fn row_to_group(row: &SqliteRow) -> Group {
    Group {
        id: row.get("id"),
        title: row.get("title"),
        slug: row.get("slug"),
        description: row.get("description"),
        created_at: row.get("created_at"),
    }
}
