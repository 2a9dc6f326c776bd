//! Group service.
//!
//! Groups are curated rather than user-created, so the only write path is
//! seeding and administration. The read side backs the group pages and the
//! group picker on the post form.

use crate::db::repositories::GroupRepository;
use crate::models::{Group, NewGroup};
use anyhow::Context;
use std::sync::Arc;

/// Error types for group service operations
#[derive(Debug, thiserror::Error)]
pub enum GroupServiceError {
    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Slug already taken
    #[error("Group slug already exists: {0}")]
    DuplicateSlug(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Group service.
pub struct GroupService {
    group_repo: Arc<dyn GroupRepository>,
}

impl GroupService {
    pub fn new(group_repo: Arc<dyn GroupRepository>) -> Self {
        Self { group_repo }
    }

    /// Create a group.
    pub async fn create(&self, input: NewGroup) -> Result<Group, GroupServiceError> {
        if input.title.trim().is_empty() {
            return Err(GroupServiceError::ValidationError(
                "Group title cannot be empty".to_string(),
            ));
        }

        let slug = input.slug.trim();
        if slug.is_empty()
            || !slug
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(GroupServiceError::ValidationError(
                "Slug may only contain lowercase letters, digits and hyphens".to_string(),
            ));
        }

        if self
            .group_repo
            .get_by_slug(slug)
            .await
            .context("Failed to check slug")?
            .is_some()
        {
            return Err(GroupServiceError::DuplicateSlug(slug.to_string()));
        }

        let group = self
            .group_repo
            .create(&input)
            .await
            .context("Failed to create group")?;

        Ok(group)
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Group>, GroupServiceError> {
        let group = self
            .group_repo
            .get_by_slug(slug)
            .await
            .context("Failed to get group by slug")?;

        Ok(group)
    }

    pub async fn list_all(&self) -> Result<Vec<Group>, GroupServiceError> {
        let groups = self
            .group_repo
            .list_all()
            .await
            .context("Failed to list groups")?;

        Ok(groups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxGroupRepository;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> GroupService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        GroupService::new(SqlxGroupRepository::boxed(pool))
    }

    fn input(slug: &str) -> NewGroup {
        NewGroup {
            title: format!("Group {slug}"),
            slug: slug.to_string(),
            description: String::new(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let service = setup().await;

        service.create(input("rust")).await.expect("Create should succeed");

        let found = service.get_by_slug("rust").await.unwrap();
        assert!(found.is_some());
        assert!(service.get_by_slug("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_rejects_bad_slug() {
        let service = setup().await;

        for slug in ["", "Has Caps", "under_score", "spaced slug"] {
            let result = service.create(input(slug)).await;
            assert!(
                matches!(result, Err(GroupServiceError::ValidationError(_))),
                "slug {slug:?} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_slug() {
        let service = setup().await;
        service.create(input("rust")).await.unwrap();

        let result = service.create(input("rust")).await;
        assert!(matches!(result, Err(GroupServiceError::DuplicateSlug(_))));
    }

    #[tokio::test]
    async fn test_list_all() {
        let service = setup().await;
        service.create(input("one")).await.unwrap();
        service.create(input("two")).await.unwrap();

        let groups = service.list_all().await.unwrap();
        assert_eq!(groups.len(), 2);
    }
}
