//! Post service: creation, editing with ownership checks, and the four
//! paginated listings (global, group, profile, feed).

use crate::db::repositories::{GroupRepository, PostRepository};
use crate::models::{NewPost, Post, PostWithMeta, UpdatePost};
use crate::services::pagination::{Page, Paginator};
use anyhow::Context;
use std::sync::Arc;

/// Error types for post service operations
#[derive(Debug, thiserror::Error)]
pub enum PostServiceError {
    /// Post not found
    #[error("Post not found")]
    NotFound,

    /// Acting user is not the post's author
    #[error("Only the author may edit a post")]
    NotOwner,

    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Input for creating or editing a post.
#[derive(Debug, Clone)]
pub struct PostInput {
    pub text: String,
    pub group_id: Option<i64>,
    /// Stored image filename. On edit, `None` keeps the existing image.
    pub image: Option<String>,
}

/// Post service.
pub struct PostService {
    post_repo: Arc<dyn PostRepository>,
    group_repo: Arc<dyn GroupRepository>,
    paginator: Paginator,
}

impl PostService {
    pub fn new(
        post_repo: Arc<dyn PostRepository>,
        group_repo: Arc<dyn GroupRepository>,
        per_page: i64,
    ) -> Self {
        Self {
            post_repo,
            group_repo,
            paginator: Paginator::new(per_page),
        }
    }

    /// Create a new post authored by `author_id`.
    pub async fn create(
        &self,
        author_id: i64,
        input: PostInput,
    ) -> Result<Post, PostServiceError> {
        self.validate(&input).await?;

        let post = self
            .post_repo
            .create(&NewPost {
                text: input.text,
                author_id,
                group_id: input.group_id,
                image: input.image,
            })
            .await
            .context("Failed to create post")?;

        tracing::info!(post_id = post.id, author_id, "Created post");

        Ok(post)
    }

    /// Update a post. Only its author may do so.
    pub async fn update(
        &self,
        post_id: i64,
        editor_id: i64,
        input: PostInput,
    ) -> Result<Post, PostServiceError> {
        let existing = self
            .post_repo
            .get_by_id(post_id)
            .await
            .context("Failed to get post")?
            .ok_or(PostServiceError::NotFound)?;

        if existing.author_id != editor_id {
            return Err(PostServiceError::NotOwner);
        }

        self.validate(&input).await?;

        let updated = self
            .post_repo
            .update(
                post_id,
                &UpdatePost {
                    text: input.text,
                    group_id: input.group_id,
                    image: input.image,
                },
            )
            .await
            .context("Failed to update post")?;

        Ok(updated)
    }

    /// Fetch a post for its edit form, enforcing ownership.
    pub async fn get_for_edit(
        &self,
        post_id: i64,
        user_id: i64,
    ) -> Result<Post, PostServiceError> {
        let post = self
            .post_repo
            .get_by_id(post_id)
            .await
            .context("Failed to get post")?
            .ok_or(PostServiceError::NotFound)?;

        if post.author_id != user_id {
            return Err(PostServiceError::NotOwner);
        }

        Ok(post)
    }

    /// Fetch a post with author and group names for the detail page.
    pub async fn get(&self, post_id: i64) -> Result<Option<PostWithMeta>, PostServiceError> {
        let post = self
            .post_repo
            .get_with_meta(post_id)
            .await
            .context("Failed to get post")?;

        Ok(post)
    }

    /// A page of the global listing.
    pub async fn page_recent(&self, requested: i64) -> Result<Page<PostWithMeta>, PostServiceError> {
        let total = self
            .post_repo
            .count_all()
            .await
            .context("Failed to count posts")?;
        let number = self
            .paginator
            .clamp(requested, self.paginator.total_pages(total));
        let items = self
            .post_repo
            .list_recent(self.paginator.per_page(), self.paginator.offset(number))
            .await
            .context("Failed to list posts")?;

        Ok(self.paginator.page(items, number, total))
    }

    /// A page of one group's posts.
    pub async fn page_by_group(
        &self,
        group_id: i64,
        requested: i64,
    ) -> Result<Page<PostWithMeta>, PostServiceError> {
        let total = self
            .post_repo
            .count_by_group(group_id)
            .await
            .context("Failed to count group posts")?;
        let number = self
            .paginator
            .clamp(requested, self.paginator.total_pages(total));
        let items = self
            .post_repo
            .list_by_group(group_id, self.paginator.per_page(), self.paginator.offset(number))
            .await
            .context("Failed to list group posts")?;

        Ok(self.paginator.page(items, number, total))
    }

    /// A page of one author's posts.
    pub async fn page_by_author(
        &self,
        author_id: i64,
        requested: i64,
    ) -> Result<Page<PostWithMeta>, PostServiceError> {
        let total = self
            .post_repo
            .count_by_author(author_id)
            .await
            .context("Failed to count author posts")?;
        let number = self
            .paginator
            .clamp(requested, self.paginator.total_pages(total));
        let items = self
            .post_repo
            .list_by_author(author_id, self.paginator.per_page(), self.paginator.offset(number))
            .await
            .context("Failed to list author posts")?;

        Ok(self.paginator.page(items, number, total))
    }

    /// A page of posts from authors the user follows.
    pub async fn page_feed(
        &self,
        user_id: i64,
        requested: i64,
    ) -> Result<Page<PostWithMeta>, PostServiceError> {
        let total = self
            .post_repo
            .count_feed(user_id)
            .await
            .context("Failed to count feed posts")?;
        let number = self
            .paginator
            .clamp(requested, self.paginator.total_pages(total));
        let items = self
            .post_repo
            .list_feed(user_id, self.paginator.per_page(), self.paginator.offset(number))
            .await
            .context("Failed to list feed posts")?;

        Ok(self.paginator.page(items, number, total))
    }

    /// Number of posts an author has written, for the profile header.
    pub async fn count_by_author(&self, author_id: i64) -> Result<i64, PostServiceError> {
        let count = self
            .post_repo
            .count_by_author(author_id)
            .await
            .context("Failed to count author posts")?;

        Ok(count)
    }

    async fn validate(&self, input: &PostInput) -> Result<(), PostServiceError> {
        if input.text.trim().is_empty() {
            return Err(PostServiceError::ValidationError(
                "Post text cannot be empty".to_string(),
            ));
        }

        if let Some(group_id) = input.group_id {
            let exists = self
                .group_repo
                .get_by_id(group_id)
                .await
                .context("Failed to check group")?
                .is_some();
            if !exists {
                return Err(PostServiceError::ValidationError(
                    "Selected group does not exist".to_string(),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        SqlxGroupRepository, SqlxPostRepository, SqlxUserRepository, UserRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::models::{NewGroup, NewUser};

    struct TestHarness {
        service: PostService,
        groups: SqlxGroupRepository,
        users: SqlxUserRepository,
    }

    async fn setup() -> TestHarness {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        TestHarness {
            service: PostService::new(
                SqlxPostRepository::boxed(pool.clone()),
                SqlxGroupRepository::boxed(pool.clone()),
                10,
            ),
            groups: SqlxGroupRepository::new(pool.clone()),
            users: SqlxUserRepository::new(pool),
        }
    }

    async fn create_user(harness: &TestHarness, username: &str) -> i64 {
        harness
            .users
            .create(&NewUser {
                username: username.to_string(),
                email: format!("{username}@example.com"),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap()
            .id
    }

    async fn create_group(harness: &TestHarness, slug: &str) -> i64 {
        use crate::db::repositories::GroupRepository;
        harness
            .groups
            .create(&NewGroup {
                title: slug.to_string(),
                slug: slug.to_string(),
                description: String::new(),
            })
            .await
            .unwrap()
            .id
    }

    fn text_input(text: &str) -> PostInput {
        PostInput {
            text: text.to_string(),
            group_id: None,
            image: None,
        }
    }

    #[tokio::test]
    async fn test_create_post() {
        let harness = setup().await;
        let author = create_user(&harness, "alice").await;

        let post = harness
            .service
            .create(author, text_input("hello"))
            .await
            .expect("Create should succeed");

        assert_eq!(post.text, "hello");
        assert_eq!(post.author_id, author);
    }

    #[tokio::test]
    async fn test_create_rejects_empty_text() {
        let harness = setup().await;
        let author = create_user(&harness, "alice").await;

        let result = harness.service.create(author, text_input("   ")).await;

        assert!(matches!(result, Err(PostServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_group() {
        let harness = setup().await;
        let author = create_user(&harness, "alice").await;

        let result = harness
            .service
            .create(
                author,
                PostInput {
                    text: "hello".to_string(),
                    group_id: Some(999),
                    image: None,
                },
            )
            .await;

        assert!(matches!(result, Err(PostServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_update_by_owner() {
        let harness = setup().await;
        let author = create_user(&harness, "alice").await;
        let group = create_group(&harness, "rust").await;
        let post = harness
            .service
            .create(author, text_input("draft"))
            .await
            .unwrap();

        let updated = harness
            .service
            .update(
                post.id,
                author,
                PostInput {
                    text: "final".to_string(),
                    group_id: Some(group),
                    image: None,
                },
            )
            .await
            .expect("Update should succeed");

        assert_eq!(updated.text, "final");
        assert_eq!(updated.group_id, Some(group));
    }

    #[tokio::test]
    async fn test_update_by_non_owner_fails() {
        let harness = setup().await;
        let author = create_user(&harness, "alice").await;
        let intruder = create_user(&harness, "bob").await;
        let post = harness
            .service
            .create(author, text_input("mine"))
            .await
            .unwrap();

        let result = harness
            .service
            .update(post.id, intruder, text_input("stolen"))
            .await;

        assert!(matches!(result, Err(PostServiceError::NotOwner)));

        // The post is untouched.
        let unchanged = harness.service.get(post.id).await.unwrap().unwrap();
        assert_eq!(unchanged.text, "mine");
    }

    #[tokio::test]
    async fn test_update_missing_post_fails() {
        let harness = setup().await;
        let author = create_user(&harness, "alice").await;

        let result = harness.service.update(999, author, text_input("x")).await;

        assert!(matches!(result, Err(PostServiceError::NotFound)));
    }

    #[tokio::test]
    async fn test_get_for_edit_guards_ownership() {
        let harness = setup().await;
        let author = create_user(&harness, "alice").await;
        let intruder = create_user(&harness, "bob").await;
        let post = harness
            .service
            .create(author, text_input("mine"))
            .await
            .unwrap();

        assert!(harness.service.get_for_edit(post.id, author).await.is_ok());
        assert!(matches!(
            harness.service.get_for_edit(post.id, intruder).await,
            Err(PostServiceError::NotOwner)
        ));
        assert!(matches!(
            harness.service.get_for_edit(999, author).await,
            Err(PostServiceError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_page_recent_splits_at_ten() {
        let harness = setup().await;
        let author = create_user(&harness, "alice").await;
        for i in 0..15 {
            harness
                .service
                .create(author, text_input(&format!("post {i}")))
                .await
                .unwrap();
        }

        let first = harness.service.page_recent(1).await.unwrap();
        let second = harness.service.page_recent(2).await.unwrap();

        assert_eq!(first.items.len(), 10);
        assert_eq!(second.items.len(), 5);
        assert_eq!(first.total_pages, 2);
        assert!(first.has_next);
        assert!(!second.has_next);
        // Newest first across the page boundary.
        assert_eq!(first.items[0].text, "post 14");
        assert_eq!(second.items[4].text, "post 0");
    }

    #[tokio::test]
    async fn test_page_recent_clamps_out_of_range() {
        let harness = setup().await;
        let author = create_user(&harness, "alice").await;
        for i in 0..15 {
            harness
                .service
                .create(author, text_input(&format!("post {i}")))
                .await
                .unwrap();
        }

        let beyond = harness.service.page_recent(99).await.unwrap();
        assert_eq!(beyond.number, 2);
        assert_eq!(beyond.items.len(), 5);

        let below = harness.service.page_recent(-3).await.unwrap();
        assert_eq!(below.number, 1);
        assert_eq!(below.items.len(), 10);
    }

    #[tokio::test]
    async fn test_page_recent_empty() {
        let harness = setup().await;

        let page = harness.service.page_recent(1).await.unwrap();

        assert!(page.items.is_empty());
        assert_eq!(page.number, 1);
        assert_eq!(page.total_pages, 1);
    }

    #[tokio::test]
    async fn test_page_by_group_scopes_posts() {
        let harness = setup().await;
        let author = create_user(&harness, "alice").await;
        let rust = create_group(&harness, "rust").await;
        let other = create_group(&harness, "other").await;

        harness
            .service
            .create(
                author,
                PostInput {
                    text: "tagged".to_string(),
                    group_id: Some(rust),
                    image: None,
                },
            )
            .await
            .unwrap();
        harness
            .service
            .create(author, text_input("untagged"))
            .await
            .unwrap();

        let rust_page = harness.service.page_by_group(rust, 1).await.unwrap();
        let other_page = harness.service.page_by_group(other, 1).await.unwrap();

        assert_eq!(rust_page.items.len(), 1);
        assert_eq!(rust_page.items[0].text, "tagged");
        assert!(other_page.items.is_empty());
    }

    #[tokio::test]
    async fn test_page_by_author_and_count() {
        let harness = setup().await;
        let alice = create_user(&harness, "alice").await;
        let bob = create_user(&harness, "bob").await;

        harness.service.create(alice, text_input("a1")).await.unwrap();
        harness.service.create(alice, text_input("a2")).await.unwrap();
        harness.service.create(bob, text_input("b1")).await.unwrap();

        let page = harness.service.page_by_author(alice, 1).await.unwrap();

        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total_count, 2);
        assert_eq!(harness.service.count_by_author(alice).await.unwrap(), 2);
    }
}
