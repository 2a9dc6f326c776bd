//! Comment service.

use crate::db::repositories::{CommentRepository, PostRepository};
use crate::models::{Comment, CommentWithAuthor, NewComment};
use crate::services::pagination::{Page, Paginator};
use anyhow::Context;
use std::sync::Arc;

/// Error types for comment service operations
#[derive(Debug, thiserror::Error)]
pub enum CommentServiceError {
    /// The commented post does not exist
    #[error("Post not found")]
    PostNotFound,

    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Comment service.
pub struct CommentService {
    comment_repo: Arc<dyn CommentRepository>,
    post_repo: Arc<dyn PostRepository>,
    paginator: Paginator,
}

impl CommentService {
    pub fn new(
        comment_repo: Arc<dyn CommentRepository>,
        post_repo: Arc<dyn PostRepository>,
        per_page: i64,
    ) -> Self {
        Self {
            comment_repo,
            post_repo,
            paginator: Paginator::new(per_page),
        }
    }

    /// Add a comment to an existing post.
    pub async fn add(
        &self,
        post_id: i64,
        author_id: i64,
        text: &str,
    ) -> Result<Comment, CommentServiceError> {
        if text.trim().is_empty() {
            return Err(CommentServiceError::ValidationError(
                "Comment text cannot be empty".to_string(),
            ));
        }

        let post_exists = self
            .post_repo
            .get_by_id(post_id)
            .await
            .context("Failed to check post")?
            .is_some();
        if !post_exists {
            return Err(CommentServiceError::PostNotFound);
        }

        let comment = self
            .comment_repo
            .create(&NewComment {
                post_id,
                author_id,
                text: text.to_string(),
            })
            .await
            .context("Failed to create comment")?;

        Ok(comment)
    }

    /// A page of a post's comments, oldest first.
    pub async fn page_for_post(
        &self,
        post_id: i64,
        requested: i64,
    ) -> Result<Page<CommentWithAuthor>, CommentServiceError> {
        let total = self
            .comment_repo
            .count_by_post(post_id)
            .await
            .context("Failed to count comments")?;
        let number = self
            .paginator
            .clamp(requested, self.paginator.total_pages(total));
        let items = self
            .comment_repo
            .list_by_post(post_id, self.paginator.per_page(), self.paginator.offset(number))
            .await
            .context("Failed to list comments")?;

        Ok(self.paginator.page(items, number, total))
    }
}
