//! Follow service.
//!
//! Following is directional and idempotent. Following yourself or an author
//! you already follow does nothing, and unfollowing someone you never
//! followed is equally quiet. The pages just redirect back either way.

use crate::db::repositories::FollowRepository;
use anyhow::Context;
use std::sync::Arc;

/// Error types for follow service operations
#[derive(Debug, thiserror::Error)]
pub enum FollowServiceError {
    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Follow service.
pub struct FollowService {
    follow_repo: Arc<dyn FollowRepository>,
}

impl FollowService {
    pub fn new(follow_repo: Arc<dyn FollowRepository>) -> Self {
        Self { follow_repo }
    }

    /// Start following an author. Self-follows are ignored.
    pub async fn follow(&self, user_id: i64, author_id: i64) -> Result<(), FollowServiceError> {
        if user_id == author_id {
            return Ok(());
        }

        let created = self
            .follow_repo
            .insert_if_absent(user_id, author_id)
            .await
            .context("Failed to create follow")?;

        if created {
            tracing::debug!(user_id, author_id, "New follow");
        }

        Ok(())
    }

    /// Stop following an author.
    pub async fn unfollow(&self, user_id: i64, author_id: i64) -> Result<(), FollowServiceError> {
        self.follow_repo
            .delete(user_id, author_id)
            .await
            .context("Failed to delete follow")?;

        Ok(())
    }

    /// Whether `user_id` follows `author_id`.
    pub async fn is_following(
        &self,
        user_id: i64,
        author_id: i64,
    ) -> Result<bool, FollowServiceError> {
        let following = self
            .follow_repo
            .exists(user_id, author_id)
            .await
            .context("Failed to check follow")?;

        Ok(following)
    }

    /// How many authors a user follows.
    pub async fn following_count(&self, user_id: i64) -> Result<i64, FollowServiceError> {
        let count = self
            .follow_repo
            .count_following(user_id)
            .await
            .context("Failed to count following")?;

        Ok(count)
    }

    /// How many users follow an author.
    pub async fn follower_count(&self, author_id: i64) -> Result<i64, FollowServiceError> {
        let count = self
            .follow_repo
            .count_followers(author_id)
            .await
            .context("Failed to count followers")?;

        Ok(count)
    }
}
