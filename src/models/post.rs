//! Post model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Post entity: a user-authored text entry, optionally tagged to a group and
/// carrying an optional image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    /// Unique identifier
    pub id: i64,
    /// Post body
    pub text: String,
    /// Authoring user ID
    pub author_id: i64,
    /// Group the post is tagged to, if any
    pub group_id: Option<i64>,
    /// Stored image filename under the media directory, if any
    pub image: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Post joined with the display names listings need
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostWithMeta {
    pub id: i64,
    pub text: String,
    pub author_id: i64,
    pub author_username: String,
    pub group_id: Option<i64>,
    pub group_title: Option<String>,
    pub group_slug: Option<String>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for inserting a new post row
#[derive(Debug, Clone)]
pub struct NewPost {
    pub text: String,
    pub author_id: i64,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

/// Input for updating an existing post.
///
/// `image: None` keeps the currently stored image; edits without a new upload
/// must not drop the old file reference.
#[derive(Debug, Clone)]
pub struct UpdatePost {
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}
