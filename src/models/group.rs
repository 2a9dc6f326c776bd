//! Group model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named community that posts can be tagged with.
///
/// Groups are addressed by slug in URLs (`/group/<slug>/`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    /// Unique identifier
    pub id: i64,
    /// Display title
    pub title: String,
    /// URL slug (unique)
    pub slug: String,
    /// Free-form description shown on the group page
    pub description: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Input for inserting a new group row
#[derive(Debug, Clone)]
pub struct NewGroup {
    pub title: String,
    pub slug: String,
    pub description: String,
}
