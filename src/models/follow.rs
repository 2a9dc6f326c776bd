//! Follow model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A directed subscription from one user to another author.
///
/// The (user_id, author_id) pair is unique at the storage layer and a user
/// never follows themselves; both rules are enforced before rows get here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Follow {
    /// Unique identifier
    pub id: i64,
    /// The follower
    pub user_id: i64,
    /// The followed author
    pub author_id: i64,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}
