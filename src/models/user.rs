//! User model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User entity representing a registered author.
///
/// Everyone who registers can write posts, comment and follow other authors;
/// there are no roles beyond that.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: i64,
    /// Username (unique)
    pub username: String,
    /// Email address (unique)
    pub email: String,
    /// Password hash (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Input for inserting a new user row.
///
/// The password must already be hashed; use
/// `services::password::hash_password()`.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}
