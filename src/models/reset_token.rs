//! Password-reset token model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Single-use password-reset token.
///
/// Tokens are consumed on a successful reset and swept once expired.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordResetToken {
    /// The opaque token carried in the reset link
    pub token: String,
    /// User the token belongs to
    pub user_id: i64,
    /// Expiration timestamp
    pub expires_at: DateTime<Utc>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl PasswordResetToken {
    /// Check if the token has expired
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}
