//! Contact message model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A message submitted through the contact form.
///
/// Messages are stored for review; `is_answered` is flipped out-of-band by
/// whoever handles the inbox.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    /// Unique identifier
    pub id: i64,
    /// Sender name
    pub name: String,
    /// Sender email
    pub email: String,
    /// Message subject
    pub subject: String,
    /// Message body
    pub body: String,
    /// Whether the message has been answered
    pub is_answered: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Input for inserting a new contact row
#[derive(Debug, Clone)]
pub struct NewContact {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub body: String,
}
