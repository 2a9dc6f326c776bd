//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles the queries one entity needs: creation and lookup
//! plus the filtered listings the pages are built from.

pub mod comment;
pub mod contact;
pub mod follow;
pub mod group;
pub mod post;
pub mod reset_token;
pub mod session;
pub mod user;

pub use comment::{CommentRepository, SqlxCommentRepository};
pub use contact::{ContactRepository, SqlxContactRepository};
pub use follow::{FollowRepository, SqlxFollowRepository};
pub use group::{GroupRepository, SqlxGroupRepository};
pub use post::{PostRepository, SqlxPostRepository};
pub use reset_token::{ResetTokenRepository, SqlxResetTokenRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use user::{SqlxUserRepository, UserRepository};
