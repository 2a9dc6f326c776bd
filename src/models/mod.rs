//! Data models
//!
//! This module contains all data structures used throughout the Byline
//! platform. Models represent database entities plus the joined shapes the
//! listing pages render (posts and comments carrying their display names).

mod comment;
mod contact;
mod follow;
mod group;
mod post;
mod reset_token;
mod session;
mod user;

pub use comment::{Comment, CommentWithAuthor, NewComment};
pub use contact::{Contact, NewContact};
pub use follow::Follow;
pub use group::{Group, NewGroup};
pub use post::{NewPost, Post, PostWithMeta, UpdatePost};
pub use reset_token::PasswordResetToken;
pub use session::Session;
pub use user::{NewUser, User};
