//! Business logic services
//!
//! Services sit between the web handlers and the repositories. A service
//! owns validation and the rules of its slice of the site and reports
//! failures through its own error enum; handlers translate those into
//! pages and redirects.

pub mod comment;
pub mod contact;
pub mod follow;
pub mod group;
pub mod mailer;
pub mod pagination;
pub mod password;
pub mod post;
pub mod user;

pub use comment::{CommentService, CommentServiceError};
pub use contact::{ContactService, ContactServiceError};
pub use follow::{FollowService, FollowServiceError};
pub use group::{GroupService, GroupServiceError};
pub use mailer::Mailer;
pub use pagination::{parse_page_param, Page, Paginator};
pub use password::{hash_password, verify_password};
pub use post::{PostInput, PostService, PostServiceError};
pub use user::{LoginInput, RegisterInput, UserService, UserServiceError};
