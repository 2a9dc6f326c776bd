//! Error pages.
//!
//! Handlers fail with a [`PageError`], which renders one of the dedicated
//! error templates. If the template itself cannot render, a bare HTML page
//! goes out as the last resort so the status code still reaches the client.

use axum::http::{StatusCode, Uri};
use axum::response::{Html, IntoResponse, Response};
use tera::Context;

use crate::services::{
    CommentServiceError, ContactServiceError, FollowServiceError, GroupServiceError,
    PostServiceError, UserServiceError,
};
use crate::templates;

/// Failure modes a page handler can surface to the client.
#[derive(Debug)]
pub enum PageError {
    /// Resource does not exist
    NotFound,
    /// Access denied
    Forbidden,
    /// CSRF token missing or mismatched
    CsrfRejected,
    /// Anything unexpected; renders the 500 page
    Internal(anyhow::Error),
}

impl PageError {
    pub fn internal<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Internal(anyhow::Error::new(err))
    }
}

impl From<anyhow::Error> for PageError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

// Default mappings from service errors. Handlers that need a different
// outcome for a variant (a silent redirect, a re-rendered form) match on it
// before reaching for `?`.

impl From<PostServiceError> for PageError {
    fn from(err: PostServiceError) -> Self {
        match err {
            PostServiceError::NotFound => Self::NotFound,
            PostServiceError::NotOwner => Self::Forbidden,
            PostServiceError::ValidationError(msg) => Self::Internal(anyhow::anyhow!(msg)),
            PostServiceError::InternalError(e) => Self::Internal(e),
        }
    }
}

impl From<CommentServiceError> for PageError {
    fn from(err: CommentServiceError) -> Self {
        match err {
            CommentServiceError::PostNotFound => Self::NotFound,
            CommentServiceError::ValidationError(msg) => Self::Internal(anyhow::anyhow!(msg)),
            CommentServiceError::InternalError(e) => Self::Internal(e),
        }
    }
}

impl From<UserServiceError> for PageError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::InternalError(e) => Self::Internal(e),
            other => Self::Internal(anyhow::anyhow!(other.to_string())),
        }
    }
}

impl From<GroupServiceError> for PageError {
    fn from(err: GroupServiceError) -> Self {
        match err {
            GroupServiceError::InternalError(e) => Self::Internal(e),
            other => Self::Internal(anyhow::anyhow!(other.to_string())),
        }
    }
}

impl From<FollowServiceError> for PageError {
    fn from(err: FollowServiceError) -> Self {
        match err {
            FollowServiceError::InternalError(e) => Self::Internal(e),
        }
    }
}

impl From<ContactServiceError> for PageError {
    fn from(err: ContactServiceError) -> Self {
        match err {
            ContactServiceError::InternalError(e) => Self::Internal(e),
            other => Self::Internal(anyhow::anyhow!(other.to_string())),
        }
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let (status, template) = match &self {
            Self::NotFound => (StatusCode::NOT_FOUND, "core/404.html"),
            Self::Forbidden => (StatusCode::FORBIDDEN, "core/403.html"),
            Self::CsrfRejected => (StatusCode::FORBIDDEN, "core/403csrf.html"),
            Self::Internal(err) => {
                tracing::error!(error = ?err, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "core/500.html")
            }
        };

        render_error_page(status, template, &Context::new())
    }
}

/// Router fallback for paths no route matched.
pub async fn not_found_page(uri: Uri) -> Response {
    let mut context = Context::new();
    context.insert("path", uri.path());
    render_error_page(StatusCode::NOT_FOUND, "core/404.html", &context)
}

fn render_error_page(status: StatusCode, template: &str, context: &Context) -> Response {
    match templates::render(template, context) {
        Ok(html) => (status, Html(html)).into_response(),
        Err(err) => {
            tracing::error!(error = %err, template, "Failed to render error page");
            (status, Html(simple_error_page(status))).into_response()
        }
    }
}

fn simple_error_page(status: StatusCode) -> String {
    format!(
        "<!DOCTYPE html><html><head><title>{status}</title></head>\
         <body><h1>{status}</h1></body></html>",
    )
}
