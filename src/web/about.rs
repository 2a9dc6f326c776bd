//! Static informational pages.

use axum::response::{IntoResponse, Response};

use crate::web::common::{base_context, render_page};
use crate::web::errors::PageError;
use crate::web::middleware::CurrentUser;

/// GET /about/author/
pub async fn author(CurrentUser(user): CurrentUser) -> Result<Response, PageError> {
    let context = base_context(user.as_ref(), "/about/author/");
    Ok(render_page("about/author.html", &context)?.into_response())
}

/// GET /about/tech/
pub async fn tech(CurrentUser(user): CurrentUser) -> Result<Response, PageError> {
    let context = base_context(user.as_ref(), "/about/tech/");
    Ok(render_page("about/tech.html", &context)?.into_response())
}
