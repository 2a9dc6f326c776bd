//! Shared helpers for the page handlers.

use axum::response::Html;
use chrono::{Datelike, Utc};
use serde::Deserialize;
use tera::Context;

use crate::models::User;
use crate::templates;
use crate::web::errors::PageError;

/// Site title shown in the header and the `<title>` tag
pub const SITE_NAME: &str = "Byline";

/// Query string carrying the requested listing page.
///
/// The raw value stays a string so that garbage like `?page=abc` can fall
/// back to page 1 instead of failing extraction.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: Option<String>,
}

/// Build the context every page template expects.
///
/// Templates always see `site_name`, `request_path`, `year` and, when someone
/// is logged in, `current_user`.
pub fn base_context(current_user: Option<&User>, request_path: &str) -> Context {
    let mut context = Context::new();
    context.insert("site_name", SITE_NAME);
    context.insert("request_path", request_path);
    context.insert("year", &Utc::now().year());
    if let Some(user) = current_user {
        context.insert("current_user", user);
    }
    context
}

/// Render a template into an HTML response.
pub fn render_page(template: &str, context: &Context) -> Result<Html<String>, PageError> {
    let html = templates::render(template, context)?;
    Ok(Html(html))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user() -> User {
        User {
            id: 1,
            username: "alice".to_string(),
            email: "alice@example.org".to_string(),
            password_hash: "hash".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_base_context_without_user() {
        let context = base_context(None, "/posts/1/");

        assert_eq!(
            context.get("site_name").and_then(|v| v.as_str()),
            Some(SITE_NAME)
        );
        assert_eq!(
            context.get("request_path").and_then(|v| v.as_str()),
            Some("/posts/1/")
        );
        assert!(context.get("current_user").is_none());
    }

    #[test]
    fn test_base_context_with_user() {
        let u = user();
        let context = base_context(Some(&u), "/");

        let current = context.get("current_user").expect("User should be set");
        assert_eq!(
            current.get("username").and_then(|v| v.as_str()),
            Some("alice")
        );
        // The hash is marked skip_serializing and must never reach templates.
        assert!(current.get("password_hash").is_none());
    }
}
