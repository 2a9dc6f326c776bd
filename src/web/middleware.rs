//! Request middleware and extractors.
//!
//! Two middleware layers run on every request: one resolves the session
//! cookie to a user and parks it in the request extensions, the other
//! guarantees a CSRF cookie exists. Handlers pick the results up through
//! the [`CurrentUser`], [`RequireUser`] and [`CsrfToken`] extractors.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::convert::Infallible;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::Config;
use crate::models::User;
use crate::services::{
    CommentService, ContactService, FollowService, GroupService, PostService, UserService,
};

/// Session cookie name.
pub const SESSION_COOKIE: &str = "session";

/// CSRF cookie name.
pub const CSRF_COOKIE: &str = "csrftoken";

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub user_service: Arc<UserService>,
    pub post_service: Arc<PostService>,
    pub group_service: Arc<GroupService>,
    pub comment_service: Arc<CommentService>,
    pub follow_service: Arc<FollowService>,
    pub contact_service: Arc<ContactService>,
}

/// Authenticated user resolved from the session cookie.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

/// CSRF token bound to this client, minted by [`ensure_csrf_cookie`].
#[derive(Debug, Clone)]
struct RequestCsrf(String);

/// Reads a cookie out of a request's headers.
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookie_header = headers.get(header::COOKIE)?;
    let cookie_str = cookie_header.to_str().ok()?;
    for cookie in cookie_str.split(';') {
        let cookie = cookie.trim();
        if let Some(value) = cookie.strip_prefix(name) {
            if let Some(value) = value.strip_prefix('=') {
                return Some(value.to_string());
            }
        }
    }
    None
}

/// Builds the session cookie sent after login.
pub fn session_cookie(token: &str, max_age_secs: i64) -> String {
    format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}")
}

/// Builds the cookie that removes a session.
pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// Resolves the session cookie to a user for every request.
///
/// Never rejects; pages that require login enforce it via [`RequireUser`].
pub async fn load_user(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = extract_cookie(request.headers(), SESSION_COOKIE) {
        if let Ok(Some(user)) = state.user_service.validate_session(&token).await {
            request.extensions_mut().insert(AuthenticatedUser(user));
        }
    }
    next.run(request).await
}

/// Guarantees every client carries a CSRF cookie.
///
/// The token also rides along in the request extensions so templates can
/// embed it in forms; POST handlers compare the submitted field against the
/// cookie value.
pub async fn ensure_csrf_cookie(mut request: Request, next: Next) -> Response {
    let existing = extract_cookie(request.headers(), CSRF_COOKIE);
    let token = existing
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    request.extensions_mut().insert(RequestCsrf(token.clone()));

    let mut response = next.run(request).await;

    if existing.is_none() {
        let cookie = format!("{CSRF_COOKIE}={token}; Path=/; SameSite=Lax");
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }

    response
}

/// The logged-in user, if any.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Option<User>);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .map(|auth| auth.0.clone());
        Ok(CurrentUser(user))
    }
}

/// The logged-in user; anonymous requests bounce to the login page with the
/// original path as the return target.
#[derive(Debug, Clone)]
pub struct RequireUser(pub User);

impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<AuthenticatedUser>() {
            Some(auth) => Ok(RequireUser(auth.0.clone())),
            None => {
                let target = parts
                    .uri
                    .path_and_query()
                    .map(|pq| pq.as_str())
                    .unwrap_or("/");
                Err(Redirect::to(&login_redirect(target)).into_response())
            }
        }
    }
}

/// Login URL with the original request as the return target.
///
/// Slashes stay readable in the query value; everything else that could
/// confuse query parsing is percent-encoded.
fn login_redirect(target: &str) -> String {
    let encoded = urlencoding::encode(target).replace("%2F", "/");
    format!("/auth/login/?next={encoded}")
}

/// This client's CSRF token.
#[derive(Debug, Clone)]
pub struct CsrfToken(pub String);

impl CsrfToken {
    /// Compares a submitted form token against the cookie-bound one.
    pub fn matches(&self, submitted: &str) -> bool {
        !self.0.is_empty() && self.0 == submitted
    }
}

impl<S> FromRequestParts<S> for CsrfToken
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .extensions
            .get::<RequestCsrf>()
            .map(|csrf| csrf.0.clone())
            .unwrap_or_default();
        Ok(CsrfToken(token))
    }
}

/// The raw session cookie value, for logout.
#[derive(Debug, Clone)]
pub struct SessionToken(pub Option<String>);

impl<S> FromRequestParts<S> for SessionToken
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(SessionToken(extract_cookie(&parts.headers, SESSION_COOKIE)))
    }
}
