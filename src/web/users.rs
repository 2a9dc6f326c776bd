//! Account pages: signup, login and logout, password change and reset, and
//! the contact form.
//!
//! Form validation failures re-render the form with the message and keep the
//! status at 200; only CSRF failures and internal faults become error pages.

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use serde::Deserialize;

use crate::models::{NewContact, User};
use crate::services::{ContactServiceError, LoginInput, RegisterInput, UserServiceError};
use crate::web::common::{base_context, render_page};
use crate::web::errors::PageError;
use crate::web::forms::{
    ContactForm, LoginForm, PasswordChangeForm, PasswordResetForm, SetPasswordForm, SignupForm,
};
use crate::web::middleware::{
    clear_session_cookie, session_cookie, AppState, CsrfToken, CurrentUser, RequireUser,
    SessionToken,
};

/// Query string carrying the post-login destination.
#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    #[serde(default)]
    pub next: Option<String>,
}

/// Restrict the post-login destination to a local path.
///
/// Anything not starting with a single `/` falls back to the front page, so
/// a crafted link cannot bounce the user to another host.
fn sanitize_next(next: Option<&str>) -> String {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path.to_string(),
        _ => "/".to_string(),
    }
}

fn set_cookie_headers(cookie: &str) -> Result<HeaderMap, PageError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_str(cookie).map_err(PageError::internal)?,
    );
    Ok(headers)
}

/// GET /auth/signup/
pub async fn signup_page(
    CurrentUser(user): CurrentUser,
    csrf: CsrfToken,
) -> Result<Response, PageError> {
    if user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    let mut context = base_context(None, "/auth/signup/");
    context.insert("csrf_token", &csrf.0);
    Ok(render_page("users/signup.html", &context)?.into_response())
}

/// POST /auth/signup/
///
/// A fresh account is not logged in automatically; success lands on the
/// login page.
pub async fn signup_submit(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    csrf: CsrfToken,
    Form(form): Form<SignupForm>,
) -> Result<Response, PageError> {
    if user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }
    if !csrf.matches(&form.csrf_token) {
        return Err(PageError::CsrfRejected);
    }

    if form.password1 != form.password2 {
        return signup_again(&csrf, &form, "Passwords do not match");
    }

    let input = RegisterInput::new(&form.username, &form.email, &form.password1);
    match state.user_service.register(input).await {
        Ok(_) => Ok(Redirect::to("/auth/login/").into_response()),
        Err(UserServiceError::ValidationError(message)) => signup_again(&csrf, &form, &message),
        Err(UserServiceError::UserExists(message)) => signup_again(&csrf, &form, &message),
        Err(err) => Err(err.into()),
    }
}

fn signup_again(csrf: &CsrfToken, form: &SignupForm, error: &str) -> Result<Response, PageError> {
    let mut context = base_context(None, "/auth/signup/");
    context.insert("csrf_token", &csrf.0);
    context.insert("error", error);
    context.insert("form_username", &form.username);
    context.insert("form_email", &form.email);
    Ok(render_page("users/signup.html", &context)?.into_response())
}

/// GET /auth/login/
pub async fn login_page(
    CurrentUser(user): CurrentUser,
    csrf: CsrfToken,
    Query(query): Query<NextQuery>,
) -> Result<Response, PageError> {
    if user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    let mut context = base_context(None, "/auth/login/");
    context.insert("csrf_token", &csrf.0);
    if let Some(next) = &query.next {
        context.insert("next", next);
    }
    Ok(render_page("users/login.html", &context)?.into_response())
}

/// POST /auth/login/
pub async fn login_submit(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    csrf: CsrfToken,
    Form(form): Form<LoginForm>,
) -> Result<Response, PageError> {
    if user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }
    if !csrf.matches(&form.csrf_token) {
        return Err(PageError::CsrfRejected);
    }

    let input = LoginInput::new(&form.username, &form.password);
    match state.user_service.login(input).await {
        Ok(session) => {
            let max_age = state.config.auth.session_days * 24 * 60 * 60;
            let headers = set_cookie_headers(&session_cookie(&session.id, max_age))?;
            let target = sanitize_next(form.next.as_deref());
            Ok((headers, Redirect::to(&target)).into_response())
        }
        Err(UserServiceError::AuthenticationError(_)) => {
            let mut context = base_context(None, "/auth/login/");
            context.insert("csrf_token", &csrf.0);
            context.insert("error", "Invalid username or password");
            context.insert("form_username", &form.username);
            if let Some(next) = &form.next {
                context.insert("next", next);
            }
            Ok(render_page("users/login.html", &context)?.into_response())
        }
        Err(err) => Err(err.into()),
    }
}

/// GET /auth/logout/
///
/// Destroys the session if one exists and renders the logged-out page with
/// the cookie cleared.
pub async fn logout(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
) -> Result<Response, PageError> {
    if let Some(token) = token {
        state.user_service.logout(&token).await?;
    }

    let headers = set_cookie_headers(&clear_session_cookie())?;
    let context = base_context(None, "/auth/logout/");
    Ok((headers, render_page("users/logged_out.html", &context)?).into_response())
}

/// GET /auth/password_change/
pub async fn password_change_page(
    RequireUser(user): RequireUser,
    csrf: CsrfToken,
) -> Result<Response, PageError> {
    let mut context = base_context(Some(&user), "/auth/password_change/");
    context.insert("csrf_token", &csrf.0);
    Ok(render_page("users/password_change_form.html", &context)?.into_response())
}

/// POST /auth/password_change/
pub async fn password_change_submit(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    csrf: CsrfToken,
    Form(form): Form<PasswordChangeForm>,
) -> Result<Response, PageError> {
    if !csrf.matches(&form.csrf_token) {
        return Err(PageError::CsrfRejected);
    }

    if form.new_password1 != form.new_password2 {
        return password_change_again(&user, &csrf, "Passwords do not match");
    }

    match state
        .user_service
        .change_password(user.id, &form.old_password, &form.new_password1)
        .await
    {
        Ok(()) => Ok(Redirect::to("/auth/password_change/done/").into_response()),
        Err(UserServiceError::AuthenticationError(message)) => {
            password_change_again(&user, &csrf, &message)
        }
        Err(UserServiceError::ValidationError(message)) => {
            password_change_again(&user, &csrf, &message)
        }
        Err(err) => Err(err.into()),
    }
}

fn password_change_again(
    user: &User,
    csrf: &CsrfToken,
    error: &str,
) -> Result<Response, PageError> {
    let mut context = base_context(Some(user), "/auth/password_change/");
    context.insert("csrf_token", &csrf.0);
    context.insert("error", error);
    Ok(render_page("users/password_change_form.html", &context)?.into_response())
}

/// GET /auth/password_change/done/
pub async fn password_change_done(
    RequireUser(user): RequireUser,
) -> Result<Response, PageError> {
    let context = base_context(Some(&user), "/auth/password_change/done/");
    Ok(render_page("users/password_change_done.html", &context)?.into_response())
}

/// GET /auth/password_reset/
pub async fn password_reset_page(
    CurrentUser(user): CurrentUser,
    csrf: CsrfToken,
) -> Result<Response, PageError> {
    let mut context = base_context(user.as_ref(), "/auth/password_reset/");
    context.insert("csrf_token", &csrf.0);
    Ok(render_page("users/password_reset_form.html", &context)?.into_response())
}

/// POST /auth/password_reset/
///
/// Proceeds to the "email sent" page no matter whether the address belongs
/// to an account.
pub async fn password_reset_submit(
    State(state): State<AppState>,
    csrf: CsrfToken,
    Form(form): Form<PasswordResetForm>,
) -> Result<Response, PageError> {
    if !csrf.matches(&form.csrf_token) {
        return Err(PageError::CsrfRejected);
    }

    state.user_service.start_password_reset(&form.email).await?;

    Ok(Redirect::to("/auth/password_reset/done/").into_response())
}

/// GET /auth/password_reset/done/
pub async fn password_reset_done(
    CurrentUser(user): CurrentUser,
) -> Result<Response, PageError> {
    let context = base_context(user.as_ref(), "/auth/password_reset/done/");
    Ok(render_page("users/password_reset_done.html", &context)?.into_response())
}

/// GET /auth/reset/{uid}/{token}/
///
/// A dead link is not an error page: the template renders its invalid-link
/// state at 200 so the user gets an explanation and a way to restart.
pub async fn reset_confirm_page(
    State(state): State<AppState>,
    csrf: CsrfToken,
    Path((uid, token)): Path<(i64, String)>,
) -> Result<Response, PageError> {
    let valid = state.user_service.verify_reset_token(uid, &token).await?;

    let mut context = base_context(None, &format!("/auth/reset/{uid}/{token}/"));
    context.insert("csrf_token", &csrf.0);
    context.insert("validlink", &valid);
    Ok(render_page("users/password_reset_confirm.html", &context)?.into_response())
}

/// POST /auth/reset/{uid}/{token}/
pub async fn reset_confirm_submit(
    State(state): State<AppState>,
    csrf: CsrfToken,
    Path((uid, token)): Path<(i64, String)>,
    Form(form): Form<SetPasswordForm>,
) -> Result<Response, PageError> {
    if !csrf.matches(&form.csrf_token) {
        return Err(PageError::CsrfRejected);
    }

    let path = format!("/auth/reset/{uid}/{token}/");

    if form.new_password1 != form.new_password2 {
        return reset_confirm_again(&csrf, &path, "Passwords do not match");
    }

    match state
        .user_service
        .confirm_password_reset(uid, &token, &form.new_password1)
        .await
    {
        Ok(()) => Ok(Redirect::to("/auth/reset/done/").into_response()),
        Err(UserServiceError::InvalidResetToken) => {
            let mut context = base_context(None, &path);
            context.insert("validlink", &false);
            Ok(render_page("users/password_reset_confirm.html", &context)?.into_response())
        }
        Err(UserServiceError::ValidationError(message)) => {
            reset_confirm_again(&csrf, &path, &message)
        }
        Err(err) => Err(err.into()),
    }
}

fn reset_confirm_again(csrf: &CsrfToken, path: &str, error: &str) -> Result<Response, PageError> {
    let mut context = base_context(None, path);
    context.insert("csrf_token", &csrf.0);
    context.insert("validlink", &true);
    context.insert("error", error);
    Ok(render_page("users/password_reset_confirm.html", &context)?.into_response())
}

/// GET /auth/reset/done/
pub async fn reset_complete(CurrentUser(user): CurrentUser) -> Result<Response, PageError> {
    let context = base_context(user.as_ref(), "/auth/reset/done/");
    Ok(render_page("users/password_reset_complete.html", &context)?.into_response())
}

/// GET /contact/
pub async fn contact_page(
    CurrentUser(user): CurrentUser,
    csrf: CsrfToken,
) -> Result<Response, PageError> {
    let mut context = base_context(user.as_ref(), "/contact/");
    context.insert("csrf_token", &csrf.0);
    Ok(render_page("users/contact.html", &context)?.into_response())
}

/// POST /contact/
pub async fn contact_submit(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    csrf: CsrfToken,
    Form(form): Form<ContactForm>,
) -> Result<Response, PageError> {
    if !csrf.matches(&form.csrf_token) {
        return Err(PageError::CsrfRejected);
    }

    let input = NewContact {
        name: form.name.clone(),
        email: form.email.clone(),
        subject: form.subject.clone(),
        body: form.body.clone(),
    };
    match state.contact_service.submit(input).await {
        Ok(_) => Ok(Redirect::to("/thank-you/").into_response()),
        Err(ContactServiceError::ValidationError(message)) => {
            let mut context = base_context(user.as_ref(), "/contact/");
            context.insert("csrf_token", &csrf.0);
            context.insert("error", &message);
            context.insert("form_name", &form.name);
            context.insert("form_email", &form.email);
            context.insert("form_subject", &form.subject);
            context.insert("form_body", &form.body);
            Ok(render_page("users/contact.html", &context)?.into_response())
        }
        Err(err) => Err(err.into()),
    }
}

/// GET /thank-you/
pub async fn thank_you(CurrentUser(user): CurrentUser) -> Result<Response, PageError> {
    let context = base_context(user.as_ref(), "/thank-you/");
    Ok(render_page("users/thank_you.html", &context)?.into_response())
}
