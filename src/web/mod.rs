//! Web layer: routing, session and CSRF middleware, page handlers, and the
//! error pages.

pub mod about;
pub mod common;
pub mod errors;
pub mod forms;
pub mod middleware;
pub mod posts;
pub mod static_files;
pub mod users;


use axum::extract::DefaultBodyLimit;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

pub use middleware::AppState;

/// Build the application router with every page wired up.
///
/// Paths carry trailing slashes; a request without one is a 404 like any
/// other unknown path.
pub fn build_router(state: AppState) -> Router {
    // Multipart bodies may carry an image up to the configured cap, plus a
    // little slack for the text fields around it.
    let body_limit = state.config.uploads.max_file_size as usize + 64 * 1024;

    Router::new()
        .route("/", get(posts::index))
        .route("/group/{slug}/", get(posts::group_posts))
        .route("/profile/{username}/", get(posts::profile))
        .route("/profile/{username}/follow/", get(posts::profile_follow))
        .route("/profile/{username}/unfollow/", get(posts::profile_unfollow))
        .route("/posts/{id}/", get(posts::post_detail))
        .route(
            "/posts/{id}/edit/",
            get(posts::edit_post_page).post(posts::edit_post_submit),
        )
        .route("/posts/{id}/comment/", post(posts::add_comment))
        .route(
            "/create/",
            get(posts::create_post_page).post(posts::create_post_submit),
        )
        .route("/follow/", get(posts::follow_index))
        .route("/about/author/", get(about::author))
        .route("/about/tech/", get(about::tech))
        .route(
            "/auth/signup/",
            get(users::signup_page).post(users::signup_submit),
        )
        .route(
            "/auth/login/",
            get(users::login_page).post(users::login_submit),
        )
        .route("/auth/logout/", get(users::logout))
        .route(
            "/auth/password_change/",
            get(users::password_change_page).post(users::password_change_submit),
        )
        .route(
            "/auth/password_change/done/",
            get(users::password_change_done),
        )
        .route(
            "/auth/password_reset/",
            get(users::password_reset_page).post(users::password_reset_submit),
        )
        .route("/auth/password_reset/done/", get(users::password_reset_done))
        .route("/auth/reset/done/", get(users::reset_complete))
        .route(
            "/auth/reset/{uid}/{token}/",
            get(users::reset_confirm_page).post(users::reset_confirm_submit),
        )
        .route(
            "/contact/",
            get(users::contact_page).post(users::contact_submit),
        )
        .route("/thank-you/", get(users::thank_you))
        .route("/media/{filename}", get(static_files::serve_media))
        .route("/static/{*path}", get(static_files::serve_static))
        .fallback(errors::not_found_page)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(from_fn(middleware::ensure_csrf_cookie))
        .layer(from_fn_with_state(state.clone(), middleware::load_user))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
