//! Post pages.
//!
//! Listings (front page, group, profile, feed), the post detail page with
//! its comments, and the create/edit/comment/follow actions.

use axum::extract::{Multipart, Path, Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;

use crate::models::User;
use crate::services::{parse_page_param, CommentServiceError, PostInput, PostServiceError};
use crate::web::common::{base_context, render_page, PageQuery};
use crate::web::errors::PageError;
use crate::web::forms::{parse_post_form, CommentForm, PostForm, PostFormError};
use crate::web::middleware::{AppState, CsrfToken, CurrentUser, RequireUser};

/// GET / front page, all posts newest first.
pub async fn index(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<PageQuery>,
) -> Result<Response, PageError> {
    let requested = parse_page_param(query.page.as_deref());
    let page = state.post_service.page_recent(requested).await?;

    let mut context = base_context(user.as_ref(), "/");
    context.insert("page", &page);
    Ok(render_page("posts/index.html", &context)?.into_response())
}

/// GET /group/{slug}/ posts tagged to one group.
pub async fn group_posts(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Response, PageError> {
    let group = state
        .group_service
        .get_by_slug(&slug)
        .await?
        .ok_or(PageError::NotFound)?;

    let requested = parse_page_param(query.page.as_deref());
    let page = state.post_service.page_by_group(group.id, requested).await?;

    let mut context = base_context(user.as_ref(), &format!("/group/{slug}/"));
    context.insert("group", &group);
    context.insert("page", &page);
    Ok(render_page("posts/group_list.html", &context)?.into_response())
}

/// GET /profile/{username}/ an author's posts plus their follow numbers.
pub async fn profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Response, PageError> {
    let author = state
        .user_service
        .get_by_username(&username)
        .await?
        .ok_or(PageError::NotFound)?;

    let requested = parse_page_param(query.page.as_deref());
    let page = state.post_service.page_by_author(author.id, requested).await?;
    let post_count = state.post_service.count_by_author(author.id).await?;
    let following_count = state.follow_service.following_count(author.id).await?;
    let follower_count = state.follow_service.follower_count(author.id).await?;

    let is_self = user.as_ref().map(|u| u.id == author.id).unwrap_or(false);
    let is_following = match &user {
        Some(viewer) if !is_self => {
            state
                .follow_service
                .is_following(viewer.id, author.id)
                .await?
        }
        _ => false,
    };

    let mut context = base_context(user.as_ref(), &format!("/profile/{username}/"));
    context.insert("author", &author);
    context.insert("page", &page);
    context.insert("post_count", &post_count);
    context.insert("following_count", &following_count);
    context.insert("follower_count", &follower_count);
    context.insert("is_self", &is_self);
    context.insert("is_following", &is_following);
    Ok(render_page("posts/profile.html", &context)?.into_response())
}

/// GET /posts/{id}/ one post with its comments, comments paginated.
pub async fn post_detail(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    csrf: CsrfToken,
    Path(post_id): Path<i64>,
    Query(query): Query<PageQuery>,
) -> Result<Response, PageError> {
    let post = state
        .post_service
        .get(post_id)
        .await?
        .ok_or(PageError::NotFound)?;

    let requested = parse_page_param(query.page.as_deref());
    let comments = state.comment_service.page_for_post(post_id, requested).await?;
    let author_post_count = state.post_service.count_by_author(post.author_id).await?;

    let mut context = base_context(user.as_ref(), &format!("/posts/{post_id}/"));
    context.insert("csrf_token", &csrf.0);
    context.insert("post", &post);
    context.insert("comments", &comments);
    context.insert("author_post_count", &author_post_count);
    context.insert(
        "is_author",
        &user.as_ref().map(|u| u.id == post.author_id).unwrap_or(false),
    );
    Ok(render_page("posts/post_detail.html", &context)?.into_response())
}

/// GET /create/ the new-post form.
pub async fn create_post_page(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    csrf: CsrfToken,
) -> Result<Response, PageError> {
    let groups = state.group_service.list_all().await?;

    let mut context = base_context(Some(&user), "/create/");
    context.insert("csrf_token", &csrf.0);
    context.insert("groups", &groups);
    context.insert("is_edit", &false);
    Ok(render_page("posts/create_post.html", &context)?.into_response())
}

/// POST /create/ submit a new post.
///
/// Success lands on the author's own profile. A validation problem
/// re-renders the form with the message, still as a 200.
pub async fn create_post_submit(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    csrf: CsrfToken,
    multipart: Multipart,
) -> Result<Response, PageError> {
    let form = match parse_post_form(multipart, &state.config.uploads).await {
        Ok(form) => form,
        Err(PostFormError::Invalid(message)) => {
            return post_form_again(
                &state,
                &user,
                &csrf,
                "/create/",
                None,
                PostForm::default(),
                message,
            )
            .await;
        }
        Err(PostFormError::Internal(err)) => return Err(PageError::Internal(err)),
    };

    if !csrf.matches(&form.csrf_token) {
        return Err(PageError::CsrfRejected);
    }

    let input = PostInput {
        text: form.text.clone(),
        group_id: form.group_id,
        image: form.image.clone(),
    };
    match state.post_service.create(user.id, input).await {
        Ok(_) => Ok(Redirect::to(&format!("/profile/{}/", user.username)).into_response()),
        Err(PostServiceError::ValidationError(message)) => {
            post_form_again(&state, &user, &csrf, "/create/", None, form, message).await
        }
        Err(err) => Err(err.into()),
    }
}

/// GET /posts/{id}/edit/ the edit form, author only.
///
/// Someone else's post is not an error page here, the user just lands back
/// on the detail view.
pub async fn edit_post_page(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    csrf: CsrfToken,
    Path(post_id): Path<i64>,
) -> Result<Response, PageError> {
    let post = match state.post_service.get_for_edit(post_id, user.id).await {
        Ok(post) => post,
        Err(PostServiceError::NotOwner) => {
            return Ok(Redirect::to(&format!("/posts/{post_id}/")).into_response());
        }
        Err(err) => return Err(err.into()),
    };

    let groups = state.group_service.list_all().await?;

    let mut context = base_context(Some(&user), &format!("/posts/{post_id}/edit/"));
    context.insert("csrf_token", &csrf.0);
    context.insert("groups", &groups);
    context.insert("is_edit", &true);
    context.insert("post_id", &post_id);
    context.insert("form_text", &post.text);
    context.insert("form_group_id", &post.group_id);
    context.insert("current_image", &post.image);
    Ok(render_page("posts/create_post.html", &context)?.into_response())
}

/// POST /posts/{id}/edit/ submit an edit, author only.
pub async fn edit_post_submit(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    csrf: CsrfToken,
    Path(post_id): Path<i64>,
    multipart: Multipart,
) -> Result<Response, PageError> {
    let path = format!("/posts/{post_id}/edit/");
    let form = match parse_post_form(multipart, &state.config.uploads).await {
        Ok(form) => form,
        Err(PostFormError::Invalid(message)) => {
            return post_form_again(
                &state,
                &user,
                &csrf,
                &path,
                Some(post_id),
                PostForm::default(),
                message,
            )
            .await;
        }
        Err(PostFormError::Internal(err)) => return Err(PageError::Internal(err)),
    };

    if !csrf.matches(&form.csrf_token) {
        return Err(PageError::CsrfRejected);
    }

    let input = PostInput {
        text: form.text.clone(),
        group_id: form.group_id,
        image: form.image.clone(),
    };
    match state.post_service.update(post_id, user.id, input).await {
        Ok(_) => Ok(Redirect::to(&format!("/posts/{post_id}/")).into_response()),
        Err(PostServiceError::NotOwner) => {
            Ok(Redirect::to(&format!("/posts/{post_id}/")).into_response())
        }
        Err(PostServiceError::ValidationError(message)) => {
            post_form_again(&state, &user, &csrf, &path, Some(post_id), form, message).await
        }
        Err(err) => Err(err.into()),
    }
}

/// Re-render the post form after a rejected submission.
///
/// `post_id` is present for edits and selects the edit variant of the
/// template.
async fn post_form_again(
    state: &AppState,
    user: &User,
    csrf: &CsrfToken,
    path: &str,
    post_id: Option<i64>,
    form: PostForm,
    error: String,
) -> Result<Response, PageError> {
    let groups = state.group_service.list_all().await?;

    let mut context = base_context(Some(user), path);
    context.insert("csrf_token", &csrf.0);
    context.insert("groups", &groups);
    context.insert("is_edit", &post_id.is_some());
    if let Some(id) = post_id {
        context.insert("post_id", &id);
    }
    context.insert("form_text", &form.text);
    context.insert("form_group_id", &form.group_id);
    context.insert("error", &error);
    Ok(render_page("posts/create_post.html", &context)?.into_response())
}

/// POST /posts/{id}/comment/ attach a comment, then back to the post.
///
/// An empty comment is dropped without an error page, matching the listing
/// the user returns to.
pub async fn add_comment(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    csrf: CsrfToken,
    Path(post_id): Path<i64>,
    Form(form): Form<CommentForm>,
) -> Result<Response, PageError> {
    if !csrf.matches(&form.csrf_token) {
        return Err(PageError::CsrfRejected);
    }

    match state.comment_service.add(post_id, user.id, &form.text).await {
        Ok(_) | Err(CommentServiceError::ValidationError(_)) => {
            Ok(Redirect::to(&format!("/posts/{post_id}/")).into_response())
        }
        Err(err) => Err(err.into()),
    }
}

/// GET /follow/ the feed: posts by authors the user follows.
pub async fn follow_index(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Query(query): Query<PageQuery>,
) -> Result<Response, PageError> {
    let requested = parse_page_param(query.page.as_deref());
    let page = state.post_service.page_feed(user.id, requested).await?;

    let mut context = base_context(Some(&user), "/follow/");
    context.insert("page", &page);
    Ok(render_page("posts/follow.html", &context)?.into_response())
}

/// GET /profile/{username}/follow/ start following, then back to the profile.
pub async fn profile_follow(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(username): Path<String>,
) -> Result<Response, PageError> {
    let author = state
        .user_service
        .get_by_username(&username)
        .await?
        .ok_or(PageError::NotFound)?;

    state.follow_service.follow(user.id, author.id).await?;

    Ok(Redirect::to(&format!("/profile/{username}/")).into_response())
}

/// GET /profile/{username}/unfollow/ stop following, then back to the profile.
pub async fn profile_unfollow(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(username): Path<String>,
) -> Result<Response, PageError> {
    let author = state
        .user_service
        .get_by_username(&username)
        .await?
        .ok_or(PageError::NotFound)?;

    state.follow_service.unfollow(user.id, author.id).await?;

    Ok(Redirect::to(&format!("/profile/{username}/")).into_response())
}
