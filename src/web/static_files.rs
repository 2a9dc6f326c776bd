//! Static asset and uploaded media serving.
//!
//! Site assets (the stylesheet) are embedded in the binary. Uploaded post
//! images live on disk under the configured media directory and are served
//! by filename; anything that is not a bare filename is refused.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use rust_embed::RustEmbed;
use tokio::fs;

use crate::web::errors::PageError;
use crate::web::middleware::AppState;

/// Embedded site assets
#[derive(RustEmbed)]
#[folder = "static/"]
struct StaticAssets;

/// GET /static/{*path}
pub async fn serve_static(Path(path): Path<String>) -> Response {
    match StaticAssets::get(&path) {
        Some(content) => build_response(&path, &content.data, "public, max-age=3600"),
        None => PageError::NotFound.into_response(),
    }
}

/// GET /media/{filename}
///
/// Uploads are stored under UUID names, so a hit never changes and caches
/// may keep it indefinitely.
pub async fn serve_media(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Response {
    if filename.contains('/') || filename.contains('\\') || filename.contains("..") {
        return PageError::Forbidden.into_response();
    }

    let file_path = state.config.uploads.media_dir.join(&filename);
    match fs::read(&file_path).await {
        Ok(contents) => build_response(
            &filename,
            &contents,
            "public, max-age=31536000, immutable",
        ),
        Err(_) => PageError::NotFound.into_response(),
    }
}

fn build_response(path: &str, data: &[u8], cache_control: &'static str) -> Response {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, get_content_type(path))
        .header(header::CACHE_CONTROL, cache_control)
        .body(Body::from(data.to_vec()))
        .unwrap()
}

/// Get content type from file extension
fn get_content_type(path: &str) -> &'static str {
    match path.rsplit('.').next().unwrap_or("") {
        "html" => "text/html; charset=utf-8",
        "css" => "text/css",
        "js" => "application/javascript",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}
