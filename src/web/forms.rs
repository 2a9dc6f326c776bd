//! Form payloads.
//!
//! Plain forms arrive urlencoded and deserialize directly. The post form is
//! multipart because of the image field, so it gets a hand-rolled parser
//! that also stores an accepted upload under a fresh name.
//!
//! Validation failures here are user errors: the caller re-renders the form
//! with the message, the response stays HTTP 200.

use axum::extract::Multipart;
use serde::Deserialize;
use tokio::fs;
use uuid::Uuid;

use crate::config::UploadConfig;

#[derive(Debug, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
    #[serde(default)]
    pub csrf_token: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub csrf_token: String,
}

#[derive(Debug, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub csrf_token: String,
}

#[derive(Debug, Deserialize)]
pub struct PasswordChangeForm {
    #[serde(default)]
    pub old_password: String,
    #[serde(default)]
    pub new_password1: String,
    #[serde(default)]
    pub new_password2: String,
    #[serde(default)]
    pub csrf_token: String,
}

#[derive(Debug, Deserialize)]
pub struct PasswordResetForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub csrf_token: String,
}

#[derive(Debug, Deserialize)]
pub struct SetPasswordForm {
    #[serde(default)]
    pub new_password1: String,
    #[serde(default)]
    pub new_password2: String,
    #[serde(default)]
    pub csrf_token: String,
}

#[derive(Debug, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub csrf_token: String,
}

/// Parsed multipart post form, image already stored.
#[derive(Debug, Default)]
pub struct PostForm {
    pub text: String,
    pub group_id: Option<i64>,
    /// Filename of a freshly stored upload, `None` when no file was sent.
    pub image: Option<String>,
    pub csrf_token: String,
}

/// Failures while reading the post form.
#[derive(Debug, thiserror::Error)]
pub enum PostFormError {
    /// User-correctable problem, shown on the re-rendered form
    #[error("{0}")]
    Invalid(String),

    /// Storage or transport fault
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Reads the multipart post form, saving an attached image to the media
/// directory under a UUID name.
pub async fn parse_post_form(
    mut multipart: Multipart,
    uploads: &UploadConfig,
) -> Result<PostForm, PostFormError> {
    let mut form = PostForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| PostFormError::Invalid(format!("Malformed form data: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "text" => {
                form.text = field
                    .text()
                    .await
                    .map_err(|e| PostFormError::Invalid(format!("Malformed form data: {e}")))?;
            }
            "group" => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| PostFormError::Invalid(format!("Malformed form data: {e}")))?;
                let raw = raw.trim();
                if !raw.is_empty() {
                    let group_id = raw
                        .parse::<i64>()
                        .map_err(|_| PostFormError::Invalid("Invalid group choice".to_string()))?;
                    form.group_id = Some(group_id);
                }
            }
            "csrf_token" => {
                form.csrf_token = field
                    .text()
                    .await
                    .map_err(|e| PostFormError::Invalid(format!("Malformed form data: {e}")))?;
            }
            "image" => {
                let has_file = field.file_name().map(|f| !f.is_empty()).unwrap_or(false);
                if !has_file {
                    continue;
                }

                let content_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string());

                if !uploads.is_type_allowed(&content_type) {
                    return Err(PostFormError::Invalid(format!(
                        "Unsupported image type: {content_type}"
                    )));
                }

                let data = field
                    .bytes()
                    .await
                    .map_err(|e| PostFormError::Invalid(format!("Failed to read upload: {e}")))?;

                if data.is_empty() {
                    continue;
                }
                if data.len() as u64 > uploads.max_file_size {
                    return Err(PostFormError::Invalid(format!(
                        "Image too large, maximum is {} MB",
                        uploads.max_file_size / 1024 / 1024
                    )));
                }

                form.image = Some(store_image(&data, &content_type, uploads).await?);
            }
            _ => {}
        }
    }

    Ok(form)
}

/// Writes accepted image bytes to the media directory, returning the stored
/// filename.
async fn store_image(
    data: &[u8],
    content_type: &str,
    uploads: &UploadConfig,
) -> Result<String, PostFormError> {
    fs::create_dir_all(&uploads.media_dir)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create media directory: {e}"))?;

    let filename = format!("{}.{}", Uuid::new_v4(), uploads.get_extension(content_type));
    let path = uploads.media_dir.join(&filename);
    fs::write(&path, data)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to store upload: {e}"))?;

    tracing::debug!(filename = %filename, size = data.len(), "Stored uploaded image");

    Ok(filename)
}
