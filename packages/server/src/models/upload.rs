use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Folders a client may upload into.
pub const ALLOWED_FOLDERS: &[&str] = &["posts", "reels", "avatars", "courses", "blogs", "uploads"];

/// Media extensions accepted for direct upload.
pub const ALLOWED_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "mp4", "mov", "webm",
];

/// Request body for a presigned upload URL.
#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PresignedUrlRequest {
    /// Client-side file name; only the extension is kept.
    #[schema(example = "sunset.jpg")]
    pub file_name: String,
    #[schema(example = "image/jpeg")]
    pub content_type: String,
    /// Target folder; defaults to `uploads`.
    pub folder: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PresignedUrlResponse {
    /// PUT the file bytes here.
    pub upload_url: String,
    /// URL under which the object will be publicly served.
    pub public_url: String,
    pub key: String,
}

/// Extract and validate the lowercase extension of an uploaded file name.
pub fn file_extension(file_name: &str) -> Result<String, AppError> {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .ok_or_else(|| AppError::Validation("File name must have an extension".into()))?;
    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(AppError::Validation(format!(
            "Unsupported file type .{ext}; allowed: {}",
            ALLOWED_EXTENSIONS.join(", ")
        )));
    }
    Ok(ext)
}

pub fn validate_presigned_url_request(req: &PresignedUrlRequest) -> Result<(), AppError> {
    file_extension(&req.file_name)?;

    if !(req.content_type.starts_with("image/") || req.content_type.starts_with("video/")) {
        return Err(AppError::Validation(
            "Content type must be an image or video type".into(),
        ));
    }

    if let Some(ref folder) = req.folder
        && !ALLOWED_FOLDERS.contains(&folder.as_str())
    {
        return Err(AppError::Validation(format!(
            "Folder must be one of: {}",
            ALLOWED_FOLDERS.join(", ")
        )));
    }
    Ok(())
}
