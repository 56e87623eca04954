use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{reel, reel_comment, user};
use crate::error::AppError;
use crate::models::post::{MAX_COMMENT_CONTENT_CHARS, UserSummary};

pub const MIN_REEL_DURATION_SECS: i32 = 1;
pub const MAX_REEL_DURATION_SECS: i32 = 300;
pub const MAX_REEL_CONTENT_CHARS: usize = 2000;

/// What a reel-like row points at; mirror of `post::LikeTarget`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReelLikeTarget {
    Reel(i32),
    Comment(i32),
}

impl ReelLikeTarget {
    pub fn reel_id(self) -> Option<i32> {
        match self {
            Self::Reel(id) => Some(id),
            Self::Comment(_) => None,
        }
    }

    pub fn comment_id(self) -> Option<i32> {
        match self {
            Self::Reel(_) => None,
            Self::Comment(id) => Some(id),
        }
    }
}

/// Request body for publishing a reel.
#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateReelRequest {
    /// Public video URL (from a presigned upload).
    pub video_url: String,
    pub content: Option<String>,
    /// Clip length in seconds (1-300).
    pub duration_seconds: i32,
}

/// Request body for editing a reel's caption. The video itself is
/// immutable once published.
#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReelRequest {
    pub content: Option<String>,
}

/// Request body for creating or editing a reel comment.
#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReelCommentRequest {
    pub content: Option<String>,
    pub images: Option<Vec<String>>,
}

/// A reel comment with its owner and the viewer's like state.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReelCommentResponse {
    pub id: i32,
    pub reel_id: i32,
    pub user: UserSummary,
    pub content: Option<String>,
    pub images: Vec<String>,
    pub like_count: i32,
    pub is_liked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReelCommentResponse {
    pub fn assemble(m: reel_comment::Model, owner: user::Model, is_liked: bool) -> Self {
        Self {
            id: m.id,
            reel_id: m.reel_id,
            user: owner.into(),
            content: m.content,
            images: m.images,
            like_count: m.like_count,
            is_liked,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Fully assembled reel: owner, latest comments, counters and the
/// viewer-relative like flag.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReelResponse {
    pub id: i32,
    pub user: UserSummary,
    pub video_url: String,
    pub content: Option<String>,
    pub duration_seconds: i32,
    pub like_count: i32,
    pub share_count: i32,
    pub comment_count: u64,
    /// Latest comments (at most five).
    pub comments: Vec<ReelCommentResponse>,
    pub is_liked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Result of a share action.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShareResponse {
    pub share_count: i32,
}

pub fn validate_create_reel(req: &CreateReelRequest) -> Result<(), AppError> {
    if req.video_url.trim().is_empty() {
        return Err(AppError::Validation("Video URL is required".into()));
    }
    if !(MIN_REEL_DURATION_SECS..=MAX_REEL_DURATION_SECS).contains(&req.duration_seconds) {
        return Err(AppError::Validation(format!(
            "Duration must be {MIN_REEL_DURATION_SECS}-{MAX_REEL_DURATION_SECS} seconds"
        )));
    }
    validate_caption(&req.content)?;
    Ok(())
}

pub fn validate_update_reel(req: &UpdateReelRequest) -> Result<(), AppError> {
    validate_caption(&req.content)
}

fn validate_caption(content: &Option<String>) -> Result<(), AppError> {
    if let Some(content) = content
        && content.chars().count() > MAX_REEL_CONTENT_CHARS
    {
        return Err(AppError::Validation(format!(
            "Content must be at most {MAX_REEL_CONTENT_CHARS} characters"
        )));
    }
    Ok(())
}

pub fn validate_reel_comment(req: &ReelCommentRequest) -> Result<(), AppError> {
    if let Some(ref content) = req.content
        && content.chars().count() > MAX_COMMENT_CONTENT_CHARS
    {
        return Err(AppError::Validation(format!(
            "Content must be at most {MAX_COMMENT_CONTENT_CHARS} characters"
        )));
    }
    let has_content = req.content.as_deref().is_some_and(|c| !c.trim().is_empty());
    let has_images = req.images.as_deref().is_some_and(|i| !i.is_empty());
    if !has_content && !has_images {
        return Err(AppError::Validation(
            "Comment content or at least one image is required".into(),
        ));
    }
    Ok(())
}
