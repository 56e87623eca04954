use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{comment, post, user};
use crate::error::AppError;

pub const MAX_POST_IMAGES: usize = 4;
pub const MAX_POST_CONTENT_CHARS: usize = 2000;
pub const MAX_COMMENT_CONTENT_CHARS: usize = 1000;

/// What a like row points at. Exactly one target, by construction —
/// the storage schema keeps two nullable columns, but nothing above the
/// entity layer ever handles a both-set or both-null row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeTarget {
    Post(i32),
    Comment(i32),
}

impl LikeTarget {
    pub fn post_id(self) -> Option<i32> {
        match self {
            Self::Post(id) => Some(id),
            Self::Comment(_) => None,
        }
    }

    pub fn comment_id(self) -> Option<i32> {
        match self {
            Self::Post(_) => None,
            Self::Comment(id) => Some(id),
        }
    }
}

/// Request body for creating a post.
#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub content: Option<String>,
    /// Up to four public image URLs.
    pub images: Option<Vec<String>>,
}

/// Request body for retweeting (optionally quoting) a post.
#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RetweetRequest {
    pub original_post_id: i32,
    /// Optional quote text.
    pub content: Option<String>,
    pub images: Option<Vec<String>>,
}

/// Request body for editing a post. Replaces content and images wholesale.
#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostRequest {
    pub content: Option<String>,
    pub images: Option<Vec<String>>,
}

/// Request body for creating or editing a comment.
#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentRequest {
    pub content: Option<String>,
    pub images: Option<Vec<String>>,
}

/// Compact owner info embedded in feed items.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: i32,
    pub name: String,
    pub username: String,
    pub avatar: Option<String>,
    pub is_influencer: bool,
}

impl From<user::Model> for UserSummary {
    fn from(m: user::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            username: m.username,
            avatar: m.avatar,
            is_influencer: m.is_influencer,
        }
    }
}

/// A comment with its owner and the viewer's like state.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: i32,
    pub post_id: i32,
    pub user: UserSummary,
    pub content: Option<String>,
    pub images: Vec<String>,
    pub like_count: i32,
    /// Whether the requesting viewer has liked this comment.
    /// `false` when the request is unauthenticated.
    pub is_liked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CommentResponse {
    pub fn assemble(m: comment::Model, owner: user::Model, is_liked: bool) -> Self {
        Self {
            id: m.id,
            post_id: m.post_id,
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

/// A retweeted post's origin, without its own nested origin or comments.
/// Keeping this a separate type makes the depth-1 bound structural.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OriginalPostResponse {
    pub id: i32,
    pub user: UserSummary,
    pub content: Option<String>,
    pub images: Vec<String>,
    pub like_count: i32,
    pub share_count: i32,
    pub bookmark_count: i32,
    pub is_retweet: bool,
    pub created_at: DateTime<Utc>,
}

impl OriginalPostResponse {
    pub fn assemble(m: post::Model, owner: user::Model) -> Self {
        Self {
            id: m.id,
            user: owner.into(),
            content: m.content,
            images: m.images,
            like_count: m.like_count,
            share_count: m.share_count,
            bookmark_count: m.bookmark_count,
            is_retweet: m.is_retweet,
            created_at: m.created_at,
        }
    }
}

/// Fully assembled post: owner, latest comments, counters and the
/// viewer-relative interaction flags.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: i32,
    pub user: UserSummary,
    pub content: Option<String>,
    pub images: Vec<String>,
    pub like_count: i32,
    pub share_count: i32,
    pub bookmark_count: i32,
    pub comment_count: u64,
    pub is_retweet: bool,
    /// Present on retweets whose origin still exists.
    pub original_post: Option<OriginalPostResponse>,
    /// Latest comments (at most five).
    pub comments: Vec<CommentResponse>,
    pub is_liked: bool,
    pub is_bookmarked: bool,
    pub is_retweeted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Result of a like toggle.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LikeToggleResponse {
    pub liked: bool,
    pub like_count: i32,
}

/// Result of a bookmark toggle.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkToggleResponse {
    pub bookmarked: bool,
    pub bookmark_count: i32,
}

fn validate_images(images: &[String]) -> Result<(), AppError> {
    if images.len() > MAX_POST_IMAGES {
        return Err(AppError::Validation(format!(
            "At most {MAX_POST_IMAGES} images are allowed"
        )));
    }
    if images.iter().any(|url| url.trim().is_empty()) {
        return Err(AppError::Validation("Image URLs must not be empty".into()));
    }
    Ok(())
}

/// Shared content-or-images rule for posts and comments.
fn validate_body(
    content: &Option<String>,
    images: &Option<Vec<String>>,
    max_chars: usize,
) -> Result<(), AppError> {
    if let Some(content) = content
        && content.chars().count() > max_chars
    {
        return Err(AppError::Validation(format!(
            "Content must be at most {max_chars} characters"
        )));
    }
    if let Some(images) = images {
        validate_images(images)?;
    }

    let has_content = content.as_deref().is_some_and(|c| !c.trim().is_empty());
    let has_images = images.as_deref().is_some_and(|i| !i.is_empty());
    if !has_content && !has_images {
        return Err(AppError::Validation(
            "Post content or at least one image is required".into(),
        ));
    }
    Ok(())
}

pub fn validate_create_post(req: &CreatePostRequest) -> Result<(), AppError> {
    validate_body(&req.content, &req.images, MAX_POST_CONTENT_CHARS)
}

pub fn validate_update_post(req: &UpdatePostRequest) -> Result<(), AppError> {
    validate_body(&req.content, &req.images, MAX_POST_CONTENT_CHARS)
}

/// Retweets may carry no content at all (plain repost), so only the
/// optional quote body is bounded here.
pub fn validate_retweet(req: &RetweetRequest) -> Result<(), AppError> {
    if let Some(ref content) = req.content
        && content.chars().count() > MAX_POST_CONTENT_CHARS
    {
        return Err(AppError::Validation(format!(
            "Content must be at most {MAX_POST_CONTENT_CHARS} characters"
        )));
    }
    if let Some(ref images) = req.images {
        validate_images(images)?;
    }
    Ok(())
}

pub fn validate_comment(req: &CommentRequest) -> Result<(), AppError> {
    validate_body(&req.content, &req.images, MAX_COMMENT_CONTENT_CHARS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post_req(content: Option<&str>, images: Option<Vec<&str>>) -> CreatePostRequest {
        CreatePostRequest {
            content: content.map(String::from),
            images: images.map(|v| v.into_iter().map(String::from).collect()),
        }
    }

    #[test]
    fn content_or_images_required() {
        assert!(validate_create_post(&post_req(None, None)).is_err());
        assert!(validate_create_post(&post_req(Some("   "), None)).is_err());
        assert!(validate_create_post(&post_req(Some(""), Some(vec![]))).is_err());
        assert!(validate_create_post(&post_req(Some("hello"), None)).is_ok());
        assert!(validate_create_post(&post_req(None, Some(vec!["https://m/x.png"]))).is_ok());
    }

    #[test]
    fn image_count_is_bounded() {
        let five = vec!["a", "b", "c", "d", "e"];
        assert!(validate_create_post(&post_req(None, Some(five))).is_err());
        let four = vec!["a", "b", "c", "d"];
        assert!(validate_create_post(&post_req(None, Some(four))).is_ok());
    }

    #[test]
    fn content_length_is_bounded() {
        let long = "x".repeat(MAX_POST_CONTENT_CHARS + 1);
        assert!(validate_create_post(&post_req(Some(&long), None)).is_err());
    }

    #[test]
    fn bare_retweet_is_valid() {
        let req = RetweetRequest {
            original_post_id: 1,
            content: None,
            images: None,
        };
        assert!(validate_retweet(&req).is_ok());
    }

    #[test]
    fn like_target_sets_exactly_one_column() {
        let t = LikeTarget::Post(3);
        assert_eq!(t.post_id(), Some(3));
        assert_eq!(t.comment_id(), None);

        let t = LikeTarget::Comment(9);
        assert_eq!(t.post_id(), None);
        assert_eq!(t.comment_id(), Some(9));
    }
}
