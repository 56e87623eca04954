use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{course, course_purchase, course_video};
use crate::error::AppError;

pub const COURSE_LEVELS: &[&str] = &["beginner", "intermediate", "advanced"];

/// Request body for creating a course together with its initial videos.
#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourseRequest {
    pub title: String,
    pub description: String,
    /// Price in minor currency units.
    #[schema(example = 49900)]
    pub price: i32,
    /// Strike-through price, if discounted.
    pub original_price: Option<i32>,
    /// One of `beginner`, `intermediate`, `advanced`.
    pub level: String,
    pub category: String,
    pub thumbnail: String,
    #[serde(default)]
    pub videos: Vec<CreateCourseVideoRequest>,
}

/// A video supplied inline with course creation or added later.
#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourseVideoRequest {
    pub title: String,
    pub video_url: String,
    pub duration_seconds: i32,
    /// Display order; defaults to the array index on bulk create and to
    /// the end of the course otherwise.
    pub position: Option<i32>,
}

/// Request body for editing a course. PATCH semantics: only provided
/// fields change.
#[derive(Deserialize, Default, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCourseRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<i32>,
    pub original_price: Option<i32>,
    pub level: Option<String>,
    pub category: Option<String>,
    pub thumbnail: Option<String>,
}

/// Request body for editing a course video.
#[derive(Deserialize, Default, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCourseVideoRequest {
    pub title: Option<String>,
    pub video_url: Option<String>,
    pub duration_seconds: Option<i32>,
    pub position: Option<i32>,
}

/// Catalog view of a course.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseResponse {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub price: i32,
    pub original_price: Option<i32>,
    pub level: String,
    pub category: String,
    pub thumbnail: String,
    pub is_active: bool,
    /// Whether the requesting viewer owns the course. `false` when
    /// unauthenticated.
    pub is_purchased: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CourseResponse {
    pub fn assemble(m: course::Model, is_purchased: bool) -> Self {
        Self {
            id: m.id,
            title: m.title,
            description: m.description,
            price: m.price,
            original_price: m.original_price,
            level: m.level,
            category: m.category,
            thumbnail: m.thumbnail,
            is_active: m.is_active,
            is_purchased,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseVideoResponse {
    pub id: i32,
    pub course_id: i32,
    pub title: String,
    pub video_url: String,
    pub duration_seconds: i32,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

impl From<course_video::Model> for CourseVideoResponse {
    fn from(m: course_video::Model) -> Self {
        Self {
            id: m.id,
            course_id: m.course_id,
            title: m.title,
            video_url: m.video_url,
            duration_seconds: m.duration_seconds,
            position: m.position,
            created_at: m.created_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseResponse {
    pub id: i32,
    pub course_id: i32,
    /// Price paid at purchase time.
    pub purchase_price: i32,
    pub created_at: DateTime<Utc>,
}

impl From<course_purchase::Model> for PurchaseResponse {
    fn from(m: course_purchase::Model) -> Self {
        Self {
            id: m.id,
            course_id: m.course_id,
            purchase_price: m.purchase_price,
            created_at: m.created_at,
        }
    }
}

/// Aggregates for the admin dashboard.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseStatsResponse {
    pub total_courses: u64,
    pub active_courses: u64,
    pub total_purchases: u64,
    /// Sum of all purchase prices, in minor units.
    pub total_revenue: i64,
}

/// Result of the demo-catalog seeding endpoint.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SeedResponse {
    pub courses_created: u32,
}

fn validate_title(title: &str) -> Result<(), AppError> {
    let title = title.trim();
    if title.is_empty() || title.chars().count() > 256 {
        return Err(AppError::Validation("Title must be 1-256 characters".into()));
    }
    Ok(())
}

fn validate_price(price: i32) -> Result<(), AppError> {
    if price < 0 {
        return Err(AppError::Validation("Price must not be negative".into()));
    }
    Ok(())
}

fn validate_level(level: &str) -> Result<(), AppError> {
    if !COURSE_LEVELS.contains(&level) {
        return Err(AppError::Validation(format!(
            "Level must be one of: {}",
            COURSE_LEVELS.join(", ")
        )));
    }
    Ok(())
}

fn validate_video(req: &CreateCourseVideoRequest) -> Result<(), AppError> {
    validate_title(&req.title)?;
    if req.video_url.trim().is_empty() {
        return Err(AppError::Validation("Video URL is required".into()));
    }
    if req.duration_seconds <= 0 {
        return Err(AppError::Validation("Duration must be positive".into()));
    }
    if let Some(pos) = req.position
        && pos < 0
    {
        return Err(AppError::Validation("Position must be >= 0".into()));
    }
    Ok(())
}

pub fn validate_create_course(req: &CreateCourseRequest) -> Result<(), AppError> {
    validate_title(&req.title)?;
    if req.description.trim().is_empty() {
        return Err(AppError::Validation("Description is required".into()));
    }
    validate_price(req.price)?;
    if let Some(original) = req.original_price {
        validate_price(original)?;
    }
    validate_level(&req.level)?;
    if req.category.trim().is_empty() {
        return Err(AppError::Validation("Category is required".into()));
    }
    for video in &req.videos {
        validate_video(video)?;
    }
    Ok(())
}

pub fn validate_update_course(req: &UpdateCourseRequest) -> Result<(), AppError> {
    if let Some(ref title) = req.title {
        validate_title(title)?;
    }
    if let Some(ref description) = req.description
        && description.trim().is_empty()
    {
        return Err(AppError::Validation("Description must not be empty".into()));
    }
    if let Some(price) = req.price {
        validate_price(price)?;
    }
    if let Some(original) = req.original_price {
        validate_price(original)?;
    }
    if let Some(ref level) = req.level {
        validate_level(level)?;
    }
    Ok(())
}

pub fn validate_create_video(req: &CreateCourseVideoRequest) -> Result<(), AppError> {
    validate_video(req)
}

pub fn validate_update_video(req: &UpdateCourseVideoRequest) -> Result<(), AppError> {
    if let Some(ref title) = req.title {
        validate_title(title)?;
    }
    if let Some(ref url) = req.video_url
        && url.trim().is_empty()
    {
        return Err(AppError::Validation("Video URL must not be empty".into()));
    }
    if let Some(duration) = req.duration_seconds
        && duration <= 0
    {
        return Err(AppError::Validation("Duration must be positive".into()));
    }
    if let Some(pos) = req.position
        && pos < 0
    {
        return Err(AppError::Validation("Position must be >= 0".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course_req() -> CreateCourseRequest {
        CreateCourseRequest {
            title: "Options Trading 101".into(),
            description: "From zero to covered calls.".into(),
            price: 49900,
            original_price: Some(99900),
            level: "beginner".into(),
            category: "derivatives".into(),
            thumbnail: "https://m/thumb.png".into(),
            videos: vec![],
        }
    }

    #[test]
    fn accepts_well_formed_course() {
        assert!(validate_create_course(&course_req()).is_ok());
    }

    #[test]
    fn rejects_negative_price() {
        let mut req = course_req();
        req.price = -1;
        assert!(validate_create_course(&req).is_err());
    }

    #[test]
    fn rejects_unknown_level() {
        let mut req = course_req();
        req.level = "wizard".into();
        assert!(validate_create_course(&req).is_err());
    }

    #[test]
    fn validates_inline_videos() {
        let mut req = course_req();
        req.videos.push(CreateCourseVideoRequest {
            title: "Intro".into(),
            video_url: "".into(),
            duration_seconds: 60,
            position: None,
        });
        assert!(validate_create_course(&req).is_err());
    }
}
