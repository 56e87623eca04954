use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{course, course_purchase, course_video};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::{AuthUser, OptionalAuthUser};
use crate::extractors::json::AppJson;
use crate::models::course::*;
use crate::models::shared::{ApiResponse, PageQuery, Pagination};
use crate::seed;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "Courses",
    operation_id = "listCourses",
    summary = "Browse the course catalog",
    description = "Paginated list of active courses, newest first. When the request carries a \
        token, each course is flagged with the viewer's purchase state.",
    params(PageQuery),
    responses(
        (status = 200, description = "Page of courses", body = ApiResponse<Vec<CourseResponse>>),
    ),
)]
#[instrument(skip(state, viewer, query))]
pub async fn list_courses(
    viewer: OptionalAuthUser,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<Vec<CourseResponse>>>, AppError> {
    let (page, limit) = query.clamped();

    let select = course::Entity::find().filter(course::Column::IsActive.eq(true));

    let total = select.clone().paginate(&state.db, limit).num_items().await?;

    let rows = select
        .order_by_desc(course::Column::CreatedAt)
        .order_by_desc(course::Column::Id)
        .offset(Some(PageQuery::offset(page, limit)))
        .limit(Some(limit))
        .all(&state.db)
        .await?;

    let mut data = Vec::with_capacity(rows.len());
    for row in rows {
        let is_purchased = match viewer.viewer_id() {
            Some(viewer_id) => find_purchase(&state.db, viewer_id, row.id).await?.is_some(),
            None => false,
        };
        data.push(CourseResponse::assemble(row, is_purchased));
    }

    Ok(Json(ApiResponse::paginated(
        "Courses",
        data,
        Pagination::new(page, limit, total),
    )))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Courses",
    operation_id = "createCourse",
    summary = "Create a course with its initial videos",
    description = "Creates the course row and any supplied videos in one transaction; video \
        positions default to the array index. Admin only.",
    request_body = CreateCourseRequest,
    responses(
        (status = 201, description = "Course created", body = ApiResponse<CourseResponse>),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Forbidden", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(title = %payload.title))]
pub async fn create_course(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateCourseRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_admin()?;
    validate_create_course(&payload)?;

    let now = chrono::Utc::now();
    let txn = state.db.begin().await?;

    let new_course = course::ActiveModel {
        title: Set(payload.title.trim().to_string()),
        description: Set(payload.description),
        price: Set(payload.price),
        original_price: Set(payload.original_price),
        level: Set(payload.level),
        category: Set(payload.category),
        thumbnail: Set(payload.thumbnail),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let model = new_course.insert(&txn).await?;

    for (index, video) in payload.videos.into_iter().enumerate() {
        let position = video.position.unwrap_or(index as i32);
        let new_video = course_video::ActiveModel {
            course_id: Set(model.id),
            title: Set(video.title.trim().to_string()),
            video_url: Set(video.video_url),
            duration_seconds: Set(video.duration_seconds),
            position: Set(position),
            is_active: Set(true),
            created_at: Set(now),
            ..Default::default()
        };
        new_video.insert(&txn).await?;
    }

    txn.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            "Course created",
            CourseResponse::assemble(model, false),
        )),
    ))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Courses",
    operation_id = "getCourse",
    summary = "Get a course",
    description = "Retired courses are visible to admins only.",
    params(("id" = i32, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course", body = ApiResponse<CourseResponse>),
        (status = 404, description = "Course not found", body = ErrorBody),
    ),
)]
#[instrument(skip(state, viewer), fields(id))]
pub async fn get_course(
    viewer: OptionalAuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<CourseResponse>>, AppError> {
    let model = find_course(&state.db, id).await?;

    let is_admin = viewer.0.as_ref().is_some_and(|u| u.is_admin());
    if !model.is_active && !is_admin {
        return Err(AppError::NotFound("Course not found".into()));
    }

    let is_purchased = match viewer.viewer_id() {
        Some(viewer_id) => find_purchase(&state.db, viewer_id, id).await?.is_some(),
        None => false,
    };

    Ok(Json(ApiResponse::new(
        "Course",
        CourseResponse::assemble(model, is_purchased),
    )))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Courses",
    operation_id = "updateCourse",
    summary = "Update a course",
    description = "PATCH semantics: only provided fields change. Price changes never touch \
        recorded purchase prices. Admin only.",
    params(("id" = i32, Path, description = "Course ID")),
    request_body = UpdateCourseRequest,
    responses(
        (status = 200, description = "Course updated", body = ApiResponse<CourseResponse>),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Forbidden", body = ErrorBody),
        (status = 404, description = "Course not found", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_course(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateCourseRequest>,
) -> Result<Json<ApiResponse<CourseResponse>>, AppError> {
    auth_user.require_admin()?;
    validate_update_course(&payload)?;

    let existing = find_course(&state.db, id).await?;
    let mut active: course::ActiveModel = existing.into();

    if let Some(title) = payload.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(original_price) = payload.original_price {
        active.original_price = Set(Some(original_price));
    }
    if let Some(level) = payload.level {
        active.level = Set(level);
    }
    if let Some(category) = payload.category {
        active.category = Set(category);
    }
    if let Some(thumbnail) = payload.thumbnail {
        active.thumbnail = Set(thumbnail);
    }
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(&state.db).await?;

    Ok(Json(ApiResponse::new(
        "Course updated",
        CourseResponse::assemble(model, false),
    )))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Courses",
    operation_id = "deleteCourse",
    summary = "Retire a course",
    description = "Soft delete: the course is marked inactive and disappears from the catalog, \
        but purchase history keeps resolving. Admin only.",
    params(("id" = i32, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course retired", body = ApiResponse<serde_json::Value>),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Forbidden", body = ErrorBody),
        (status = 404, description = "Course not found", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_course(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    auth_user.require_admin()?;

    let existing = find_course(&state.db, id).await?;
    let mut active: course::ActiveModel = existing.into();
    active.is_active = Set(false);
    active.updated_at = Set(chrono::Utc::now());
    active.update(&state.db).await?;

    Ok(Json(ApiResponse::new(
        "Course retired",
        serde_json::Value::Null,
    )))
}

#[utoipa::path(
    post,
    path = "/{id}/purchase",
    tag = "Courses",
    operation_id = "purchaseCourse",
    summary = "Purchase a course",
    description = "Records a purchase at the course's current price; the recorded price is \
        immune to later catalog changes. One purchase per user per course.",
    params(("id" = i32, Path, description = "Course ID")),
    responses(
        (status = 201, description = "Purchased", body = ApiResponse<PurchaseResponse>),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 404, description = "Course not found or retired", body = ErrorBody),
        (status = 409, description = "Already purchased", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id, user_id = auth_user.user_id))]
pub async fn purchase_course(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let course = find_course(&state.db, id).await?;
    if !course.is_active {
        return Err(AppError::NotFound("Course not found".into()));
    }

    if find_purchase(&state.db, auth_user.user_id, id).await?.is_some() {
        return Err(AppError::Conflict("Course already purchased".into()));
    }

    let new_purchase = course_purchase::ActiveModel {
        user_id: Set(auth_user.user_id),
        course_id: Set(id),
        purchase_price: Set(course.price),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    // Unique (user, course) index backstops the probe above.
    let model = new_purchase
        .insert(&state.db)
        .await
        .map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                AppError::Conflict("Course already purchased".into())
            }
            _ => AppError::from(e),
        })?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            "Course purchased",
            PurchaseResponse::from(model),
        )),
    ))
}

#[utoipa::path(
    get,
    path = "/user/purchased",
    tag = "Courses",
    operation_id = "listPurchasedCourses",
    summary = "Courses the viewer has purchased",
    description = "Includes retired courses, since access survives retirement.",
    responses(
        (status = 200, description = "Purchased courses", body = ApiResponse<Vec<CourseResponse>>),
        (status = 401, description = "Unauthorized", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn list_purchased_courses(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<CourseResponse>>>, AppError> {
    let purchases = course_purchase::Entity::find()
        .filter(course_purchase::Column::UserId.eq(auth_user.user_id))
        .order_by_desc(course_purchase::Column::CreatedAt)
        .all(&state.db)
        .await?;

    let mut data = Vec::with_capacity(purchases.len());
    for purchase in purchases {
        if let Some(course) = course::Entity::find_by_id(purchase.course_id)
            .one(&state.db)
            .await?
        {
            data.push(CourseResponse::assemble(course, true));
        }
    }

    Ok(Json(ApiResponse::new("Purchased courses", data)))
}

#[utoipa::path(
    get,
    path = "/{id}/videos",
    tag = "Course Videos",
    operation_id = "listCourseVideos",
    summary = "Videos of a course, in display order",
    description = "Regular users must have purchased the course; admins skip the gate.",
    params(("id" = i32, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Videos", body = ApiResponse<Vec<CourseVideoResponse>>),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Course not purchased", body = ErrorBody),
        (status = 404, description = "Course not found", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id, user_id = auth_user.user_id))]
pub async fn list_course_videos(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<Vec<CourseVideoResponse>>>, AppError> {
    find_course(&state.db, id).await?;
    require_video_access(&state, &auth_user, id).await?;

    let videos = course_video::Entity::find()
        .filter(course_video::Column::CourseId.eq(id))
        .filter(course_video::Column::IsActive.eq(true))
        .order_by_asc(course_video::Column::Position)
        .order_by_asc(course_video::Column::Id)
        .all(&state.db)
        .await?;

    Ok(Json(ApiResponse::new(
        "Videos",
        videos
            .into_iter()
            .map(CourseVideoResponse::from)
            .collect::<Vec<_>>(),
    )))
}

#[utoipa::path(
    post,
    path = "/{id}/videos",
    tag = "Course Videos",
    operation_id = "createCourseVideo",
    summary = "Add a video to a course",
    description = "Position defaults to the end of the course. Admin only.",
    params(("id" = i32, Path, description = "Course ID")),
    request_body = CreateCourseVideoRequest,
    responses(
        (status = 201, description = "Video added", body = ApiResponse<CourseVideoResponse>),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Forbidden", body = ErrorBody),
        (status = 404, description = "Course not found", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn create_course_video(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<CreateCourseVideoRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_admin()?;
    validate_create_video(&payload)?;

    let txn = state.db.begin().await?;
    find_course(&txn, id).await?;

    let position = match payload.position {
        Some(p) => p,
        None => next_position(&txn, id).await?,
    };

    let new_video = course_video::ActiveModel {
        course_id: Set(id),
        title: Set(payload.title.trim().to_string()),
        video_url: Set(payload.video_url),
        duration_seconds: Set(payload.duration_seconds),
        position: Set(position),
        is_active: Set(true),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let model = new_video.insert(&txn).await?;
    txn.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            "Video added",
            CourseVideoResponse::from(model),
        )),
    ))
}

#[utoipa::path(
    get,
    path = "/{id}/videos/{video_id}",
    tag = "Course Videos",
    operation_id = "getCourseVideo",
    summary = "Get a single course video",
    description = "Regular users must have purchased the course; admins skip the gate.",
    params(
        ("id" = i32, Path, description = "Course ID"),
        ("video_id" = i32, Path, description = "Video ID"),
    ),
    responses(
        (status = 200, description = "Video", body = ApiResponse<CourseVideoResponse>),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Course not purchased", body = ErrorBody),
        (status = 404, description = "Video not found", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id, video_id))]
pub async fn get_course_video(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, video_id)): Path<(i32, i32)>,
) -> Result<Json<ApiResponse<CourseVideoResponse>>, AppError> {
    find_course(&state.db, id).await?;
    require_video_access(&state, &auth_user, id).await?;

    let video = find_video_for_course(&state.db, id, video_id).await?;
    if !video.is_active {
        return Err(AppError::NotFound("Video not found".into()));
    }

    Ok(Json(ApiResponse::new(
        "Video",
        CourseVideoResponse::from(video),
    )))
}

#[utoipa::path(
    put,
    path = "/{id}/videos/{video_id}",
    tag = "Course Videos",
    operation_id = "updateCourseVideo",
    summary = "Update a course video",
    description = "PATCH semantics: only provided fields change. Admin only.",
    params(
        ("id" = i32, Path, description = "Course ID"),
        ("video_id" = i32, Path, description = "Video ID"),
    ),
    request_body = UpdateCourseVideoRequest,
    responses(
        (status = 200, description = "Video updated", body = ApiResponse<CourseVideoResponse>),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Forbidden", body = ErrorBody),
        (status = 404, description = "Video not found", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id, video_id))]
pub async fn update_course_video(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, video_id)): Path<(i32, i32)>,
    AppJson(payload): AppJson<UpdateCourseVideoRequest>,
) -> Result<Json<ApiResponse<CourseVideoResponse>>, AppError> {
    auth_user.require_admin()?;
    validate_update_video(&payload)?;

    let existing = find_video_for_course(&state.db, id, video_id).await?;
    let mut active: course_video::ActiveModel = existing.into();

    if let Some(title) = payload.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(video_url) = payload.video_url {
        active.video_url = Set(video_url);
    }
    if let Some(duration) = payload.duration_seconds {
        active.duration_seconds = Set(duration);
    }
    if let Some(position) = payload.position {
        active.position = Set(position);
    }

    let model = active.update(&state.db).await?;

    Ok(Json(ApiResponse::new(
        "Video updated",
        CourseVideoResponse::from(model),
    )))
}

#[utoipa::path(
    delete,
    path = "/{id}/videos/{video_id}",
    tag = "Course Videos",
    operation_id = "deleteCourseVideo",
    summary = "Retire a course video",
    description = "Soft delete. Admin only.",
    params(
        ("id" = i32, Path, description = "Course ID"),
        ("video_id" = i32, Path, description = "Video ID"),
    ),
    responses(
        (status = 200, description = "Video retired", body = ApiResponse<serde_json::Value>),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Forbidden", body = ErrorBody),
        (status = 404, description = "Video not found", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id, video_id))]
pub async fn delete_course_video(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, video_id)): Path<(i32, i32)>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    auth_user.require_admin()?;

    let existing = find_video_for_course(&state.db, id, video_id).await?;
    let mut active: course_video::ActiveModel = existing.into();
    active.is_active = Set(false);
    active.update(&state.db).await?;

    Ok(Json(ApiResponse::new(
        "Video retired",
        serde_json::Value::Null,
    )))
}

#[utoipa::path(
    get,
    path = "/admin/stats",
    tag = "Courses",
    operation_id = "courseStats",
    summary = "Catalog and revenue aggregates",
    description = "Admin only.",
    responses(
        (status = 200, description = "Stats", body = ApiResponse<CourseStatsResponse>),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Forbidden", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn course_stats(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<CourseStatsResponse>>, AppError> {
    auth_user.require_admin()?;

    let total_courses = course::Entity::find().count(&state.db).await?;
    let active_courses = course::Entity::find()
        .filter(course::Column::IsActive.eq(true))
        .count(&state.db)
        .await?;
    let total_purchases = course_purchase::Entity::find().count(&state.db).await?;

    let total_revenue: i64 = course_purchase::Entity::find()
        .select_only()
        .column_as(course_purchase::Column::PurchasePrice.sum(), "total")
        .into_tuple::<Option<i64>>()
        .one(&state.db)
        .await?
        .flatten()
        .unwrap_or(0);

    Ok(Json(ApiResponse::new(
        "Stats",
        CourseStatsResponse {
            total_courses,
            active_courses,
            total_purchases,
            total_revenue,
        },
    )))
}

#[utoipa::path(
    post,
    path = "/admin/seed",
    tag = "Courses",
    operation_id = "seedCourses",
    summary = "Seed the demo catalog",
    description = "Inserts the demo courses when the catalog is empty. Admin only.",
    responses(
        (status = 200, description = "Seeded", body = ApiResponse<SeedResponse>),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Forbidden", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn seed_courses(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<SeedResponse>>, AppError> {
    auth_user.require_admin()?;

    let courses_created = seed::seed_demo_courses(&state.db).await?;

    Ok(Json(ApiResponse::new(
        "Demo catalog seeded",
        SeedResponse { courses_created },
    )))
}

/// Purchase gate for video reads: admins pass, everyone else needs a
/// purchase record for the course.
async fn require_video_access(
    state: &AppState,
    auth_user: &AuthUser,
    course_id: i32,
) -> Result<(), AppError> {
    if auth_user.is_admin() {
        return Ok(());
    }
    if find_purchase(&state.db, auth_user.user_id, course_id)
        .await?
        .is_none()
    {
        return Err(AppError::Forbidden(
            "Course must be purchased to access its videos".into(),
        ));
    }
    Ok(())
}

async fn find_course<C: ConnectionTrait>(db: &C, id: i32) -> Result<course::Model, AppError> {
    course::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Course not found".into()))
}

async fn find_purchase<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    course_id: i32,
) -> Result<Option<course_purchase::Model>, AppError> {
    Ok(course_purchase::Entity::find()
        .filter(course_purchase::Column::UserId.eq(user_id))
        .filter(course_purchase::Column::CourseId.eq(course_id))
        .one(db)
        .await?)
}

async fn find_video_for_course<C: ConnectionTrait>(
    db: &C,
    course_id: i32,
    video_id: i32,
) -> Result<course_video::Model, AppError> {
    let video = course_video::Entity::find_by_id(video_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Video not found".into()))?;

    if video.course_id != course_id {
        return Err(AppError::NotFound("Video not found".into()));
    }

    Ok(video)
}

/// Next display position for a new video in a course.
async fn next_position<C: ConnectionTrait>(db: &C, course_id: i32) -> Result<i32, AppError> {
    let max_pos: Option<i32> = course_video::Entity::find()
        .filter(course_video::Column::CourseId.eq(course_id))
        .select_only()
        .column_as(course_video::Column::Position.max(), "max_pos")
        .into_tuple::<Option<i32>>()
        .one(db)
        .await?
        .flatten();
    max_pos
        .unwrap_or(-1)
        .checked_add(1)
        .ok_or_else(|| AppError::Validation("Position overflow".into()))
}
