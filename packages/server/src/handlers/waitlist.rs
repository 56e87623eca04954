use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::*;
use tracing::instrument;

use crate::entity::waitlist_user;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::shared::{ApiResponse, PageQuery, Pagination};
use crate::models::waitlist::{
    JoinWaitlistRequest, WaitlistCountResponse, WaitlistUserResponse, validate_join_waitlist,
};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/join",
    tag = "Waitlist",
    operation_id = "joinWaitlist",
    summary = "Join the waitlist",
    request_body = JoinWaitlistRequest,
    responses(
        (status = 201, description = "Joined", body = ApiResponse<WaitlistUserResponse>),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 409, description = "Email already on the waitlist", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn join_waitlist(
    State(state): State<AppState>,
    AppJson(payload): AppJson<JoinWaitlistRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_join_waitlist(&payload)?;

    let new_entry = waitlist_user::ActiveModel {
        name: Set(payload.name.map(|n| n.trim().to_string())),
        email: Set(payload.email.trim().to_lowercase()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let model = new_entry.insert(&state.db).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("Email is already on the waitlist".into())
        }
        _ => AppError::from(e),
    })?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            "Welcome to the waitlist",
            WaitlistUserResponse::from(model),
        )),
    ))
}

#[utoipa::path(
    get,
    path = "/count",
    tag = "Waitlist",
    operation_id = "waitlistCount",
    summary = "How many people are on the waitlist",
    responses(
        (status = 200, description = "Count", body = ApiResponse<WaitlistCountResponse>),
    ),
)]
#[instrument(skip(state))]
pub async fn waitlist_count(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<WaitlistCountResponse>>, AppError> {
    let count = waitlist_user::Entity::find().count(&state.db).await?;

    Ok(Json(ApiResponse::new(
        "Waitlist count",
        WaitlistCountResponse { count },
    )))
}

#[utoipa::path(
    get,
    path = "/admin/users",
    tag = "Waitlist",
    operation_id = "listWaitlistUsers",
    summary = "List waitlist signups",
    description = "Paginated, oldest first. Admin only.",
    params(PageQuery),
    responses(
        (status = 200, description = "Signups", body = ApiResponse<Vec<WaitlistUserResponse>>),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Forbidden", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_waitlist_users(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<Vec<WaitlistUserResponse>>>, AppError> {
    auth_user.require_admin()?;

    let (page, limit) = query.clamped();

    let total = waitlist_user::Entity::find()
        .paginate(&state.db, limit)
        .num_items()
        .await?;

    let rows = waitlist_user::Entity::find()
        .order_by_asc(waitlist_user::Column::CreatedAt)
        .order_by_asc(waitlist_user::Column::Id)
        .offset(Some(PageQuery::offset(page, limit)))
        .limit(Some(limit))
        .all(&state.db)
        .await?;

    Ok(Json(ApiResponse::paginated(
        "Waitlist signups",
        rows.into_iter()
            .map(WaitlistUserResponse::from)
            .collect::<Vec<_>>(),
        Pagination::new(page, limit, total),
    )))
}

#[utoipa::path(
    delete,
    path = "/admin/users/{id}",
    tag = "Waitlist",
    operation_id = "deleteWaitlistUser",
    summary = "Remove a waitlist signup",
    description = "Admin only.",
    params(("id" = i32, Path, description = "Waitlist entry ID")),
    responses(
        (status = 200, description = "Removed", body = ApiResponse<serde_json::Value>),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Forbidden", body = ErrorBody),
        (status = 404, description = "Entry not found", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_waitlist_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    auth_user.require_admin()?;

    let result = waitlist_user::Entity::delete_by_id(id)
        .exec(&state.db)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Waitlist entry not found".into()));
    }

    Ok(Json(ApiResponse::new(
        "Waitlist entry removed",
        serde_json::Value::Null,
    )))
}
