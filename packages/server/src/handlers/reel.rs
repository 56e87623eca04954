use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::Query as SeaQuery;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{reel, reel_comment, reel_like, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::{AuthUser, OptionalAuthUser};
use crate::extractors::json::AppJson;
use crate::models::post::LikeToggleResponse;
use crate::models::reel::*;
use crate::models::shared::{ApiResponse, PageQuery, Pagination};
use crate::state::AppState;

/// How many of the latest comments ride along with each reel.
const FEED_COMMENT_LIMIT: u64 = 5;

#[utoipa::path(
    post,
    path = "/",
    tag = "Reels",
    operation_id = "createReel",
    summary = "Publish a reel",
    description = "Publishes a short video (1-300 seconds) with an optional caption.",
    request_body = CreateReelRequest,
    responses(
        (status = 201, description = "Reel published", body = ApiResponse<ReelResponse>),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn create_reel(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateReelRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_reel(&payload)?;

    let now = chrono::Utc::now();
    let new_reel = reel::ActiveModel {
        user_id: Set(auth_user.user_id),
        video_url: Set(payload.video_url.trim().to_string()),
        content: Set(payload.content),
        duration_seconds: Set(payload.duration_seconds),
        like_count: Set(0),
        share_count: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let model = new_reel.insert(&state.db).await?;
    let assembled = assemble_reel(&state.db, model, Some(auth_user.user_id)).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new("Reel published", assembled)),
    ))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Reels",
    operation_id = "listReels",
    summary = "Feed of reels, newest first",
    description = "Paginated feed. When the request carries a token, each item is enriched \
        with the viewer's like state.",
    params(PageQuery),
    responses(
        (status = 200, description = "Page of reels", body = ApiResponse<Vec<ReelResponse>>),
        (status = 401, description = "Invalid token", body = ErrorBody),
    ),
)]
#[instrument(skip(state, viewer, query))]
pub async fn list_reels(
    viewer: OptionalAuthUser,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<Vec<ReelResponse>>>, AppError> {
    let (page, limit) = query.clamped();

    let total = reel::Entity::find()
        .paginate(&state.db, limit)
        .num_items()
        .await?;

    let rows = reel::Entity::find()
        .order_by_desc(reel::Column::CreatedAt)
        .order_by_desc(reel::Column::Id)
        .offset(Some(PageQuery::offset(page, limit)))
        .limit(Some(limit))
        .all(&state.db)
        .await?;

    let mut data = Vec::with_capacity(rows.len());
    for row in rows {
        data.push(assemble_reel(&state.db, row, viewer.viewer_id()).await?);
    }

    Ok(Json(ApiResponse::paginated(
        "Reels",
        data,
        Pagination::new(page, limit, total),
    )))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Reels",
    operation_id = "getReel",
    summary = "Get a single reel",
    description = "Returns the assembled reel without viewer-relative flags.",
    params(("id" = i32, Path, description = "Reel ID")),
    responses(
        (status = 200, description = "Reel", body = ApiResponse<ReelResponse>),
        (status = 404, description = "Reel not found", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn get_reel(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<ReelResponse>>, AppError> {
    let model = find_reel(&state.db, id).await?;
    let assembled = assemble_reel(&state.db, model, None).await?;
    Ok(Json(ApiResponse::new("Reel", assembled)))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Reels",
    operation_id = "updateReel",
    summary = "Edit a reel's caption",
    description = "The video and duration are immutable; only the caption changes. Owner only.",
    params(("id" = i32, Path, description = "Reel ID")),
    request_body = UpdateReelRequest,
    responses(
        (status = 200, description = "Reel updated", body = ApiResponse<ReelResponse>),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Not the reel owner", body = ErrorBody),
        (status = 404, description = "Reel not found", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id, user_id = auth_user.user_id))]
pub async fn update_reel(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateReelRequest>,
) -> Result<Json<ApiResponse<ReelResponse>>, AppError> {
    validate_update_reel(&payload)?;

    let existing = find_reel(&state.db, id).await?;
    require_owner(&auth_user, existing.user_id)?;

    let mut active: reel::ActiveModel = existing.into();
    active.content = Set(payload.content);
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(&state.db).await?;
    let assembled = assemble_reel(&state.db, model, Some(auth_user.user_id)).await?;

    Ok(Json(ApiResponse::new("Reel updated", assembled)))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Reels",
    operation_id = "deleteReel",
    summary = "Delete a reel",
    description = "Deletes a reel along with its comments and likes. The stored video is \
        removed from object storage best-effort. Owner only.",
    params(("id" = i32, Path, description = "Reel ID")),
    responses(
        (status = 200, description = "Reel deleted", body = ApiResponse<serde_json::Value>),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Not the reel owner", body = ErrorBody),
        (status = 404, description = "Reel not found", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id, user_id = auth_user.user_id))]
pub async fn delete_reel(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let existing = find_reel(&state.db, id).await?;
    require_owner(&auth_user, existing.user_id)?;

    if let Some(key) = state.store.key_for_url(&existing.video_url)
        && let Err(e) = state.store.delete(&key).await
    {
        tracing::warn!(key = %key, error = %e, "Failed to delete reel video");
    }

    let txn = state.db.begin().await?;

    reel_like::Entity::delete_many()
        .filter(reel_like::Column::ReelId.eq(id))
        .exec(&txn)
        .await?;

    reel_like::Entity::delete_many()
        .filter(
            reel_like::Column::ReelCommentId.in_subquery(
                SeaQuery::select()
                    .column(reel_comment::Column::Id)
                    .from(reel_comment::Entity)
                    .and_where(reel_comment::Column::ReelId.eq(id))
                    .to_owned(),
            ),
        )
        .exec(&txn)
        .await?;

    reel_comment::Entity::delete_many()
        .filter(reel_comment::Column::ReelId.eq(id))
        .exec(&txn)
        .await?;

    reel::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;

    Ok(Json(ApiResponse::new("Reel deleted", serde_json::Value::Null)))
}

#[utoipa::path(
    post,
    path = "/{id}/like",
    tag = "Reels",
    operation_id = "toggleReelLike",
    summary = "Like or unlike a reel",
    params(("id" = i32, Path, description = "Reel ID")),
    responses(
        (status = 200, description = "Toggled", body = ApiResponse<LikeToggleResponse>),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 404, description = "Reel not found", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id, user_id = auth_user.user_id))]
pub async fn toggle_reel_like(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<LikeToggleResponse>>, AppError> {
    let txn = state.db.begin().await?;

    find_reel(&txn, id).await?;
    let liked = toggle_reel_like_row(&txn, auth_user.user_id, ReelLikeTarget::Reel(id)).await?;
    let like_count = find_reel(&txn, id).await?.like_count;

    txn.commit().await?;

    Ok(Json(ApiResponse::new(
        if liked { "Reel liked" } else { "Reel unliked" },
        LikeToggleResponse { liked, like_count },
    )))
}

#[utoipa::path(
    post,
    path = "/{id}/share",
    tag = "Reels",
    operation_id = "shareReel",
    summary = "Record a share of a reel",
    description = "Bumps the reel's share counter and returns the new total.",
    params(("id" = i32, Path, description = "Reel ID")),
    responses(
        (status = 200, description = "Share recorded", body = ApiResponse<ShareResponse>),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 404, description = "Reel not found", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user), fields(id))]
pub async fn share_reel(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<ShareResponse>>, AppError> {
    let txn = state.db.begin().await?;

    find_reel(&txn, id).await?;
    bump_reel_counter(&txn, id, reel::Column::ShareCount, 1).await?;
    let share_count = find_reel(&txn, id).await?.share_count;

    txn.commit().await?;

    Ok(Json(ApiResponse::new(
        "Share recorded",
        ShareResponse { share_count },
    )))
}

#[utoipa::path(
    get,
    path = "/{id}/comments",
    tag = "Reel Comments",
    operation_id = "listReelComments",
    summary = "Comments on a reel, newest first",
    params(("id" = i32, Path, description = "Reel ID"), PageQuery),
    responses(
        (status = 200, description = "Page of comments", body = ApiResponse<Vec<ReelCommentResponse>>),
        (status = 404, description = "Reel not found", body = ErrorBody),
    ),
)]
#[instrument(skip(state, viewer, query), fields(id))]
pub async fn list_reel_comments(
    viewer: OptionalAuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<Vec<ReelCommentResponse>>>, AppError> {
    let (page, limit) = query.clamped();

    find_reel(&state.db, id).await?;

    let total = reel_comment::Entity::find()
        .filter(reel_comment::Column::ReelId.eq(id))
        .paginate(&state.db, limit)
        .num_items()
        .await?;

    let rows = reel_comment::Entity::find()
        .filter(reel_comment::Column::ReelId.eq(id))
        .order_by_desc(reel_comment::Column::CreatedAt)
        .order_by_desc(reel_comment::Column::Id)
        .offset(Some(PageQuery::offset(page, limit)))
        .limit(Some(limit))
        .all(&state.db)
        .await?;

    let mut data = Vec::with_capacity(rows.len());
    for row in rows {
        data.push(assemble_reel_comment(&state.db, row, viewer.viewer_id()).await?);
    }

    Ok(Json(ApiResponse::paginated(
        "Comments",
        data,
        Pagination::new(page, limit, total),
    )))
}

#[utoipa::path(
    post,
    path = "/{id}/comments",
    tag = "Reel Comments",
    operation_id = "createReelComment",
    summary = "Comment on a reel",
    params(("id" = i32, Path, description = "Reel ID")),
    request_body = ReelCommentRequest,
    responses(
        (status = 201, description = "Comment created", body = ApiResponse<ReelCommentResponse>),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 404, description = "Reel not found", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id, user_id = auth_user.user_id))]
pub async fn create_reel_comment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<ReelCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_reel_comment(&payload)?;

    find_reel(&state.db, id).await?;

    let now = chrono::Utc::now();
    let new_comment = reel_comment::ActiveModel {
        reel_id: Set(id),
        user_id: Set(auth_user.user_id),
        content: Set(payload.content),
        images: Set(payload.images.unwrap_or_default()),
        like_count: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let model = new_comment.insert(&state.db).await?;
    let assembled = assemble_reel_comment(&state.db, model, Some(auth_user.user_id)).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new("Comment created", assembled)),
    ))
}

#[utoipa::path(
    put,
    path = "/comments/{id}",
    tag = "Reel Comments",
    operation_id = "updateReelComment",
    summary = "Edit a reel comment",
    description = "Replaces content and images. Owner only.",
    params(("id" = i32, Path, description = "Comment ID")),
    request_body = ReelCommentRequest,
    responses(
        (status = 200, description = "Comment updated", body = ApiResponse<ReelCommentResponse>),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Not the comment owner", body = ErrorBody),
        (status = 404, description = "Comment not found", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id, user_id = auth_user.user_id))]
pub async fn update_reel_comment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<ReelCommentRequest>,
) -> Result<Json<ApiResponse<ReelCommentResponse>>, AppError> {
    validate_reel_comment(&payload)?;

    let existing = find_reel_comment(&state.db, id).await?;
    require_owner(&auth_user, existing.user_id)?;

    let mut active: reel_comment::ActiveModel = existing.into();
    active.content = Set(payload.content);
    active.images = Set(payload.images.unwrap_or_default());
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(&state.db).await?;
    let assembled = assemble_reel_comment(&state.db, model, Some(auth_user.user_id)).await?;

    Ok(Json(ApiResponse::new("Comment updated", assembled)))
}

#[utoipa::path(
    delete,
    path = "/comments/{id}",
    tag = "Reel Comments",
    operation_id = "deleteReelComment",
    summary = "Delete a reel comment",
    description = "Deletes a comment and its likes. Owner only.",
    params(("id" = i32, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Comment deleted", body = ApiResponse<serde_json::Value>),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Not the comment owner", body = ErrorBody),
        (status = 404, description = "Comment not found", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id, user_id = auth_user.user_id))]
pub async fn delete_reel_comment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let existing = find_reel_comment(&state.db, id).await?;
    require_owner(&auth_user, existing.user_id)?;

    let txn = state.db.begin().await?;

    reel_like::Entity::delete_many()
        .filter(reel_like::Column::ReelCommentId.eq(id))
        .exec(&txn)
        .await?;
    reel_comment::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;

    Ok(Json(ApiResponse::new(
        "Comment deleted",
        serde_json::Value::Null,
    )))
}

#[utoipa::path(
    post,
    path = "/comments/{id}/like",
    tag = "Reel Comments",
    operation_id = "toggleReelCommentLike",
    summary = "Like or unlike a reel comment",
    params(("id" = i32, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Toggled", body = ApiResponse<LikeToggleResponse>),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 404, description = "Comment not found", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id, user_id = auth_user.user_id))]
pub async fn toggle_reel_comment_like(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<LikeToggleResponse>>, AppError> {
    let txn = state.db.begin().await?;

    find_reel_comment(&txn, id).await?;
    let liked = toggle_reel_like_row(&txn, auth_user.user_id, ReelLikeTarget::Comment(id)).await?;
    let like_count = find_reel_comment(&txn, id).await?.like_count;

    txn.commit().await?;

    Ok(Json(ApiResponse::new(
        if liked {
            "Comment liked"
        } else {
            "Comment unliked"
        },
        LikeToggleResponse { liked, like_count },
    )))
}

fn require_owner(auth_user: &AuthUser, owner_id: i32) -> Result<(), AppError> {
    if auth_user.user_id != owner_id {
        return Err(AppError::Forbidden(
            "Only the owner can modify this".into(),
        ));
    }
    Ok(())
}

async fn find_reel<C: ConnectionTrait>(db: &C, id: i32) -> Result<reel::Model, AppError> {
    reel::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Reel not found".into()))
}

async fn find_reel_comment<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<reel_comment::Model, AppError> {
    reel_comment::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found".into()))
}

async fn find_owner<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<user::Model, AppError> {
    user::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::Internal(format!("owner {user_id} missing")))
}

async fn bump_reel_counter<C: ConnectionTrait>(
    db: &C,
    reel_id: i32,
    column: reel::Column,
    delta: i32,
) -> Result<(), AppError> {
    reel::Entity::update_many()
        .col_expr(column, Expr::col(column).add(delta))
        .filter(reel::Column::Id.eq(reel_id))
        .exec(db)
        .await?;
    Ok(())
}

/// Reel counterpart of the post-side toggle: one like row per
/// (user, target), counter kept in lockstep.
async fn toggle_reel_like_row(
    txn: &DatabaseTransaction,
    user_id: i32,
    target: ReelLikeTarget,
) -> Result<bool, AppError> {
    let mut select = reel_like::Entity::find().filter(reel_like::Column::UserId.eq(user_id));
    select = match target {
        ReelLikeTarget::Reel(id) => select.filter(reel_like::Column::ReelId.eq(id)),
        ReelLikeTarget::Comment(id) => select.filter(reel_like::Column::ReelCommentId.eq(id)),
    };

    let existing = select.one(txn).await?;

    let liked = match existing {
        Some(row) => {
            reel_like::Entity::delete_by_id(row.id).exec(txn).await?;
            false
        }
        None => {
            let new_like = reel_like::ActiveModel {
                user_id: Set(user_id),
                reel_id: Set(target.reel_id()),
                reel_comment_id: Set(target.comment_id()),
                created_at: Set(chrono::Utc::now()),
                ..Default::default()
            };
            new_like.insert(txn).await.map_err(|e| match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    AppError::Conflict("Like already recorded".into())
                }
                _ => AppError::from(e),
            })?;
            true
        }
    };

    let delta = if liked { 1 } else { -1 };
    match target {
        ReelLikeTarget::Reel(id) => {
            bump_reel_counter(txn, id, reel::Column::LikeCount, delta).await?
        }
        ReelLikeTarget::Comment(id) => {
            reel_comment::Entity::update_many()
                .col_expr(
                    reel_comment::Column::LikeCount,
                    Expr::col(reel_comment::Column::LikeCount).add(delta),
                )
                .filter(reel_comment::Column::Id.eq(id))
                .exec(txn)
                .await?;
        }
    }

    Ok(liked)
}

async fn assemble_reel_comment<C: ConnectionTrait>(
    db: &C,
    model: reel_comment::Model,
    viewer_id: Option<i32>,
) -> Result<ReelCommentResponse, AppError> {
    let owner = find_owner(db, model.user_id).await?;

    let is_liked = match viewer_id {
        Some(viewer) => {
            reel_like::Entity::find()
                .filter(reel_like::Column::UserId.eq(viewer))
                .filter(reel_like::Column::ReelCommentId.eq(model.id))
                .count(db)
                .await?
                > 0
        }
        None => false,
    };

    Ok(ReelCommentResponse::assemble(model, owner, is_liked))
}

/// Per-row assembly on the same contract as posts: owner, latest
/// comments, comment count and the viewer's like flag.
async fn assemble_reel<C: ConnectionTrait>(
    db: &C,
    model: reel::Model,
    viewer_id: Option<i32>,
) -> Result<ReelResponse, AppError> {
    let owner = find_owner(db, model.user_id).await?;

    let comment_count = reel_comment::Entity::find()
        .filter(reel_comment::Column::ReelId.eq(model.id))
        .count(db)
        .await?;

    let comment_rows = reel_comment::Entity::find()
        .filter(reel_comment::Column::ReelId.eq(model.id))
        .order_by_desc(reel_comment::Column::CreatedAt)
        .order_by_desc(reel_comment::Column::Id)
        .limit(FEED_COMMENT_LIMIT)
        .all(db)
        .await?;

    let mut comments = Vec::with_capacity(comment_rows.len());
    for row in comment_rows {
        comments.push(assemble_reel_comment(db, row, viewer_id).await?);
    }

    let is_liked = match viewer_id {
        Some(viewer) => {
            reel_like::Entity::find()
                .filter(reel_like::Column::UserId.eq(viewer))
                .filter(reel_like::Column::ReelId.eq(model.id))
                .count(db)
                .await?
                > 0
        }
        None => false,
    };

    Ok(ReelResponse {
        id: model.id,
        user: owner.into(),
        video_url: model.video_url,
        content: model.content,
        duration_seconds: model.duration_seconds,
        like_count: model.like_count,
        share_count: model.share_count,
        comment_count,
        comments,
        is_liked,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}
