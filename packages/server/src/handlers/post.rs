use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::Query as SeaQuery;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{bookmark, comment, like, post, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::{AuthUser, OptionalAuthUser};
use crate::extractors::json::AppJson;
use crate::models::post::*;
use crate::models::shared::{ApiResponse, PageQuery, Pagination};
use crate::state::AppState;

/// How many of the latest comments ride along with each feed item.
const FEED_COMMENT_LIMIT: u64 = 5;

#[utoipa::path(
    post,
    path = "/",
    tag = "Posts",
    operation_id = "createPost",
    summary = "Create a post",
    description = "Creates a post. Content or at least one image is required; counters start \
        at zero.",
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Post created", body = ApiResponse<PostResponse>),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn create_post(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreatePostRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_post(&payload)?;

    let now = chrono::Utc::now();
    let new_post = post::ActiveModel {
        user_id: Set(auth_user.user_id),
        content: Set(payload.content),
        images: Set(payload.images.unwrap_or_default()),
        like_count: Set(0),
        share_count: Set(0),
        bookmark_count: Set(0),
        is_retweet: Set(false),
        original_post_id: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let model = new_post.insert(&state.db).await?;
    let assembled = assemble_post(&state.db, model, Some(auth_user.user_id)).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new("Post created", assembled)),
    ))
}

#[utoipa::path(
    post,
    path = "/retweet",
    tag = "Posts",
    operation_id = "createRetweet",
    summary = "Retweet a post",
    description = "Creates a retweet (optionally quoting) of an existing post and bumps the \
        original's share counter. Retweets of retweets are rejected, and each user can \
        retweet a given post once.",
    request_body = RetweetRequest,
    responses(
        (status = 201, description = "Retweet created", body = ApiResponse<PostResponse>),
        (status = 400, description = "Original is itself a retweet", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 404, description = "Original post not found", body = ErrorBody),
        (status = 409, description = "Already retweeted", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, original = payload.original_post_id))]
pub async fn create_retweet(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<RetweetRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_retweet(&payload)?;

    let txn = state.db.begin().await?;

    let original = find_post(&txn, payload.original_post_id).await?;
    if original.is_retweet {
        return Err(AppError::Validation("A retweet cannot be retweeted".into()));
    }

    let already = post::Entity::find()
        .filter(post::Column::UserId.eq(auth_user.user_id))
        .filter(post::Column::OriginalPostId.eq(original.id))
        .filter(post::Column::IsRetweet.eq(true))
        .count(&txn)
        .await?;
    if already > 0 {
        return Err(AppError::Conflict("Post already retweeted".into()));
    }

    let now = chrono::Utc::now();
    let new_retweet = post::ActiveModel {
        user_id: Set(auth_user.user_id),
        content: Set(payload.content),
        images: Set(payload.images.unwrap_or_default()),
        like_count: Set(0),
        share_count: Set(0),
        bookmark_count: Set(0),
        is_retweet: Set(true),
        original_post_id: Set(Some(original.id)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    // The unique (user, original) index backstops the count probe above
    // against concurrent duplicates.
    let model = new_retweet.insert(&txn).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("Post already retweeted".into())
        }
        _ => AppError::from(e),
    })?;

    post::Entity::update_many()
        .col_expr(
            post::Column::ShareCount,
            Expr::col(post::Column::ShareCount).add(1),
        )
        .filter(post::Column::Id.eq(original.id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    let assembled = assemble_post(&state.db, model, Some(auth_user.user_id)).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new("Retweet created", assembled)),
    ))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Posts",
    operation_id = "listPosts",
    summary = "Feed of posts, newest first",
    description = "Paginated feed. When the request carries a token, each item is enriched \
        with the viewer's like/bookmark/retweet state.",
    params(PageQuery),
    responses(
        (status = 200, description = "Page of posts", body = ApiResponse<Vec<PostResponse>>),
        (status = 401, description = "Invalid token", body = ErrorBody),
    ),
)]
#[instrument(skip(state, viewer, query))]
pub async fn list_posts(
    viewer: OptionalAuthUser,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<Vec<PostResponse>>>, AppError> {
    let (page, limit) = query.clamped();

    let total = post::Entity::find()
        .paginate(&state.db, limit)
        .num_items()
        .await?;

    let rows = post::Entity::find()
        .order_by_desc(post::Column::CreatedAt)
        .order_by_desc(post::Column::Id)
        .offset(Some(PageQuery::offset(page, limit)))
        .limit(Some(limit))
        .all(&state.db)
        .await?;

    let mut data = Vec::with_capacity(rows.len());
    for row in rows {
        data.push(assemble_post(&state.db, row, viewer.viewer_id()).await?);
    }

    Ok(Json(ApiResponse::paginated(
        "Posts",
        data,
        Pagination::new(page, limit, total),
    )))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Posts",
    operation_id = "getPost",
    summary = "Get a single post",
    description = "Returns the assembled post. Unlike the feed, this path carries no \
        viewer-relative flags; they are always `false` here.",
    params(("id" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post", body = ApiResponse<PostResponse>),
        (status = 404, description = "Post not found", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<PostResponse>>, AppError> {
    let model = find_post(&state.db, id).await?;
    let assembled = assemble_post(&state.db, model, None).await?;
    Ok(Json(ApiResponse::new("Post", assembled)))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Posts",
    operation_id = "updatePost",
    summary = "Edit a post",
    description = "Replaces content and images. Owner only.",
    params(("id" = i32, Path, description = "Post ID")),
    request_body = UpdatePostRequest,
    responses(
        (status = 200, description = "Post updated", body = ApiResponse<PostResponse>),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Not the post owner", body = ErrorBody),
        (status = 404, description = "Post not found", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id, user_id = auth_user.user_id))]
pub async fn update_post(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdatePostRequest>,
) -> Result<Json<ApiResponse<PostResponse>>, AppError> {
    validate_update_post(&payload)?;

    let existing = find_post(&state.db, id).await?;
    require_owner(&auth_user, existing.user_id)?;

    let mut active: post::ActiveModel = existing.into();
    active.content = Set(payload.content);
    active.images = Set(payload.images.unwrap_or_default());
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(&state.db).await?;
    let assembled = assemble_post(&state.db, model, Some(auth_user.user_id)).await?;

    Ok(Json(ApiResponse::new("Post updated", assembled)))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Posts",
    operation_id = "deletePost",
    summary = "Delete a post",
    description = "Deletes a post along with its comments, likes and bookmarks. Stored images \
        are removed from object storage best-effort. Retweets of the deleted post survive \
        with their origin cleared. Owner only.",
    params(("id" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post deleted", body = ApiResponse<serde_json::Value>),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Not the post owner", body = ErrorBody),
        (status = 404, description = "Post not found", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id, user_id = auth_user.user_id))]
pub async fn delete_post(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let existing = find_post(&state.db, id).await?;
    require_owner(&auth_user, existing.user_id)?;

    // Object storage cleanup is best effort; a failed delete never
    // blocks removing the post itself.
    for url in &existing.images {
        let Some(key) = state.store.key_for_url(url) else {
            continue;
        };
        if let Err(e) = state.store.delete(&key).await {
            tracing::warn!(key = %key, error = %e, "Failed to delete post image");
        }
    }

    let txn = state.db.begin().await?;

    like::Entity::delete_many()
        .filter(like::Column::PostId.eq(id))
        .exec(&txn)
        .await?;

    like::Entity::delete_many()
        .filter(
            like::Column::CommentId.in_subquery(
                SeaQuery::select()
                    .column(comment::Column::Id)
                    .from(comment::Entity)
                    .and_where(comment::Column::PostId.eq(id))
                    .to_owned(),
            ),
        )
        .exec(&txn)
        .await?;

    comment::Entity::delete_many()
        .filter(comment::Column::PostId.eq(id))
        .exec(&txn)
        .await?;

    bookmark::Entity::delete_many()
        .filter(bookmark::Column::PostId.eq(id))
        .exec(&txn)
        .await?;

    // Retweets of this post keep their own row; their origin renders as
    // unavailable from now on.
    post::Entity::update_many()
        .col_expr(post::Column::OriginalPostId, Expr::value(None::<i32>))
        .filter(post::Column::OriginalPostId.eq(id))
        .exec(&txn)
        .await?;

    post::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;

    Ok(Json(ApiResponse::new("Post deleted", serde_json::Value::Null)))
}

#[utoipa::path(
    post,
    path = "/{id}/like",
    tag = "Posts",
    operation_id = "togglePostLike",
    summary = "Like or unlike a post",
    description = "Toggles the viewer's like on a post and returns the new state and counter.",
    params(("id" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Toggled", body = ApiResponse<LikeToggleResponse>),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 404, description = "Post not found", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id, user_id = auth_user.user_id))]
pub async fn toggle_post_like(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<LikeToggleResponse>>, AppError> {
    let txn = state.db.begin().await?;

    find_post(&txn, id).await?;
    let liked = toggle_like_row(&txn, auth_user.user_id, LikeTarget::Post(id)).await?;
    let like_count = find_post(&txn, id).await?.like_count;

    txn.commit().await?;

    Ok(Json(ApiResponse::new(
        if liked { "Post liked" } else { "Post unliked" },
        LikeToggleResponse { liked, like_count },
    )))
}

#[utoipa::path(
    post,
    path = "/{id}/bookmark",
    tag = "Posts",
    operation_id = "togglePostBookmark",
    summary = "Bookmark or unbookmark a post",
    params(("id" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Toggled", body = ApiResponse<BookmarkToggleResponse>),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 404, description = "Post not found", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id, user_id = auth_user.user_id))]
pub async fn toggle_post_bookmark(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<BookmarkToggleResponse>>, AppError> {
    let txn = state.db.begin().await?;

    find_post(&txn, id).await?;

    let existing = bookmark::Entity::find()
        .filter(bookmark::Column::UserId.eq(auth_user.user_id))
        .filter(bookmark::Column::PostId.eq(id))
        .one(&txn)
        .await?;

    let bookmarked = match existing {
        Some(row) => {
            bookmark::Entity::delete_by_id(row.id).exec(&txn).await?;
            bump_post_counter(&txn, id, post::Column::BookmarkCount, -1).await?;
            false
        }
        None => {
            let new_bookmark = bookmark::ActiveModel {
                user_id: Set(auth_user.user_id),
                post_id: Set(id),
                created_at: Set(chrono::Utc::now()),
                ..Default::default()
            };
            new_bookmark.insert(&txn).await.map_err(|e| match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    AppError::Conflict("Bookmark already recorded".into())
                }
                _ => AppError::from(e),
            })?;
            bump_post_counter(&txn, id, post::Column::BookmarkCount, 1).await?;
            true
        }
    };

    let bookmark_count = find_post(&txn, id).await?.bookmark_count;

    txn.commit().await?;

    Ok(Json(ApiResponse::new(
        if bookmarked {
            "Post bookmarked"
        } else {
            "Bookmark removed"
        },
        BookmarkToggleResponse {
            bookmarked,
            bookmark_count,
        },
    )))
}

#[utoipa::path(
    get,
    path = "/{id}/comments",
    tag = "Comments",
    operation_id = "listComments",
    summary = "Comments on a post, newest first",
    params(("id" = i32, Path, description = "Post ID"), PageQuery),
    responses(
        (status = 200, description = "Page of comments", body = ApiResponse<Vec<CommentResponse>>),
        (status = 404, description = "Post not found", body = ErrorBody),
    ),
)]
#[instrument(skip(state, viewer, query), fields(id))]
pub async fn list_comments(
    viewer: OptionalAuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<Vec<CommentResponse>>>, AppError> {
    let (page, limit) = query.clamped();

    find_post(&state.db, id).await?;

    let total = comment::Entity::find()
        .filter(comment::Column::PostId.eq(id))
        .paginate(&state.db, limit)
        .num_items()
        .await?;

    let rows = comment::Entity::find()
        .filter(comment::Column::PostId.eq(id))
        .order_by_desc(comment::Column::CreatedAt)
        .order_by_desc(comment::Column::Id)
        .offset(Some(PageQuery::offset(page, limit)))
        .limit(Some(limit))
        .all(&state.db)
        .await?;

    let mut data = Vec::with_capacity(rows.len());
    for row in rows {
        data.push(assemble_comment(&state.db, row, viewer.viewer_id()).await?);
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
    tag = "Comments",
    operation_id = "createComment",
    summary = "Comment on a post",
    params(("id" = i32, Path, description = "Post ID")),
    request_body = CommentRequest,
    responses(
        (status = 201, description = "Comment created", body = ApiResponse<CommentResponse>),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 404, description = "Post not found", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id, user_id = auth_user.user_id))]
pub async fn create_comment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<CommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_comment(&payload)?;

    find_post(&state.db, id).await?;

    let now = chrono::Utc::now();
    let new_comment = comment::ActiveModel {
        post_id: Set(id),
        user_id: Set(auth_user.user_id),
        content: Set(payload.content),
        images: Set(payload.images.unwrap_or_default()),
        like_count: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let model = new_comment.insert(&state.db).await?;
    let assembled = assemble_comment(&state.db, model, Some(auth_user.user_id)).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new("Comment created", assembled)),
    ))
}

#[utoipa::path(
    put,
    path = "/comments/{id}",
    tag = "Comments",
    operation_id = "updateComment",
    summary = "Edit a comment",
    description = "Replaces content and images. Owner only.",
    params(("id" = i32, Path, description = "Comment ID")),
    request_body = CommentRequest,
    responses(
        (status = 200, description = "Comment updated", body = ApiResponse<CommentResponse>),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Not the comment owner", body = ErrorBody),
        (status = 404, description = "Comment not found", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id, user_id = auth_user.user_id))]
pub async fn update_comment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<CommentRequest>,
) -> Result<Json<ApiResponse<CommentResponse>>, AppError> {
    validate_comment(&payload)?;

    let existing = find_comment(&state.db, id).await?;
    require_owner(&auth_user, existing.user_id)?;

    let mut active: comment::ActiveModel = existing.into();
    active.content = Set(payload.content);
    active.images = Set(payload.images.unwrap_or_default());
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(&state.db).await?;
    let assembled = assemble_comment(&state.db, model, Some(auth_user.user_id)).await?;

    Ok(Json(ApiResponse::new("Comment updated", assembled)))
}

#[utoipa::path(
    delete,
    path = "/comments/{id}",
    tag = "Comments",
    operation_id = "deleteComment",
    summary = "Delete a comment",
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
pub async fn delete_comment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let existing = find_comment(&state.db, id).await?;
    require_owner(&auth_user, existing.user_id)?;

    let txn = state.db.begin().await?;

    like::Entity::delete_many()
        .filter(like::Column::CommentId.eq(id))
        .exec(&txn)
        .await?;
    comment::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;

    Ok(Json(ApiResponse::new(
        "Comment deleted",
        serde_json::Value::Null,
    )))
}

#[utoipa::path(
    post,
    path = "/comments/{id}/like",
    tag = "Comments",
    operation_id = "toggleCommentLike",
    summary = "Like or unlike a comment",
    params(("id" = i32, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Toggled", body = ApiResponse<LikeToggleResponse>),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 404, description = "Comment not found", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id, user_id = auth_user.user_id))]
pub async fn toggle_comment_like(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<LikeToggleResponse>>, AppError> {
    let txn = state.db.begin().await?;

    find_comment(&txn, id).await?;
    let liked = toggle_like_row(&txn, auth_user.user_id, LikeTarget::Comment(id)).await?;
    let like_count = find_comment(&txn, id).await?.like_count;

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

async fn find_post<C: ConnectionTrait>(db: &C, id: i32) -> Result<post::Model, AppError> {
    post::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".into()))
}

async fn find_comment<C: ConnectionTrait>(db: &C, id: i32) -> Result<comment::Model, AppError> {
    comment::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found".into()))
}

/// Owners are fetched per row; a dangling owner means the cascade rules
/// were violated out-of-band.
async fn find_owner<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<user::Model, AppError> {
    user::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::Internal(format!("owner {user_id} missing")))
}

async fn bump_post_counter<C: ConnectionTrait>(
    db: &C,
    post_id: i32,
    column: post::Column,
    delta: i32,
) -> Result<(), AppError> {
    post::Entity::update_many()
        .col_expr(column, Expr::col(column).add(delta))
        .filter(post::Column::Id.eq(post_id))
        .exec(db)
        .await?;
    Ok(())
}

/// Insert or remove the like row for `target` and bump the matching
/// counter. Returns the resulting liked state.
///
/// Runs check-then-act inside the caller's transaction; the partial
/// unique indexes turn a concurrent duplicate insert into a 409.
async fn toggle_like_row(
    txn: &DatabaseTransaction,
    user_id: i32,
    target: LikeTarget,
) -> Result<bool, AppError> {
    let mut select = like::Entity::find().filter(like::Column::UserId.eq(user_id));
    select = match target {
        LikeTarget::Post(id) => select.filter(like::Column::PostId.eq(id)),
        LikeTarget::Comment(id) => select.filter(like::Column::CommentId.eq(id)),
    };

    let existing = select.one(txn).await?;

    let liked = match existing {
        Some(row) => {
            like::Entity::delete_by_id(row.id).exec(txn).await?;
            false
        }
        None => {
            let new_like = like::ActiveModel {
                user_id: Set(user_id),
                post_id: Set(target.post_id()),
                comment_id: Set(target.comment_id()),
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
        LikeTarget::Post(id) => bump_post_counter(txn, id, post::Column::LikeCount, delta).await?,
        LikeTarget::Comment(id) => {
            comment::Entity::update_many()
                .col_expr(
                    comment::Column::LikeCount,
                    Expr::col(comment::Column::LikeCount).add(delta),
                )
                .filter(comment::Column::Id.eq(id))
                .exec(txn)
                .await?;
        }
    }

    Ok(liked)
}

async fn has_liked_post<C: ConnectionTrait>(
    db: &C,
    viewer_id: i32,
    post_id: i32,
) -> Result<bool, AppError> {
    Ok(like::Entity::find()
        .filter(like::Column::UserId.eq(viewer_id))
        .filter(like::Column::PostId.eq(post_id))
        .count(db)
        .await?
        > 0)
}

async fn has_bookmarked<C: ConnectionTrait>(
    db: &C,
    viewer_id: i32,
    post_id: i32,
) -> Result<bool, AppError> {
    Ok(bookmark::Entity::find()
        .filter(bookmark::Column::UserId.eq(viewer_id))
        .filter(bookmark::Column::PostId.eq(post_id))
        .count(db)
        .await?
        > 0)
}

async fn has_retweeted<C: ConnectionTrait>(
    db: &C,
    viewer_id: i32,
    post_id: i32,
) -> Result<bool, AppError> {
    Ok(post::Entity::find()
        .filter(post::Column::UserId.eq(viewer_id))
        .filter(post::Column::OriginalPostId.eq(post_id))
        .filter(post::Column::IsRetweet.eq(true))
        .count(db)
        .await?
        > 0)
}

pub(crate) async fn assemble_comment<C: ConnectionTrait>(
    db: &C,
    model: comment::Model,
    viewer_id: Option<i32>,
) -> Result<CommentResponse, AppError> {
    let owner = find_owner(db, model.user_id).await?;

    let is_liked = match viewer_id {
        Some(viewer) => {
            like::Entity::find()
                .filter(like::Column::UserId.eq(viewer))
                .filter(like::Column::CommentId.eq(model.id))
                .count(db)
                .await?
                > 0
        }
        None => false,
    };

    Ok(CommentResponse::assemble(model, owner, is_liked))
}

/// Shallow view of a retweet's origin: owner and counters only, never
/// its own origin or comments.
async fn assemble_bare_post<C: ConnectionTrait>(
    db: &C,
    model: post::Model,
) -> Result<OriginalPostResponse, AppError> {
    let owner = find_owner(db, model.user_id).await?;
    Ok(OriginalPostResponse::assemble(model, owner))
}

/// Full per-row assembly: owner, latest comments, comment count, the
/// viewer's interaction flags, and (for retweets) the bare origin view.
async fn assemble_post<C: ConnectionTrait>(
    db: &C,
    model: post::Model,
    viewer_id: Option<i32>,
) -> Result<PostResponse, AppError> {
    let owner = find_owner(db, model.user_id).await?;

    let comment_count = comment::Entity::find()
        .filter(comment::Column::PostId.eq(model.id))
        .count(db)
        .await?;

    let comment_rows = comment::Entity::find()
        .filter(comment::Column::PostId.eq(model.id))
        .order_by_desc(comment::Column::CreatedAt)
        .order_by_desc(comment::Column::Id)
        .limit(FEED_COMMENT_LIMIT)
        .all(db)
        .await?;

    let mut comments = Vec::with_capacity(comment_rows.len());
    for row in comment_rows {
        comments.push(assemble_comment(db, row, viewer_id).await?);
    }

    let (is_liked, is_bookmarked, is_retweeted) = match viewer_id {
        Some(viewer) => (
            has_liked_post(db, viewer, model.id).await?,
            has_bookmarked(db, viewer, model.id).await?,
            has_retweeted(db, viewer, model.id).await?,
        ),
        None => (false, false, false),
    };

    let original_post = match (model.is_retweet, model.original_post_id) {
        (true, Some(original_id)) => match post::Entity::find_by_id(original_id).one(db).await? {
            Some(original) => Some(assemble_bare_post(db, original).await?),
            None => None,
        },
        _ => None,
    };

    Ok(PostResponse {
        id: model.id,
        user: owner.into(),
        content: model.content,
        images: model.images,
        like_count: model.like_count,
        share_count: model.share_count,
        bookmark_count: model.bookmark_count,
        comment_count,
        is_retweet: model.is_retweet,
        original_post,
        comments,
        is_liked,
        is_bookmarked,
        is_retweeted,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}
