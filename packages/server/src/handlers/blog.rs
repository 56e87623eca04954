use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr};
use sea_orm::*;
use tracing::instrument;

use crate::entity::blog_post;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::jobs::blog_generator::GenerateError;
use crate::models::blog::{BlogListItem, BlogListQuery, BlogPostResponse, GenerationResponse};
use crate::models::shared::{ApiResponse, PageQuery, Pagination, escape_like};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "Blogs",
    operation_id = "listBlogs",
    summary = "Finance-news feed",
    description = "Paginated articles, newest first, optionally filtered by tag, region, \
        sector or a title search.",
    params(BlogListQuery),
    responses(
        (status = 200, description = "Page of articles", body = ApiResponse<Vec<BlogListItem>>),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_blogs(
    State(state): State<AppState>,
    Query(query): Query<BlogListQuery>,
) -> Result<Json<ApiResponse<Vec<BlogListItem>>>, AppError> {
    let page_query = PageQuery {
        page: query.page,
        limit: query.limit,
    };
    let (page, limit) = page_query.clamped();

    let mut select = blog_post::Entity::find();

    if let Some(ref tag) = query.tag {
        select = select.filter(Expr::cust_with_values(
            r#""tags" @> ARRAY[?]"#,
            [tag.clone()],
        ));
    }
    if let Some(ref region) = query.region {
        select = select.filter(Expr::cust_with_values(
            r#""regions" @> ARRAY[?]"#,
            [region.clone()],
        ));
    }
    if let Some(ref sector) = query.sector {
        select = select.filter(blog_post::Column::Sector.eq(sector));
    }
    if let Some(ref search) = query.search {
        let term = escape_like(search.trim());
        if !term.is_empty() {
            select = select.filter(
                Expr::expr(Func::lower(Expr::col(blog_post::Column::Title)))
                    .like(LikeExpr::new(format!("%{}%", term.to_lowercase())).escape('\\')),
            );
        }
    }

    let total = select.clone().paginate(&state.db, limit).num_items().await?;

    let rows = select
        .order_by_desc(blog_post::Column::PublishedAt)
        .order_by_desc(blog_post::Column::Id)
        .offset(Some(PageQuery::offset(page, limit)))
        .limit(Some(limit))
        .all(&state.db)
        .await?;

    Ok(Json(ApiResponse::paginated(
        "Articles",
        rows.into_iter().map(BlogListItem::from).collect::<Vec<_>>(),
        Pagination::new(page, limit, total),
    )))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Blogs",
    operation_id = "getBlog",
    summary = "Read an article",
    description = "Returns the full article and bumps its view counter.",
    params(("id" = i32, Path, description = "Article ID")),
    responses(
        (status = 200, description = "Article", body = ApiResponse<BlogPostResponse>),
        (status = 404, description = "Article not found", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn get_blog(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<BlogPostResponse>>, AppError> {
    // Single-statement bump keeps the counter monotonic under
    // concurrent reads.
    let updated = blog_post::Entity::update_many()
        .col_expr(
            blog_post::Column::Views,
            Expr::col(blog_post::Column::Views).add(1),
        )
        .filter(blog_post::Column::Id.eq(id))
        .exec(&state.db)
        .await?;

    if updated.rows_affected == 0 {
        return Err(AppError::NotFound("Article not found".into()));
    }

    let model = blog_post::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Article not found".into()))?;

    Ok(Json(ApiResponse::new(
        "Article",
        BlogPostResponse::from(model),
    )))
}

#[utoipa::path(
    post,
    path = "/generate",
    tag = "Blogs",
    operation_id = "generateBlogs",
    summary = "Trigger a generation run now",
    description = "Runs the AI news pipeline immediately. One run at a time; a run already in \
        flight is reported as a conflict. Admin only.",
    responses(
        (status = 200, description = "Run finished", body = ApiResponse<GenerationResponse>),
        (status = 400, description = "Generator not configured", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Forbidden", body = ErrorBody),
        (status = 409, description = "A run is already in progress", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn generate_blogs(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_admin()?;

    let summary = state.blog.generate_now().await.map_err(|e| match e {
        GenerateError::AlreadyRunning => {
            AppError::Conflict("A generation run is already in progress".into())
        }
        GenerateError::NotConfigured => {
            AppError::Validation("The AI news generator is not configured".into())
        }
        GenerateError::Upstream(detail) => AppError::Internal(detail),
    })?;

    Ok(Json(ApiResponse::new(
        "Generation run finished",
        GenerationResponse {
            generated: summary.generated,
            failed: summary.failed,
        },
    )))
}
