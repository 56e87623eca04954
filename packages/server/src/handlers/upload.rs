use std::time::Duration;

use axum::Json;
use axum::extract::State;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::shared::ApiResponse;
use crate::models::upload::{
    PresignedUrlRequest, PresignedUrlResponse, file_extension, validate_presigned_url_request,
};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/presigned-url",
    tag = "Uploads",
    operation_id = "createPresignedUrl",
    summary = "Issue a presigned upload URL",
    description = "Returns a short-lived PUT URL for uploading one image or video directly to \
        object storage, plus the public URL the object will be served under.",
    request_body = PresignedUrlRequest,
    responses(
        (status = 200, description = "Presigned URL", body = ApiResponse<PresignedUrlResponse>),
        (status = 400, description = "Unsupported file type or folder", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn create_presigned_url(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<PresignedUrlRequest>,
) -> Result<Json<ApiResponse<PresignedUrlResponse>>, AppError> {
    validate_presigned_url_request(&payload)?;

    let ext = file_extension(&payload.file_name)?;
    let folder = payload.folder.as_deref().unwrap_or("uploads");
    let key = format!("{folder}/{}.{ext}", Uuid::new_v4());

    let upload_url = state
        .store
        .presign_put(
            &key,
            &payload.content_type,
            Duration::from_secs(state.config.storage.presign_expiry_secs),
        )
        .await?;

    Ok(Json(ApiResponse::new(
        "Presigned URL issued",
        PresignedUrlResponse {
            upload_url,
            public_url: state.store.public_url(&key),
            key,
        },
    )))
}
