use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use sea_orm::*;
use tracing::instrument;

use crate::entity::user::{self, ROLE_ADMIN, ROLE_USER};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::auth::{
    AdminSigninRequest, AuthResponse, CreateAdminRequest, SendOtpRequest, SendOtpResponse,
    SignupRequest, UserResponse, VerifyOtpRequest, validate_admin_signin_request,
    validate_create_admin_request, validate_mobile_number, validate_signup_request,
    validate_verify_otp_request,
};
use crate::models::shared::ApiResponse;
use crate::state::AppState;
use crate::utils::{hash, jwt, otp};

#[utoipa::path(
    post,
    path = "/signup",
    tag = "Auth",
    operation_id = "signup",
    summary = "Create an account and trigger OTP verification",
    description = "Creates an OTP-only account (no password, role `user`), immediately sends a \
        verification OTP to the mobile number, and returns a session token.",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = ApiResponse<AuthResponse>),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 409, description = "Username, email or mobile number taken", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(username = %payload.username))]
pub async fn signup(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_signup_request(&payload)?;

    let now = chrono::Utc::now();
    let new_user = user::ActiveModel {
        name: Set(payload.name.trim().to_string()),
        username: Set(payload.username.trim().to_string()),
        email: Set(payload.email.trim().to_lowercase()),
        mobile_number: Set(payload.mobile_number.trim().to_string()),
        password: Set(None),
        role: Set(ROLE_USER.to_string()),
        is_verified: Set(false),
        avatar: Set(None),
        is_influencer: Set(false),
        influencer_url: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let user = new_user.insert(&state.db).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("Username, email or mobile number is already registered".into())
        }
        _ => AppError::from(e),
    })?;

    send_otp_to(&state, &user.mobile_number).await?;

    let token = sign_token(&state, &user)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            "Account created. OTP sent for verification",
            AuthResponse {
                token,
                user: user.into(),
            },
        )),
    ))
}

#[utoipa::path(
    post,
    path = "/send-otp",
    tag = "Auth",
    operation_id = "sendOtp",
    summary = "Send a login OTP to a registered mobile number",
    description = "Issues a 6-digit code valid for a few minutes. Asking again while the \
        previous code is still fresh is rate-limited.",
    request_body = SendOtpRequest,
    responses(
        (status = 200, description = "OTP sent", body = ApiResponse<SendOtpResponse>),
        (status = 404, description = "No account for this mobile number", body = ErrorBody),
        (status = 429, description = "A fresh code was already sent", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn send_otp(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SendOtpRequest>,
) -> Result<Json<ApiResponse<SendOtpResponse>>, AppError> {
    validate_mobile_number(&payload.mobile_number)?;
    let mobile = payload.mobile_number.trim();

    find_user_by_mobile(&state.db, mobile).await?;
    send_otp_to(&state, mobile).await?;

    Ok(Json(ApiResponse::new(
        "OTP sent",
        SendOtpResponse {
            mobile_number: mobile.to_string(),
            expires_in_secs: state.config.otp.ttl_secs,
        },
    )))
}

#[utoipa::path(
    post,
    path = "/verify-otp",
    tag = "Auth",
    operation_id = "verifyOtp",
    summary = "Redeem a login OTP for a session token",
    description = "Verifies the code, marks the account verified, and returns a token. Five \
        wrong attempts lock the number out for a cooldown window.",
    request_body = VerifyOtpRequest,
    responses(
        (status = 200, description = "OTP verified", body = ApiResponse<AuthResponse>),
        (status = 400, description = "Wrong or expired code", body = ErrorBody),
        (status = 404, description = "No account for this mobile number", body = ErrorBody),
        (status = 429, description = "Too many wrong attempts", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn verify_otp(
    State(state): State<AppState>,
    AppJson(payload): AppJson<VerifyOtpRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, AppError> {
    validate_verify_otp_request(&payload)?;
    let mobile = payload.mobile_number.trim();

    let user = find_user_by_mobile(&state.db, mobile).await?;

    otp::verify(&*state.cache, &state.config.otp, mobile, &payload.code).await?;

    let user = if user.is_verified {
        user
    } else {
        let mut active: user::ActiveModel = user.into();
        active.is_verified = Set(true);
        active.updated_at = Set(chrono::Utc::now());
        active.update(&state.db).await?
    };

    let token = sign_token(&state, &user)?;

    Ok(Json(ApiResponse::new(
        "OTP verified",
        AuthResponse {
            token,
            user: user.into(),
        },
    )))
}

#[utoipa::path(
    post,
    path = "/admin/signin",
    tag = "Auth",
    operation_id = "adminSignin",
    summary = "Admin password sign-in",
    description = "Password login for admin accounts. Regular accounts are OTP-only and are \
        rejected here.",
    request_body = AdminSigninRequest,
    responses(
        (status = 200, description = "Signed in", body = ApiResponse<AuthResponse>),
        (status = 401, description = "Invalid credentials", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(email = %payload.email))]
pub async fn admin_signin(
    State(state): State<AppState>,
    AppJson(payload): AppJson<AdminSigninRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, AppError> {
    validate_admin_signin_request(&payload)?;

    let user = user::Entity::find()
        .filter(user::Column::Email.eq(payload.email.trim().to_lowercase()))
        .one(&state.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if user.role != ROLE_ADMIN {
        return Err(AppError::InvalidCredentials);
    }

    let stored_hash = user.password.as_deref().ok_or(AppError::InvalidCredentials)?;
    let is_valid = hash::verify_password(&payload.password, stored_hash)
        .map_err(|e| AppError::Internal(format!("Password verify error: {e}")))?;
    if !is_valid {
        return Err(AppError::InvalidCredentials);
    }

    let token = sign_token(&state, &user)?;

    Ok(Json(ApiResponse::new(
        "Signed in",
        AuthResponse {
            token,
            user: user.into(),
        },
    )))
}

#[utoipa::path(
    post,
    path = "/admin/create",
    tag = "Auth",
    operation_id = "createAdmin",
    summary = "Create another admin account",
    description = "Creates a verified admin account with a password. Admin only.",
    request_body = CreateAdminRequest,
    responses(
        (status = 201, description = "Admin created", body = ApiResponse<UserResponse>),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Forbidden", body = ErrorBody),
        (status = 409, description = "Username, email or mobile number taken", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(username = %payload.username))]
pub async fn create_admin(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateAdminRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_admin()?;
    validate_create_admin_request(&payload)?;

    let password_hash = hash::hash_password(&payload.password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {e}")))?;

    let now = chrono::Utc::now();
    let new_admin = user::ActiveModel {
        name: Set(payload.name.trim().to_string()),
        username: Set(payload.username.trim().to_string()),
        email: Set(payload.email.trim().to_lowercase()),
        mobile_number: Set(payload.mobile_number.trim().to_string()),
        password: Set(Some(password_hash)),
        role: Set(ROLE_ADMIN.to_string()),
        is_verified: Set(true),
        avatar: Set(None),
        is_influencer: Set(false),
        influencer_url: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let admin = new_admin.insert(&state.db).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("Username, email or mobile number is already registered".into())
        }
        _ => AppError::from(e),
    })?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            "Admin account created",
            UserResponse::from(admin),
        )),
    ))
}

#[utoipa::path(
    get,
    path = "/profile",
    tag = "Auth",
    operation_id = "getProfile",
    summary = "Current account profile",
    responses(
        (status = 200, description = "Profile", body = ApiResponse<UserResponse>),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 404, description = "Account no longer exists", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn profile(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    let user = user::Entity::find_by_id(auth_user.user_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Account not found".into()))?;

    Ok(Json(ApiResponse::new("Profile", UserResponse::from(user))))
}

fn sign_token(state: &AppState, user: &user::Model) -> Result<String, AppError> {
    jwt::sign(
        user.id,
        &user.email,
        &user.role,
        &state.config.auth.jwt_secret,
        state.config.auth.token_ttl_hours,
    )
    .map_err(|e| AppError::Internal(format!("JWT sign error: {e}")))
}

/// Issue and "deliver" an OTP. Delivery is a structured log line; an SMS
/// gateway consumes these in production.
async fn send_otp_to(state: &AppState, mobile: &str) -> Result<(), AppError> {
    let code = otp::issue(&*state.cache, &state.config.otp, mobile).await?;
    tracing::info!(mobile = %mobile, code = %code, "OTP issued");
    Ok(())
}

async fn find_user_by_mobile(
    db: &DatabaseConnection,
    mobile: &str,
) -> Result<user::Model, AppError> {
    user::Entity::find()
        .filter(user::Column::MobileNumber.eq(mobile))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("No account for this mobile number".into()))
}
