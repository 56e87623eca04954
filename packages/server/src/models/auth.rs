use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::user;
use crate::error::AppError;

/// Request body for user signup (OTP-based accounts, no password).
#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    /// Display name (1-100 characters).
    #[schema(example = "Alice Wonder")]
    pub name: String,
    /// Unique handle (3-32 chars, alphanumeric and underscores).
    #[schema(example = "alice_wonder")]
    pub username: String,
    #[schema(example = "alice@example.com")]
    pub email: String,
    /// Digits only, optional leading `+` (10-15 digits).
    #[schema(example = "9999999999")]
    pub mobile_number: String,
}

/// Request body for requesting a login OTP.
#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendOtpRequest {
    #[schema(example = "9999999999")]
    pub mobile_number: String,
}

/// Request body for redeeming a login OTP.
#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpRequest {
    #[schema(example = "9999999999")]
    pub mobile_number: String,
    /// The 6-digit code.
    #[schema(example = "123456")]
    pub code: String,
}

/// Request body for admin password sign-in.
#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminSigninRequest {
    #[schema(example = "admin@example.com")]
    pub email: String,
    pub password: String,
}

/// Request body for creating another admin account.
#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAdminRequest {
    pub name: String,
    pub username: String,
    pub email: String,
    pub mobile_number: String,
    /// Password (8-128 characters).
    pub password: String,
}

/// Public view of a user account.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i32,
    pub name: String,
    pub username: String,
    pub email: String,
    pub mobile_number: String,
    pub role: String,
    pub is_verified: bool,
    pub avatar: Option<String>,
    pub is_influencer: bool,
    pub influencer_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<user::Model> for UserResponse {
    fn from(m: user::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            username: m.username,
            email: m.email,
            mobile_number: m.mobile_number,
            role: m.role,
            is_verified: m.is_verified,
            avatar: m.avatar,
            is_influencer: m.is_influencer,
            influencer_url: m.influencer_url,
            created_at: m.created_at,
        }
    }
}

/// Token plus account payload returned by signup and both login paths.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub token: String,
    pub user: UserResponse,
}

/// Confirmation payload for an issued OTP.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendOtpResponse {
    pub mobile_number: String,
    /// Seconds until the issued code expires.
    pub expires_in_secs: u64,
}

fn validate_name(name: &str) -> Result<(), AppError> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > 100 {
        return Err(AppError::Validation("Name must be 1-100 characters".into()));
    }
    Ok(())
}

fn validate_username(username: &str) -> Result<(), AppError> {
    let username = username.trim();
    if username.chars().count() < 3 || username.chars().count() > 32 {
        return Err(AppError::Validation(
            "Username must be 3-32 characters".into(),
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(AppError::Validation(
            "Username must contain only letters, digits, and underscores".into(),
        ));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), AppError> {
    let email = email.trim();
    let well_formed = email.len() <= 254
        && email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !well_formed {
        return Err(AppError::Validation("Invalid email address".into()));
    }
    Ok(())
}

pub fn validate_mobile_number(mobile: &str) -> Result<(), AppError> {
    let digits = mobile.strip_prefix('+').unwrap_or(mobile);
    if digits.len() < 10 || digits.len() > 15 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::Validation(
            "Mobile number must be 10-15 digits".into(),
        ));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), AppError> {
    if password.len() < 8 || password.len() > 128 {
        return Err(AppError::Validation(
            "Password must be 8-128 characters".into(),
        ));
    }
    Ok(())
}

pub fn validate_signup_request(payload: &SignupRequest) -> Result<(), AppError> {
    validate_name(&payload.name)?;
    validate_username(&payload.username)?;
    validate_email(&payload.email)?;
    validate_mobile_number(&payload.mobile_number)?;
    Ok(())
}

pub fn validate_verify_otp_request(payload: &VerifyOtpRequest) -> Result<(), AppError> {
    validate_mobile_number(&payload.mobile_number)?;
    if payload.code.len() != 6 || !payload.code.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::Validation("OTP must be a 6-digit code".into()));
    }
    Ok(())
}

pub fn validate_admin_signin_request(payload: &AdminSigninRequest) -> Result<(), AppError> {
    validate_email(&payload.email)?;
    if payload.password.is_empty() {
        return Err(AppError::Validation("Password must not be empty".into()));
    }
    Ok(())
}

pub fn validate_create_admin_request(payload: &CreateAdminRequest) -> Result<(), AppError> {
    validate_name(&payload.name)?;
    validate_username(&payload.username)?;
    validate_email(&payload.email)?;
    validate_mobile_number(&payload.mobile_number)?;
    validate_password(&payload.password)?;
    Ok(())
}
