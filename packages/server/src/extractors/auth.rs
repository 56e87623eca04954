use axum::{extract::FromRequestParts, http::request::Parts};

use crate::entity::user::ROLE_ADMIN;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::jwt;

/// Authenticated user extracted from the `Authorization: Bearer <token>` header.
///
/// Add this as a handler parameter to require authentication.
/// Role checks happen via `require_role()` in the handler body.
pub struct AuthUser {
    pub user_id: i32,
    pub email: String,
    pub role: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }

    /// Returns `Ok(())` if the user's role is in the allow-list,
    /// `Err(Forbidden)` otherwise.
    pub fn require_role(&self, roles: &[&str]) -> Result<(), AppError> {
        if roles.iter().any(|r| *r == self.role) {
            Ok(())
        } else {
            Err(AppError::Forbidden("Insufficient permissions".into()))
        }
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        self.require_role(&[ROLE_ADMIN])
    }
}

fn user_from_parts(parts: &Parts, state: &AppState) -> Result<Option<AuthUser>, AppError> {
    let Some(auth_header) = parts
        .headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
    else {
        return Ok(None);
    };

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AppError::TokenInvalid)?;

    let claims =
        jwt::verify(token, &state.config.auth.jwt_secret).map_err(|_| AppError::TokenInvalid)?;

    Ok(Some(AuthUser {
        user_id: claims.uid,
        email: claims.sub,
        role: claims.role,
    }))
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        user_from_parts(parts, state)?.ok_or(AppError::TokenMissing)
    }
}

/// Viewer identity for endpoints that work with or without a session
/// (feed reads enrich per-viewer state only when a token is present).
///
/// A missing header yields `None`; a present but invalid token is still
/// rejected.
pub struct OptionalAuthUser(pub Option<AuthUser>);

impl OptionalAuthUser {
    pub fn viewer_id(&self) -> Option<i32> {
        self.0.as_ref().map(|u| u.user_id)
    }
}

impl FromRequestParts<AppState> for OptionalAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(OptionalAuthUser(user_from_parts(parts, state)?))
    }
}
