use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::waitlist_user;
use crate::error::AppError;

/// Request body for joining the waitlist.
#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JoinWaitlistRequest {
    pub name: Option<String>,
    #[schema(example = "early@example.com")]
    pub email: String,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WaitlistUserResponse {
    pub id: i32,
    pub name: Option<String>,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<waitlist_user::Model> for WaitlistUserResponse {
    fn from(m: waitlist_user::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            email: m.email,
            created_at: m.created_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WaitlistCountResponse {
    pub count: u64,
}

pub fn validate_join_waitlist(req: &JoinWaitlistRequest) -> Result<(), AppError> {
    let email = req.email.trim();
    let well_formed = email.len() <= 254
        && email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !well_formed {
        return Err(AppError::Validation("Invalid email address".into()));
    }
    if let Some(ref name) = req.name
        && name.chars().count() > 100
    {
        return Err(AppError::Validation(
            "Name must be at most 100 characters".into(),
        ));
    }
    Ok(())
}
