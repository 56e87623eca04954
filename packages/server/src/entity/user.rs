use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Role granted to regular signups.
pub const ROLE_USER: &str = "user";
/// Role with full catalog/waitlist/blog management rights.
pub const ROLE_ADMIN: &str = "admin";

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,
    #[sea_orm(unique)]
    pub username: String,
    #[sea_orm(unique)]
    pub email: String,
    #[sea_orm(unique)]
    pub mobile_number: String,
    /// Argon2 hash; NULL for OTP-only accounts.
    pub password: Option<String>,
    pub role: String,
    pub is_verified: bool,
    pub avatar: Option<String>,
    pub is_influencer: bool,
    pub influencer_url: Option<String>,

    #[sea_orm(has_many)]
    pub posts: HasMany<super::post::Entity>,

    #[sea_orm(has_many)]
    pub comments: HasMany<super::comment::Entity>,

    #[sea_orm(has_many)]
    pub reels: HasMany<super::reel::Entity>,

    #[sea_orm(has_many)]
    pub purchases: HasMany<super::course_purchase::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
