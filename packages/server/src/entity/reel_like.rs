use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Mirror of `likes` for the reels surface: exactly one of
/// `reel_id`/`reel_comment_id` is set, enforced the same way.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reel_like")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub user_id: i32,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: HasOne<super::user::Entity>,

    pub reel_id: Option<i32>,
    pub reel_comment_id: Option<i32>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
