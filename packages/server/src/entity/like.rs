use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Polymorphic like row: exactly one of `post_id`/`comment_id` is set.
/// The exactly-one rule lives in `models::post::LikeTarget`; partial
/// unique indexes on (user_id, post_id) and (user_id, comment_id) are
/// created in `seed::ensure_indexes`.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "likes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub user_id: i32,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: HasOne<super::user::Entity>,

    pub post_id: Option<i32>,
    pub comment_id: Option<i32>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
