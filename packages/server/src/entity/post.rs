use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "post")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub user_id: i32,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: HasOne<super::user::Entity>,

    pub content: Option<String>,
    /// Up to four public image URLs.
    pub images: Vec<String>,

    pub like_count: i32,
    pub share_count: i32,
    pub bookmark_count: i32,

    pub is_retweet: bool,
    /// Origin post for retweets. Left dangling-free: set NULL when the
    /// origin is deleted.
    pub original_post_id: Option<i32>,

    #[sea_orm(has_many)]
    pub comments: HasMany<super::comment::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
