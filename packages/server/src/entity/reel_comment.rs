use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reel_comment")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub reel_id: i32,
    #[sea_orm(belongs_to, from = "reel_id", to = "id")]
    pub reel: HasOne<super::reel::Entity>,

    pub user_id: i32,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: HasOne<super::user::Entity>,

    pub content: Option<String>,
    pub images: Vec<String>,

    pub like_count: i32,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
