use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "course")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,
    pub description: String, // in Markdown
    /// Prices in minor currency units.
    pub price: i32,
    pub original_price: Option<i32>,
    pub level: String,
    pub category: String,
    pub thumbnail: String,
    /// Courses are retired, never hard-deleted, so purchase history
    /// stays resolvable.
    pub is_active: bool,

    #[sea_orm(has_many)]
    pub videos: HasMany<super::course_video::Entity>,

    #[sea_orm(has_many)]
    pub purchases: HasMany<super::course_purchase::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
