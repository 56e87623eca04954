use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "blog_post")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,
    pub summary: String,
    pub content: String, // in Markdown

    pub published_at: DateTimeUtc,
    pub source_name: Option<String>,
    pub source_url: Option<String>,

    pub tags: Vec<String>,
    pub regions: Vec<String>,
    pub companies: Vec<String>,
    pub sector: Option<String>,
    /// Headline numbers quoted in the article ("Q3 revenue $2.1B", ...).
    pub financial_figures: Vec<String>,

    pub image_url: Option<String>,
    pub image_prompt: Option<String>,

    /// Monotonically non-decreasing read counter.
    pub views: i32,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
