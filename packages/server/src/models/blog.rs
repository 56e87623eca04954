use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::blog_post;

/// Query parameters for the blog feed.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct BlogListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    /// Match articles carrying this tag.
    pub tag: Option<String>,
    /// Match articles covering this region.
    pub region: Option<String>,
    pub sector: Option<String>,
    /// Case-insensitive title search.
    pub search: Option<String>,
}

/// Full article view.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BlogPostResponse {
    pub id: i32,
    pub title: String,
    pub summary: String,
    pub content: String,
    pub published_at: DateTime<Utc>,
    pub source_name: Option<String>,
    pub source_url: Option<String>,
    pub tags: Vec<String>,
    pub regions: Vec<String>,
    pub companies: Vec<String>,
    pub sector: Option<String>,
    pub financial_figures: Vec<String>,
    pub image_url: Option<String>,
    pub views: i32,
}

impl From<blog_post::Model> for BlogPostResponse {
    fn from(m: blog_post::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            summary: m.summary,
            content: m.content,
            published_at: m.published_at,
            source_name: m.source_name,
            source_url: m.source_url,
            tags: m.tags,
            regions: m.regions,
            companies: m.companies,
            sector: m.sector,
            financial_figures: m.financial_figures,
            image_url: m.image_url,
            views: m.views,
        }
    }
}

/// Feed view: everything but the article body.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BlogListItem {
    pub id: i32,
    pub title: String,
    pub summary: String,
    pub published_at: DateTime<Utc>,
    pub tags: Vec<String>,
    pub regions: Vec<String>,
    pub sector: Option<String>,
    pub image_url: Option<String>,
    pub views: i32,
}

impl From<blog_post::Model> for BlogListItem {
    fn from(m: blog_post::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            summary: m.summary,
            published_at: m.published_at,
            tags: m.tags,
            regions: m.regions,
            sector: m.sector,
            image_url: m.image_url,
            views: m.views,
        }
    }
}

/// Outcome of a generation run (scheduled or manually triggered).
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResponse {
    pub generated: u32,
    pub failed: u32,
}
