use std::sync::Arc;

use common::cache::KeyValueCache;
use common::storage::ObjectStore;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::jobs::blog_generator::BlogGenerator;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub cache: Arc<dyn KeyValueCache>,
    pub store: Arc<dyn ObjectStore>,
    pub blog: Arc<BlogGenerator>,
    pub config: AppConfig,
}
