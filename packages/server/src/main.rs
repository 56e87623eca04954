use std::net::SocketAddr;
use std::sync::Arc;

use common::cache::{InMemoryCache, KeyValueCache, RedisCache};
use common::storage::{ObjectStore, S3Options, S3Store};
use tracing::{Level, info, warn};

use server::config::AppConfig;
use server::jobs::blog_generator::BlogGenerator;
use server::state::AppState;
use server::{database, seed};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load()?;

    let db = database::init_db(&config.database.url).await?;
    seed::ensure_indexes(&db).await?;
    seed::seed_admin(&db, &config.auth)
        .await
        .map_err(|e| anyhow::anyhow!("admin seed failed: {e:?}"))?;

    let cache: Arc<dyn KeyValueCache> = if config.redis.url.is_empty() {
        warn!("No redis.url configured; OTP state is held in process memory");
        Arc::new(InMemoryCache::new())
    } else {
        Arc::new(
            RedisCache::connect(&config.redis.url)
                .await
                .map_err(|e| anyhow::anyhow!("redis connect failed: {e}"))?,
        )
    };

    let store: Arc<dyn ObjectStore> = Arc::new(
        S3Store::new(&S3Options {
            bucket: config.storage.bucket.clone(),
            region: config.storage.region.clone(),
            endpoint: config.storage.endpoint.clone(),
            access_key: config.storage.access_key.clone(),
            secret_key: config.storage.secret_key.clone(),
            public_base_url: config.storage.public_base_url.clone(),
        })
        .map_err(|e| anyhow::anyhow!("object store init failed: {e}"))?,
    );

    let blog = Arc::new(BlogGenerator::new(db.clone(), config.blog.clone()));
    if blog.clone().spawn_schedule().is_some() {
        info!(
            interval_hours = config.blog.interval_hours,
            "Blog generation schedule started"
        );
    }

    let state = AppState {
        db,
        cache,
        store,
        blog,
        config: config.clone(),
    };

    let app = server::build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Server running at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
