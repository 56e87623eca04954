use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    /// Redis connection URL. When empty, an in-process cache is used
    /// (single-node deployments and local development only).
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Token lifetime in hours.
    pub token_ttl_hours: i64,
    /// Bootstrap admin account, created on startup when set and missing.
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OtpConfig {
    /// Lifetime of an issued code, in seconds.
    pub ttl_secs: u64,
    /// Wrong attempts allowed before the number is locked out.
    pub max_attempts: i64,
    /// Lockout window after too many wrong attempts, in seconds.
    pub lockout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub bucket: String,
    pub region: String,
    pub endpoint: Option<String>,
    pub access_key: String,
    pub secret_key: String,
    pub public_base_url: String,
    pub presign_expiry_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BlogConfig {
    /// Enables the scheduled generation job. The manual admin trigger
    /// works whenever `api_url`/`api_key` are set, regardless.
    pub enabled: bool,
    pub interval_hours: u64,
    /// Chat-completions style endpoint producing the article batch.
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    /// Image-generation endpoint; articles are saved without an image
    /// when empty or persistently failing.
    pub image_api_url: String,
    pub articles_per_run: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub auth: AuthConfig,
    pub otp: OtpConfig,
    pub storage: StorageConfig,
    pub blog: BlogConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("redis.url", "")?
            .set_default("auth.token_ttl_hours", 24 * 7)?
            .set_default("otp.ttl_secs", 300)?
            .set_default("otp.max_attempts", 5)?
            .set_default("otp.lockout_secs", 900)?
            .set_default("storage.endpoint", None::<String>)?
            .set_default("storage.presign_expiry_secs", 900)?
            .set_default("blog.enabled", false)?
            .set_default("blog.interval_hours", 24)?
            .set_default("blog.api_url", "")?
            .set_default("blog.api_key", "")?
            .set_default("blog.model", "gpt-4o-mini")?
            .set_default("blog.image_api_url", "")?
            .set_default("blog.articles_per_run", 5)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., FINCH__AUTH__JWT_SECRET)
            .add_source(Environment::with_prefix("FINCH").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
