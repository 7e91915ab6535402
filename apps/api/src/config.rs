//! API configuration module.
//!
//! Configuration is layered with the `config` crate:
//! built-in defaults, then an optional `shelf.toml` (path overridable with
//! `SHELF_CONFIG`), then environment variables (`PORT`, `JWT_SECRET`, ...).

use std::env;

use serde::Deserialize;

use crate::throttle::Rate;

/// Secret used when `JWT_SECRET` is not set. Development only.
pub const DEV_JWT_SECRET: &str = "shelf-dev-secret-change-in-production";

/// API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Interface to bind
    pub host: String,

    /// HTTP port
    pub port: u16,

    /// SQLite database file
    pub database_path: String,

    /// Pool size
    pub database_max_connections: u32,

    /// Redis connection string (optional; in-memory cache otherwise)
    pub redis_url: Option<String>,

    /// JWT secret key for signing tokens
    pub jwt_secret: String,

    /// JWT access token lifetime in seconds
    pub jwt_access_lifetime_secs: i64,

    /// JWT refresh token lifetime in seconds
    pub jwt_refresh_lifetime_secs: i64,

    /// Items per page on paginated listings
    pub page_size: u32,

    /// Book list cache lifetime; 0 disables the cache
    pub page_cache_ttl_secs: u64,

    /// Pages kept by the in-process cache
    pub page_cache_max_entries: usize,

    /// Review creation limit per user, e.g. `20/hour`
    pub review_throttle_rate: String,

    /// Reaction limit per user, e.g. `100/hour`
    pub reaction_throttle_rate: String,
}

impl ApiConfig {
    /// Load configuration from defaults, the optional config file and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let file = env::var("SHELF_CONFIG").unwrap_or_else(|_| "shelf.toml".to_string());

        let settings = config::Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 8000_i64)?
            .set_default("database_path", "./shelf.db")?
            .set_default("database_max_connections", 5_i64)?
            .set_default("jwt_secret", DEV_JWT_SECRET)?
            .set_default("jwt_access_lifetime_secs", 300_i64)?
            .set_default("jwt_refresh_lifetime_secs", 86_400_i64)?
            .set_default("page_size", 10_i64)?
            .set_default("page_cache_ttl_secs", 60_i64)?
            .set_default("page_cache_max_entries", 300_i64)?
            .set_default("review_throttle_rate", "20/hour")?
            .set_default("reaction_throttle_rate", "100/hour")?
            .add_source(config::File::with_name(&file).required(false))
            .add_source(config::Environment::default().try_parsing(true))
            .build()?;

        let config: ApiConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values the type system can't.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.is_empty() {
            return Err(ConfigError::MissingRequired("JWT_SECRET".to_string()));
        }
        if self.page_size == 0 {
            return Err(ConfigError::InvalidValue("PAGE_SIZE".to_string()));
        }
        if self.jwt_access_lifetime_secs <= 0 || self.jwt_refresh_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("JWT_*_LIFETIME_SECS".to_string()));
        }
        self.review_rate()?;
        self.reaction_rate()?;
        Ok(())
    }

    /// Address the server listens on.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Parsed review throttle rate.
    pub fn review_rate(&self) -> Result<Rate, ConfigError> {
        self.review_throttle_rate
            .parse()
            .map_err(|_| ConfigError::InvalidValue("REVIEW_THROTTLE_RATE".to_string()))
    }

    /// Parsed reaction throttle rate.
    pub fn reaction_rate(&self) -> Result<Rate, ConfigError> {
        self.reaction_throttle_rate
            .parse()
            .map_err(|_| ConfigError::InvalidValue("REACTION_THROTTLE_RATE".to_string()))
    }

    /// Whether the signing secret is the built-in development one.
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            host: "0.0.0.0".to_string(),
            port: 8000,
            database_path: "./shelf.db".to_string(),
            database_max_connections: 5,
            redis_url: None,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            jwt_access_lifetime_secs: 300,
            jwt_refresh_lifetime_secs: 86_400,
            page_size: 10,
            page_cache_ttl_secs: 60,
            page_cache_max_entries: 300,
            review_throttle_rate: "20/hour".to_string(),
            reaction_throttle_rate: "100/hour".to_string(),
        }
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error(transparent)]
    Source(#[from] config::ConfigError),
}
