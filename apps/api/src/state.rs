//! Shared application state.

use std::sync::Arc;

use shelf_db::Database;

use crate::auth::JwtManager;
use crate::cache::Cache;
use crate::config::{ApiConfig, ConfigError};
use crate::throttle::Throttle;

/// State handed to every handler. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub cache: Cache,
    pub jwt: Arc<JwtManager>,
    pub throttle: Throttle,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    /// Builds the state from configuration, an open database and a cache.
    pub fn new(config: ApiConfig, db: Database, cache: Cache) -> Result<Self, ConfigError> {
        let jwt = JwtManager::new(
            config.jwt_secret.clone(),
            config.jwt_access_lifetime_secs,
            config.jwt_refresh_lifetime_secs,
        );
        let throttle = Throttle::new(cache.clone(), config.review_rate()?, config.reaction_rate()?);

        Ok(AppState {
            db,
            cache,
            jwt: Arc::new(jwt),
            throttle,
            config: Arc::new(config),
        })
    }
}
