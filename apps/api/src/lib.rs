//! # Shelf API
//!
//! HTTP server for the book catalog: books, categories, reviews and
//! reactions, with JWT accounts.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Shelf API                                       │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  auth routes   │  │  book routes   │  │  review / reaction routes  ││
//! │  │                │  │                │  │                            ││
//! │  │ • register     │  │ • categories   │  │ • list per book            ││
//! │  │ • token pair   │  │ • list (cached)│  │ • create (throttled)       ││
//! │  │ • refresh      │  │ • detail       │  │ • delete (author only)     ││
//! │  │ • delete me    │  │                │  │ • react / update / cancel  ││
//! │  └────────────────┘  └────────────────┘  └────────────────────────────┘│
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                      Infrastructure                               │  │
//! │  │                                                                   │  │
//! │  │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────────────┐│  │
//! │  │  │  SQLite      │  │ Cache        │  │    JWT Auth              ││  │
//! │  │  │  (shelf-db)  │  │ memory/Redis │  │                          ││  │
//! │  │  │              │  │ pages,       │  │ access + refresh tokens  ││  │
//! │  │  │              │  │ throttles    │  │ argon2 passwords         ││  │
//! │  │  └──────────────┘  └──────────────┘  └──────────────────────────┘│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config::ApiConfig`]. Environment variables:
//! - `HOST`, `PORT` - Listen address (default: 0.0.0.0:8000)
//! - `DATABASE_PATH` - SQLite file (default: ./shelf.db)
//! - `REDIS_URL` - Shared cache; in-memory when unset
//! - `JWT_SECRET` - Secret for JWT signing
//! - `PAGE_SIZE`, `PAGE_CACHE_TTL_SECS`, `PAGE_CACHE_MAX_ENTRIES` - Listing behaviour
//! - `REVIEW_THROTTLE_RATE`, `REACTION_THROTTLE_RATE` - e.g. `20/hour`

pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod throttle;

use axum::Router;
use tower_http::trace::TraceLayer;

// Re-exports
pub use cache::Cache;
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use state::AppState;

/// Builds the application with its state and request tracing.
pub fn build_router(state: AppState) -> Router {
    routes::router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
