//! # Routes
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Endpoint Map                                         │
//! │                                                                         │
//! │  /api/auth/register/                 POST         auth::register       │
//! │  /api/auth/token/                    POST         auth::obtain_pair    │
//! │  /api/auth/token/refresh/            POST         auth::refresh        │
//! │  /api/auth/me/                       DELETE       auth::delete_me      │
//! │  /api/categories/                    GET          books::categories    │
//! │  /api/books/                         GET          books::list          │
//! │  /api/books/{book_id}/               GET          books::detail        │
//! │  /api/books/{book_id}/reviews/       GET          reviews::list        │
//! │  /api/books/reviews/                 POST         reviews::create      │
//! │  /api/books/reviews/{review_id}/     DELETE       reviews::delete      │
//! │  /api/books/react/reviews/{id}/      POST/PUT/PATCH/DELETE reactions  │
//! │  /health                             GET          health::check        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod books;
pub mod health;
pub mod reactions;
pub mod reviews;

use axum::http::Uri;
use axum::routing::{delete, get, post};
use axum::Router;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Builds the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::check))
        .route("/api/auth/register/", post(auth::register))
        .route("/api/auth/token/", post(auth::obtain_pair))
        .route("/api/auth/token/refresh/", post(auth::refresh))
        .route("/api/auth/me/", delete(auth::delete_me))
        .route("/api/categories/", get(books::categories))
        .route("/api/books/", get(books::list))
        .route("/api/books/reviews/", post(reviews::create))
        .route("/api/books/reviews/{review_id}/", delete(reviews::delete))
        .route(
            "/api/books/react/reviews/{review_id}/",
            post(reactions::create)
                .put(reactions::replace)
                .patch(reactions::update)
                .delete(reactions::delete),
        )
        .route("/api/books/{book_id}/", get(books::detail))
        .route("/api/books/{book_id}/reviews/", get(reviews::list))
}

/// Parses a path id. Anything that isn't an integer can't match a row.
pub(crate) fn parse_id(raw: &str, resource: &str) -> ApiResult<i64> {
    raw.parse().map_err(|_| ApiError::not_found(resource))
}

/// Relative link to another page of the current listing.
///
/// Keeps every query parameter except `page`; page 1 carries no `page`.
pub(crate) fn page_link(uri: &Uri, page: u32) -> String {
    let mut params: Vec<String> = uri
        .query()
        .unwrap_or_default()
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter(|pair| pair.split('=').next() != Some("page"))
        .map(str::to_string)
        .collect();

    if page > 1 {
        params.push(format!("page={}", page));
    }

    if params.is_empty() {
        uri.path().to_string()
    } else {
        format!("{}?{}", uri.path(), params.join("&"))
    }
}
