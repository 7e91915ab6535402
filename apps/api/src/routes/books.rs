//! Catalog endpoints: categories, book listing and book detail.
//!
//! ## Book List Cache
//! ```text
//! GET /api/books/?search=ring
//!      │
//!      ├── cache hit  (key = "books:" + path + query) ──► cached JSON
//!      │
//!      └── cache miss ──► count → resolve page → list ──► JSON
//!                                                         │
//!                              store for PAGE_CACHE_TTL_SECS
//! ```
//!
//! Entries are not invalidated on writes; a new review shows up in the
//! listing's `rating` once the entry expires.

use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{header, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use shelf_core::validation::{validate_search_query, validate_slug};
use shelf_core::{BookDetail, Category, Page, PageRequest};
use shelf_db::BookFilter;
use tracing::{debug, warn};

use super::{page_link, parse_id};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct BookQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    pub page: Option<String>,
}

impl BookQuery {
    /// Validates the query into a repository filter.
    fn filter(&self) -> ApiResult<BookFilter> {
        let category = match self.category.as_deref().map(str::trim) {
            Some(slug) if !slug.is_empty() => {
                validate_slug(slug)?;
                Some(slug.to_string())
            }
            _ => None,
        };

        let search_terms = match self.search.as_deref() {
            Some(query) => validate_search_query(query)?,
            None => Vec::new(),
        };

        Ok(BookFilter {
            category,
            search_terms,
        })
    }
}

/// `GET /api/categories/`
pub async fn categories(State(state): State<AppState>) -> ApiResult<Json<Vec<Category>>> {
    Ok(Json(state.db.categories().list().await?))
}

/// `GET /api/books/`
pub async fn list(
    State(state): State<AppState>,
    uri: Uri,
    Query(query): Query<BookQuery>,
) -> ApiResult<Response> {
    let ttl = Duration::from_secs(state.config.page_cache_ttl_secs);
    let cache_key = format!("books:{}", uri);

    if !ttl.is_zero() {
        match state.cache.get(&cache_key).await {
            Ok(Some(body)) => {
                debug!(key = %cache_key, "Book list served from cache");
                return Ok(json_response(body));
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Page cache read failed"),
        }
    }

    let filter = query.filter()?;
    let count = state.db.books().count(&filter).await?;
    let page = PageRequest::resolve(query.page.as_deref(), count, state.config.page_size)?;
    let books = state.db.books().list(&filter, page).await?;

    let body = serde_json::to_string(&Page::new(page, count, books, |n| page_link(&uri, n)))
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to serialize book page");
            ApiError::internal("A server error occurred.")
        })?;

    if !ttl.is_zero() {
        if let Err(e) = state.cache.set(&cache_key, &body, ttl).await {
            warn!(error = %e, "Page cache write failed");
        }
    }

    Ok(json_response(body))
}

/// `GET /api/books/{book_id}/`
pub async fn detail(
    State(state): State<AppState>,
    Path(book_id): Path<String>,
) -> ApiResult<Json<BookDetail>> {
    let id = parse_id(&book_id, "Book")?;

    let book = state
        .db
        .books()
        .get_detail(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Book"))?;

    Ok(Json(book))
}

fn json_response(body: String) -> Response {
    ([(header::CONTENT_TYPE, "application/json")], body).into_response()
}
