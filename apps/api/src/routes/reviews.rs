//! Review endpoints.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, Uri};
use axum::Json;
use serde::Deserialize;
use shelf_core::validation::normalize_comment;
use shelf_core::{NewReview, Page, PageRequest, Review, ReviewWithReactions};
use shelf_db::DbError;
use tracing::info;

use super::{page_link, parse_id};
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::throttle::ThrottleScope;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateReview {
    pub book: i64,
    pub rating: i64,
    #[serde(default)]
    pub comment: Option<String>,
}

/// `GET /api/books/{book_id}/reviews/`
pub async fn list(
    State(state): State<AppState>,
    Path(book_id): Path<String>,
    uri: Uri,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Page<ReviewWithReactions>>> {
    let book_id = parse_id(&book_id, "Book")?;

    if state.db.books().get(book_id).await?.is_none() {
        return Err(ApiError::not_found("Book"));
    }

    let count = state.db.reviews().count_for_book(book_id).await?;
    let page = PageRequest::resolve(query.page.as_deref(), count, state.config.page_size)?;
    let reviews = state.db.reviews().list_for_book(book_id, page).await?;

    Ok(Json(Page::new(page, count, reviews, |n| page_link(&uri, n))))
}

/// `POST /api/books/reviews/`
pub async fn create(
    user: AuthUser,
    State(state): State<AppState>,
    payload: Result<Json<CreateReview>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Review>)> {
    state.throttle.check(ThrottleScope::Review, user.id).await?;
    let Json(body) = payload?;

    let review = state
        .db
        .reviews()
        .create(&NewReview {
            book_id: body.book,
            user_id: user.id,
            comment: normalize_comment(body.comment),
            rating: body.rating,
        })
        .await
        .map_err(|e| match e {
            DbError::NotFound { .. } => ApiError::field(
                "book",
                format!("Invalid pk \"{}\" - object does not exist.", body.book),
            ),
            other => other.into(),
        })?;

    info!(review_id = review.id, user_id = user.id, "Review posted");
    Ok((StatusCode::CREATED, Json(review)))
}

/// `DELETE /api/books/reviews/{review_id}/`
///
/// Only the author may delete a review.
pub async fn delete(
    user: AuthUser,
    State(state): State<AppState>,
    Path(review_id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_id(&review_id, "Review")?;

    let review = state
        .db
        .reviews()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Review"))?;

    if review.user_id != user.id {
        return Err(ApiError::permission_denied());
    }

    state.db.reviews().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
