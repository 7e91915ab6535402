//! Reaction endpoints. Every operation acts on the caller's own reaction
//! to the review in the path.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use shelf_core::{Reaction, ReviewReaction};
use shelf_db::DbError;

use super::parse_id;
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::state::AppState;
use crate::throttle::ThrottleScope;

/// Request body; an empty body means "no fields".
#[derive(Debug, Default, Deserialize)]
pub struct ReactionBody {
    #[serde(default)]
    pub reaction: Option<Reaction>,
}

impl ReactionBody {
    fn parse(body: &Bytes) -> ApiResult<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(ReactionBody::default());
        }
        Ok(serde_json::from_slice(body)?)
    }
}

/// `POST /api/books/react/reviews/{review_id}/`
pub async fn create(
    user: AuthUser,
    State(state): State<AppState>,
    Path(review_id): Path<String>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<ReviewReaction>)> {
    state.throttle.check(ThrottleScope::ReviewReact, user.id).await?;
    let review_id = parse_id(&review_id, "Review")?;
    let reaction = ReactionBody::parse(&body)?.reaction.unwrap_or_default();

    let created = state
        .db
        .reactions()
        .create(user.id, review_id, reaction)
        .await
        .map_err(|e| match e {
            DbError::UniqueViolation { .. } => ApiError::invalid("Already exists! Try update"),
            other => other.into(),
        })?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// `PUT /api/books/react/reviews/{review_id}/`
pub async fn replace(
    user: AuthUser,
    State(state): State<AppState>,
    Path(review_id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<ReviewReaction>> {
    state.throttle.check(ThrottleScope::ReviewReact, user.id).await?;
    let review_id = parse_id(&review_id, "ReviewReaction")?;

    let reaction = ReactionBody::parse(&body)?
        .reaction
        .ok_or_else(|| ApiError::field("reaction", "This field is required."))?;

    let updated = state.db.reactions().update(user.id, review_id, reaction).await?;
    Ok(Json(updated))
}

/// `PATCH /api/books/react/reviews/{review_id}/`
///
/// Without a `reaction` field the current reaction is returned unchanged.
pub async fn update(
    user: AuthUser,
    State(state): State<AppState>,
    Path(review_id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<ReviewReaction>> {
    state.throttle.check(ThrottleScope::ReviewReact, user.id).await?;
    let review_id = parse_id(&review_id, "ReviewReaction")?;

    let reactions = state.db.reactions();
    let current = match ReactionBody::parse(&body)?.reaction {
        Some(reaction) => reactions.update(user.id, review_id, reaction).await?,
        None => reactions
            .get(user.id, review_id)
            .await?
            .ok_or_else(|| ApiError::not_found("ReviewReaction"))?,
    };

    Ok(Json(current))
}

/// `DELETE /api/books/react/reviews/{review_id}/`
pub async fn delete(
    user: AuthUser,
    State(state): State<AppState>,
    Path(review_id): Path<String>,
) -> ApiResult<StatusCode> {
    let review_id = parse_id(&review_id, "ReviewReaction")?;

    state
        .db
        .reactions()
        .delete(user.id, review_id)
        .await
        .map_err(|e| match e {
            DbError::NotFound { .. } => {
                ApiError::new(ErrorCode::NotFound, "Review reaction not found")
            }
            other => other.into(),
        })?;

    Ok(StatusCode::NO_CONTENT)
}
