//! Account and token endpoints.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use shelf_core::validation::{validate_password, validate_username};
use shelf_db::DbError;
use tracing::info;

use crate::auth::{hash_password, verify_password, AuthUser, TokenPair};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Serialize)]
pub struct AccessToken {
    pub access: String,
}

/// `POST /api/auth/register/`
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TokenPair>)> {
    let Json(body) = payload?;

    validate_username(&body.username)?;
    validate_password(&body.password, &body.username)?;

    if state.db.users().exists(&body.username).await? {
        return Err(ApiError::field("username", "Already exists!"));
    }

    let hash = hash_password(&body.password)?;
    let user = state
        .db
        .users()
        .create(&body.username, &hash)
        .await
        .map_err(|e| match e {
            // Lost a race with a concurrent registration
            DbError::UniqueViolation { .. } => ApiError::field("username", "Already exists!"),
            other => other.into(),
        })?;

    info!(user_id = user.id, "User registered");
    Ok((StatusCode::CREATED, Json(state.jwt.issue_pair(user.id)?)))
}

/// `POST /api/auth/token/`
pub async fn obtain_pair(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> ApiResult<Json<TokenPair>> {
    let Json(body) = payload?;

    let rejected = || ApiError::authentication_failed("No active account found with the given credentials");

    let user = state
        .db
        .users()
        .get_by_username(&body.username)
        .await?
        .ok_or_else(rejected)?;

    if !user.is_active || !verify_password(&body.password, &user.password_hash) {
        return Err(rejected());
    }

    Ok(Json(state.jwt.issue_pair(user.id)?))
}

/// `POST /api/auth/token/refresh/`
pub async fn refresh(
    State(state): State<AppState>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> ApiResult<Json<AccessToken>> {
    let Json(body) = payload?;

    let claims = state.jwt.validate_refresh_token(&body.refresh)?;
    let user_id = claims.user_id()?;

    let active = state
        .db
        .users()
        .get_by_id(user_id)
        .await?
        .is_some_and(|user| user.is_active);
    if !active {
        return Err(ApiError::authentication_failed("User not found"));
    }

    Ok(Json(AccessToken {
        access: state.jwt.generate_access_token(user_id)?,
    }))
}

/// `DELETE /api/auth/me/`
///
/// Reviews and reactions stay, owned by the sentinel account.
pub async fn delete_me(user: AuthUser, State(state): State<AppState>) -> ApiResult<StatusCode> {
    let removal = state.db.users().delete(user.id).await?;

    info!(
        user_id = user.id,
        reviews_reassigned = removal.reviews_reassigned,
        "Account deleted"
    );
    Ok(StatusCode::NO_CONTENT)
}
