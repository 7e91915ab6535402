//! JWT authentication module.
//!
//! Handles token generation and validation, password hashing, and the
//! [`AuthUser`] extractor that guards authenticated routes.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use shelf_core::User;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const ACCESS: &str = "access";
const REFRESH: &str = "refresh";

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,

    /// Token type ("access" or "refresh")
    pub token_type: String,
}

impl Claims {
    /// The user id the token was issued for.
    pub fn user_id(&self) -> ApiResult<i64> {
        self.sub
            .parse()
            .map_err(|_| ApiError::authentication_failed("Token contained no recognizable user identification"))
    }
}

/// Access and refresh token returned on login and registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub refresh: String,
    pub access: String,
}

/// JWT token manager.
pub struct JwtManager {
    secret: String,
    access_lifetime_secs: i64,
    refresh_lifetime_secs: i64,
}

impl JwtManager {
    /// Create a new JWT manager.
    pub fn new(secret: String, access_lifetime_secs: i64, refresh_lifetime_secs: i64) -> Self {
        JwtManager {
            secret,
            access_lifetime_secs,
            refresh_lifetime_secs,
        }
    }

    fn generate(&self, user_id: i64, token_type: &str, lifetime_secs: i64) -> ApiResult<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(lifetime_secs);

        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
            token_type: token_type.to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to generate {} token", token_type);
            ApiError::internal("A server error occurred.")
        })
    }

    /// Generate an access token.
    pub fn generate_access_token(&self, user_id: i64) -> ApiResult<String> {
        self.generate(user_id, ACCESS, self.access_lifetime_secs)
    }

    /// Generate a refresh token.
    pub fn generate_refresh_token(&self, user_id: i64) -> ApiResult<String> {
        self.generate(user_id, REFRESH, self.refresh_lifetime_secs)
    }

    /// Generate both tokens for a user.
    pub fn issue_pair(&self, user_id: i64) -> ApiResult<TokenPair> {
        Ok(TokenPair {
            refresh: self.generate_refresh_token(user_id)?,
            access: self.generate_access_token(user_id)?,
        })
    }

    /// Validate and decode a token.
    pub fn validate_token(&self, token: &str) -> ApiResult<Claims> {
        let validation = Validation::default();

        let token_data: TokenData<Claims> = decode(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|_| ApiError::authentication_failed("Token is invalid or expired"))?;

        Ok(token_data.claims)
    }

    /// Validate that a token is an access token.
    pub fn validate_access_token(&self, token: &str) -> ApiResult<Claims> {
        let claims = self.validate_token(token)?;

        if claims.token_type != ACCESS {
            return Err(ApiError::authentication_failed(
                "Given token not valid for any token type",
            ));
        }

        Ok(claims)
    }

    /// Validate that a token is a refresh token.
    pub fn validate_refresh_token(&self, token: &str) -> ApiResult<Claims> {
        let claims = self.validate_token(token)?;

        if claims.token_type != REFRESH {
            return Err(ApiError::authentication_failed("Token has wrong type"));
        }

        Ok(claims)
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Hash a password for storage.
pub fn hash_password(password: &str) -> ApiResult<String> {
    use argon2::{
        password_hash::{rand_core::OsRng, SaltString},
        Argon2, PasswordHasher,
    };

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let hash = argon2.hash_password(password.as_bytes(), &salt).map_err(|e| {
        tracing::error!(error = %e, "Failed to hash password");
        ApiError::internal("A server error occurred.")
    })?;

    Ok(hash.to_string())
}

/// Verify a password against its stored hash.
///
/// Unusable hashes (e.g. the sentinel account's `!`) never verify.
pub fn verify_password(password: &str, hash: &str) -> bool {
    use argon2::{Argon2, PasswordHash, PasswordVerifier};

    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// The authenticated, active user making the request.
///
/// ## Usage
/// ```rust,ignore
/// async fn delete_me(user: AuthUser, State(state): State<AppState>) -> ApiResult<StatusCode> {
///     state.db.users().delete(user.id).await?;
///     Ok(StatusCode::NO_CONTENT)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl std::ops::Deref for AuthUser {
    type Target = User;

    fn deref(&self) -> &User {
        &self.0
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or_else(ApiError::not_authenticated)?;

        let token = header
            .to_str()
            .ok()
            .and_then(extract_bearer_token)
            .ok_or_else(|| ApiError::authentication_failed("Invalid Authorization header"))?;

        let claims = state.jwt.validate_access_token(token)?;
        let user_id = claims.user_id()?;

        let user = state
            .db
            .users()
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::authentication_failed("User not found"))?;

        if !user.is_active {
            return Err(ApiError::authentication_failed("User is inactive"));
        }

        Ok(AuthUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> JwtManager {
        JwtManager::new("test-secret".to_string(), 300, 86400)
    }

    #[test]
    fn test_jwt_roundtrip() {
        let manager = manager();

        let access_token = manager.generate_access_token(42).unwrap();
        let claims = manager.validate_access_token(&access_token).unwrap();

        assert_eq!(claims.user_id().unwrap(), 42);
        assert_eq!(claims.token_type, "access");
    }

    #[test]
    fn test_pair_tokens_have_their_types() {
        let manager = manager();
        let pair = manager.issue_pair(7).unwrap();

        assert!(manager.validate_refresh_token(&pair.refresh).is_ok());
        assert!(manager.validate_access_token(&pair.access).is_ok());
    }

    #[test]
    fn test_wrong_token_type() {
        let manager = manager();
        let pair = manager.issue_pair(7).unwrap();

        assert!(manager.validate_refresh_token(&pair.access).is_err());
        assert!(manager.validate_access_token(&pair.refresh).is_err());
    }

    #[test]
    fn test_foreign_secret_rejected() {
        let other = JwtManager::new("other-secret".to_string(), 300, 86400);
        let token = other.generate_access_token(1).unwrap();

        assert!(manager().validate_access_token(&token).is_err());
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
        assert_eq!(extract_bearer_token("Bearer "), None);
    }

    #[test]
    fn test_password_hashing() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
        assert!(!verify_password("anything", "!"));
    }
}
