//! # Validation Module
//!
//! Input validation utilities for Shelf.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP handler (Rust)                                          │
//! │  ├── Type validation (JSON deserialization)                            │
//! │  └── THIS MODULE: Domain rule validation                               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── UNIQUE constraints (username, reaction per user+review)           │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::{MAX_USERNAME_LENGTH, MIN_PASSWORD_LENGTH, SENTINEL_USERNAME};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Passwords rejected outright, compared case-insensitively.
const COMMON_PASSWORDS: &[&str] = &[
    "123456789",
    "12345678",
    "1234567890",
    "11111111",
    "00000000",
    "abc12345",
    "abcd1234",
    "baseball",
    "football",
    "iloveyou",
    "letmein1",
    "password",
    "password1",
    "password123",
    "passw0rd",
    "princess",
    "qwerty123",
    "qwertyuiop",
    "secret12",
    "secret123",
    "sunshine",
    "superman",
    "trustno1",
    "welcome1",
    "whatever",
];

// =============================================================================
// Account Validators
// =============================================================================

/// Validates a username.
///
/// ## Rules
/// - Must not be empty
/// - At most 150 characters
/// - Letters (any script), digits and `@ . + - _` only
/// - Not the sentinel account's name
///
/// ## Example
/// ```rust
/// use shelf_core::validation::validate_username;
///
/// assert!(validate_username("jane.doe+books@shelf").is_ok());
/// assert!(validate_username("").is_err());
/// assert!(validate_username("has space").is_err());
/// ```
pub fn validate_username(username: &str) -> ValidationResult<()> {
    if username.is_empty() {
        return Err(ValidationError::Required {
            field: "username".to_string(),
        });
    }

    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: "username".to_string(),
            max: MAX_USERNAME_LENGTH,
        });
    }

    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        return Err(ValidationError::InvalidFormat {
            field: "username".to_string(),
            reason: "may contain only letters, numbers, and @/./+/-/_ characters".to_string(),
        });
    }

    if username.eq_ignore_ascii_case(SENTINEL_USERNAME) {
        return Err(ValidationError::Rejected {
            field: "username".to_string(),
            reason: "This username is reserved.".to_string(),
        });
    }

    Ok(())
}

/// Validates a new password.
///
/// ## Rules
/// - At least 8 characters
/// - Not entirely numeric
/// - Not a well-known common password
/// - Not too similar to the username
///
/// ## Example
/// ```rust
/// use shelf_core::validation::validate_password;
///
/// assert!(validate_password("secret123Test", "reader").is_ok());
/// assert!(validate_password("secret123", "reader").is_err());
/// ```
pub fn validate_password(password: &str, username: &str) -> ValidationResult<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: MIN_PASSWORD_LENGTH,
        });
    }

    if password.chars().all(|c| c.is_ascii_digit()) {
        return Err(rejected_password("This password is entirely numeric."));
    }

    let lowered = password.trim().to_lowercase();
    if COMMON_PASSWORDS.contains(&lowered.as_str()) {
        return Err(rejected_password("This password is too common."));
    }

    let username = username.trim().to_lowercase();
    if username.chars().count() >= 3
        && (lowered.contains(&username) || username.contains(&lowered))
    {
        return Err(rejected_password(
            "The password is too similar to the username.",
        ));
    }

    Ok(())
}

fn rejected_password(reason: &str) -> ValidationError {
    ValidationError::Rejected {
        field: "password".to_string(),
        reason: reason.to_string(),
    }
}

// =============================================================================
// Catalog Validators
// =============================================================================

/// Validates a category slug (letters, numbers, underscores, hyphens).
///
/// ## Example
/// ```rust
/// use shelf_core::validation::validate_slug;
///
/// assert!(validate_slug("science-fiction").is_ok());
/// assert!(validate_slug("sci fi").is_err());
/// ```
pub fn validate_slug(slug: &str) -> ValidationResult<()> {
    if slug.is_empty() {
        return Err(ValidationError::Required {
            field: "category".to_string(),
        });
    }

    if !slug
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "category".to_string(),
            reason: "Enter a valid slug consisting of letters, numbers, underscores or hyphens."
                .to_string(),
        });
    }

    Ok(())
}

/// Validates a search query.
///
/// ## Rules
/// - Can be empty (no filtering)
/// - Maximum 100 characters
///
/// ## Returns
/// The individual search terms. Terms are separated by whitespace or
/// commas; every term must match.
pub fn validate_search_query(query: &str) -> ValidationResult<Vec<String>> {
    let query = query.trim();

    if query.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "search".to_string(),
            max: 100,
        });
    }

    Ok(query
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|term| !term.is_empty())
        .map(str::to_string)
        .collect())
}

/// Normalizes an optional review comment; blank comments become `None`.
pub fn normalize_comment(comment: Option<String>) -> Option<String> {
    comment.filter(|c| !c.trim().is_empty())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert!(validate_username("test_user").is_ok());
        assert!(validate_username("jane.doe@mail").is_ok());
        assert!(validate_username("читатель").is_ok());

        assert!(validate_username("").is_err());
        assert!(validate_username("two words").is_err());
        assert!(validate_username("\u{e4}\u{b8}\u{ad}\u{e6}\u{96}\u{87}").is_err());
        assert!(validate_username(&"a".repeat(151)).is_err());
    }

    #[test]
    fn test_sentinel_name_reserved() {
        for name in ["deleted", "Deleted", "DELETED"] {
            let err = validate_username(name).unwrap_err();
            assert!(matches!(err, ValidationError::Rejected { ref field, .. } if field == "username"));
        }
        assert!(validate_username("deleted_fan").is_ok());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("secret123Test", "test_user").is_ok());

        let err = validate_password("short1", "someone").unwrap_err();
        assert_eq!(err.field(), "password");
        assert!(validate_password("12345678901", "someone").is_err());
        assert!(validate_password("secret123", "test").is_err());
        assert!(validate_password("PASSWORD", "someone").is_err());
        assert!(validate_password("bookworm_2024", "bookworm").is_err());
    }

    #[test]
    fn test_validate_slug() {
        assert!(validate_slug("test_cat").is_ok());
        assert!(validate_slug("sci-fi-2").is_ok());
        assert!(validate_slug("").is_err());
        assert!(validate_slug("bad slug").is_err());
        assert!(validate_slug("кино").is_err());
    }

    #[test]
    fn test_validate_search_query() {
        assert_eq!(validate_search_query("  ").unwrap(), Vec::<String>::new());
        assert_eq!(
            validate_search_query("dune, messiah").unwrap(),
            vec!["dune".to_string(), "messiah".to_string()]
        );
        assert!(validate_search_query(&"x".repeat(101)).is_err());
    }

    #[test]
    fn test_normalize_comment() {
        assert_eq!(normalize_comment(Some("   ".to_string())), None);
        assert_eq!(
            normalize_comment(Some("great".to_string())),
            Some("great".to_string())
        );
        assert_eq!(normalize_comment(None), None);
    }
}
