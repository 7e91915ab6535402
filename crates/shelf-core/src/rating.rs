//! # Rating Module
//!
//! Derivation of a book's rating from its reviews.
//!
//! ## Recalculation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Book Rating Recalculation                            │
//! │                                                                         │
//! │  Review saved / deleted                                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SELECT AVG(rating) FROM reviews WHERE book_id = ?   (shelf-db)        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  clamp_rating(avg) ← THIS MODULE                                       │
//! │       │                                                                 │
//! │       ├── no reviews      → 1                                          │
//! │       ├── avg >= 5        → 5                                          │
//! │       ├── avg <= 1        → 1                                          │
//! │       └── otherwise       → avg truncated (3.8 → 3)                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  UPDATE books SET rating = ? (same transaction as the review write)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::{MAX_RATING, MIN_RATING};

/// Converts the average of a book's review ratings into the book rating.
///
/// `None` (no reviews) is treated as an average of zero and lands on
/// the floor. Fractional averages are truncated toward zero.
///
/// ## Example
/// ```rust
/// use shelf_core::rating::clamp_rating;
///
/// assert_eq!(clamp_rating(Some(4.75)), 4);
/// assert_eq!(clamp_rating(Some(7.0)), 5);
/// assert_eq!(clamp_rating(None), 1);
/// ```
pub fn clamp_rating(average: Option<f64>) -> i64 {
    let average = average.unwrap_or(0.0);

    if average.is_nan() || average <= MIN_RATING as f64 {
        return MIN_RATING;
    }
    if average >= MAX_RATING as f64 {
        return MAX_RATING;
    }

    average.trunc() as i64
}

/// Validates a single review rating.
///
/// ## Rules
/// - Must be between 1 and 5 inclusive
pub fn validate_rating(rating: i64) -> Result<(), ValidationError> {
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(ValidationError::OutOfRange {
            field: "rating".to_string(),
            min: MIN_RATING,
            max: MAX_RATING,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
