//! # Domain Types
//!
//! Core domain types used throughout Shelf.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Category     │   │      Book       │   │     Review      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  slug (PK)      │◄──│  category       │◄──│  book_id (FK)   │       │
//! │  │  title          │   │  rating 1..=5   │   │  user_id (FK)   │       │
//! │  └─────────────────┘   └─────────────────┘   │  rating 1..=5   │       │
//! │                                              └────────▲────────┘       │
//! │  ┌─────────────────┐   ┌─────────────────┐            │                │
//! │  │      User       │   │ ReviewReaction  │────────────┘                │
//! │  │  ─────────────  │◄──│  ─────────────  │                             │
//! │  │  username       │   │  reaction       │  UNIQUE (review, user)      │
//! │  │  is_active      │   │  LIKE | DIS     │                             │
//! │  └─────────────────┘   └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// User
// =============================================================================

/// A registered account.
#[derive(Debug, Clone, Serialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    pub id: i64,

    pub username: String,

    /// Argon2 PHC string. Never leaves the server.
    #[serde(skip_serializing)]
    #[ts(skip)]
    pub password_hash: String,

    /// Inactive accounts cannot obtain or use tokens.
    pub is_active: bool,

    #[ts(as = "String")]
    pub date_joined: DateTime<Utc>,
}

// =============================================================================
// Category
// =============================================================================

/// A book category, keyed by slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Category {
    pub slug: String,
    pub title: String,
}

// =============================================================================
// Book
// =============================================================================

/// A book in the catalog.
///
/// `rating` is derived from the book's reviews (see [`crate::rating`]);
/// it is never written by clients.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub description: Option<String>,
    /// Path or URL of the cover image.
    pub cover_img: Option<String>,
    pub rating: i64,
    pub category: Category,
}

/// A book together with its review statistics (detail endpoint).
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct BookDetail {
    #[serde(flatten)]
    pub book: Book,
    pub reviews_count: i64,
}

/// Fields needed to add a book to the catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub category_slug: String,
    pub description: Option<String>,
    pub cover_img: Option<String>,
}

// =============================================================================
// Review
// =============================================================================

/// A user review of a book.
#[derive(Debug, Clone, Serialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Review {
    pub id: i64,
    /// Implied by the URL the review is listed under; not serialized.
    #[serde(skip_serializing)]
    #[ts(skip)]
    pub book_id: i64,
    #[serde(skip_serializing)]
    #[ts(skip)]
    pub user_id: i64,
    /// Username of the reviewer (the sentinel name once the account is gone).
    pub author_name: String,
    pub comment: Option<String>,
    pub rating: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Input for a new review.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub book_id: i64,
    pub user_id: i64,
    pub comment: Option<String>,
    pub rating: i64,
}

/// Number of reactions of one kind on a review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct ReactionCount {
    pub reaction: Reaction,
    pub count: i64,
}

/// A review as listed under a book, with aggregated reactions.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct ReviewWithReactions {
    #[serde(flatten)]
    pub review: Review,
    pub reactions: Vec<ReactionCount>,
}

impl ReviewWithReactions {
    /// Returns how many reactions of the given kind the review received.
    pub fn count_of(&self, reaction: Reaction) -> i64 {
        self.reactions
            .iter()
            .find(|c| c.reaction == reaction)
            .map(|c| c.count)
            .unwrap_or(0)
    }
}

// =============================================================================
// Reaction
// =============================================================================

/// What a user thinks of a review.
///
/// Stored and serialized with the short codes `LIKE` and `DIS`, leaving
/// room for more kinds later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum Reaction {
    #[serde(rename = "LIKE")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "LIKE"))]
    Like,
    #[serde(rename = "DIS")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "DIS"))]
    Dislike,
}

impl Default for Reaction {
    fn default() -> Self {
        Reaction::Like
    }
}

impl Reaction {
    /// Returns the stored code.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Reaction::Like => "LIKE",
            Reaction::Dislike => "DIS",
        }
    }
}

impl fmt::Display for Reaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Reaction {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LIKE" => Ok(Reaction::Like),
            "DIS" => Ok(Reaction::Dislike),
            other => Err(ValidationError::InvalidFormat {
                field: "reaction".to_string(),
                reason: format!("\"{}\" is not a valid choice", other),
            }),
        }
    }
}

/// A single user's reaction to a review.
#[derive(Debug, Clone, Serialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ReviewReaction {
    pub id: i64,
    #[serde(skip_serializing)]
    #[ts(skip)]
    pub user_id: i64,
    pub review_id: i64,
    pub reaction: Reaction,
}

// =============================================================================
// Unit Tests
// =============================================================================
