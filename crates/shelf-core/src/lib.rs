//! # shelf-core: Pure Domain Logic for Shelf
//!
//! This crate holds the rules of the book catalog as pure functions with
//! zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Shelf Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    HTTP API (axum)                              │   │
//! │  │    /books  /books/{id}/reviews  /books/react/reviews/{id}      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ shelf-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌────────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │  rating   │  │ pagination │  │ validation│  │   │
//! │  │   │   Book    │  │  clamp    │  │   Page     │  │   rules   │  │   │
//! │  │   │  Review   │  │  average  │  │  math      │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └────────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    shelf-db (Database Layer)                    │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Book, Review, ReviewReaction, etc.)
//! - [`rating`] - Book rating aggregation
//! - [`pagination`] - Page number resolution
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation rules
//!
//! ## Example Usage
//!
//! ```rust
//! use shelf_core::rating::clamp_rating;
//!
//! // Average of 3 and 4 is 3.5, stored as 3
//! assert_eq!(clamp_rating(Some(3.5)), 3);
//!
//! // A book without reviews sits at the floor
//! assert_eq!(clamp_rating(None), 1);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod pagination;
pub mod rating;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, ValidationError};
pub use pagination::{Page, PageRequest};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Lowest rating a review or book can carry.
pub const MIN_RATING: i64 = 1;

/// Highest rating a review or book can carry.
pub const MAX_RATING: i64 = 5;

/// Username of the placeholder account that absorbs content of deleted users.
///
/// The account is inactive, so it can never log in.
pub const SENTINEL_USERNAME: &str = "deleted";

/// Maximum username length.
pub const MAX_USERNAME_LENGTH: usize = 150;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Default number of items per page.
pub const DEFAULT_PAGE_SIZE: u32 = 10;
