//! # shelf-db: Database Layer for Shelf
//!
//! This crate provides database access for the Shelf API.
//! It uses SQLite with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Shelf Data Flow                                │
//! │                                                                         │
//! │  HTTP handler (list_books)                                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     shelf-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ UserRepo      │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ BookRepo      │    │ 001_init.sql │  │   │
//! │  │   │ Connection    │    │ ReviewRepo    │    │ ...          │  │   │
//! │  │   │ Management    │    │ ReactionRepo  │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database (./shelf.db)                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shelf_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./shelf.db")).await?;
//!
//! let review = db.reviews().create(&new_review).await?;
//! // The book's rating was refreshed in the same transaction
//! let book = db.books().get(review.book_id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig, Storage};

pub use repository::book::{BookFilter, BookRepository};
pub use repository::category::CategoryRepository;
pub use repository::reaction::ReactionRepository;
pub use repository::review::ReviewRepository;
pub use repository::user::{AccountRemoval, UserRepository};
