//! # Repository Module
//!
//! Database repository implementations for Shelf.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  db.reviews().create(&new_review)                              │
//! │       ▼                                                                 │
//! │  ReviewRepository                                                      │
//! │  ├── BEGIN                                                             │
//! │  ├── INSERT INTO reviews ...                                           │
//! │  ├── book::refresh_rating(&mut tx, book_id)   ← shared helper          │
//! │  └── COMMIT                                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`UserRepository`](user::UserRepository) - Accounts and sentinel reassignment
//! - [`CategoryRepository`](category::CategoryRepository) - Categories
//! - [`BookRepository`](book::BookRepository) - Filtered listing and rating refresh
//! - [`ReviewRepository`](review::ReviewRepository) - Reviews with reaction counts
//! - [`ReactionRepository`](reaction::ReactionRepository) - One reaction per user and review

pub mod book;
pub mod category;
pub mod reaction;
pub mod review;
pub mod user;
