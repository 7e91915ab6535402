//! # Review Repository
//!
//! Database operations for reviews.
//!
//! ## Rating Consistency
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Review Writes                                        │
//! │                                                                         │
//! │  create(review)                    delete(id)                          │
//! │    BEGIN                             BEGIN                             │
//! │    book exists?                      SELECT book_id                    │
//! │    INSERT INTO reviews               DELETE FROM reviews               │
//! │    refresh_rating(book)              refresh_rating(book)              │
//! │    COMMIT                            COMMIT                            │
//! │                                                                         │
//! │  books.rating never observes a half-written review.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info};

use super::book::refresh_rating;
use crate::error::{DbError, DbResult};
use shelf_core::rating::validate_rating;
use shelf_core::{CoreError, NewReview, PageRequest, Reaction, ReactionCount, Review, ReviewWithReactions};

const REVIEW_SELECT: &str = r#"
    SELECT
        r.id,
        r.book_id,
        r.user_id,
        u.username AS author_name,
        r.comment,
        r.rating,
        r.created_at
    FROM reviews r
    INNER JOIN users u ON u.id = r.user_id
"#;

/// One row of the grouped reaction count query.
#[derive(Debug, sqlx::FromRow)]
struct ReactionCountRow {
    review_id: i64,
    reaction: Reaction,
    count: i64,
}

/// Repository for review database operations.
#[derive(Debug, Clone)]
pub struct ReviewRepository {
    pool: SqlitePool,
}

impl ReviewRepository {
    /// Creates a new ReviewRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReviewRepository { pool }
    }

    /// Stores a review and refreshes the book's rating in one transaction.
    ///
    /// ## Returns
    /// * `Ok(Review)` - The stored review
    /// * `Err(DbError::NotFound)` - Book doesn't exist
    /// * `Err(DbError::Domain(..))` - Rating outside 1..=5
    pub async fn create(&self, review: &NewReview) -> DbResult<Review> {
        validate_rating(review.rating).map_err(CoreError::from)?;

        let mut tx = self.pool.begin().await?;

        let book: Option<i64> = sqlx::query_scalar("SELECT id FROM books WHERE id = ?1")
            .bind(review.book_id)
            .fetch_optional(&mut *tx)
            .await?;
        if book.is_none() {
            return Err(DbError::not_found("Book", review.book_id));
        }

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO reviews (book_id, user_id, comment, rating, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING id
            "#,
        )
        .bind(review.book_id)
        .bind(review.user_id)
        .bind(&review.comment)
        .bind(review.rating)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        let rating = refresh_rating(&mut tx, review.book_id).await?;
        let stored = fetch_review(&mut tx, id).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            review_id = id,
            book_id = review.book_id,
            book_rating = rating,
            "Review created"
        );

        stored.ok_or_else(|| DbError::not_found("Review", id))
    }

    /// Gets a review by id.
    pub async fn get(&self, id: i64) -> DbResult<Option<Review>> {
        let mut conn = self.pool.acquire().await?;
        fetch_review(&mut conn, id).await
    }

    /// Lists one page of a book's reviews with their reaction counts.
    pub async fn list_for_book(
        &self,
        book_id: i64,
        page: PageRequest,
    ) -> DbResult<Vec<ReviewWithReactions>> {
        debug!(book_id, page = page.number, "Listing reviews");

        let sql = format!("{REVIEW_SELECT} WHERE r.book_id = ?1 ORDER BY r.id LIMIT ?2 OFFSET ?3");
        let reviews = sqlx::query_as::<_, Review>(&sql)
            .bind(book_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        if reviews.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = QueryBuilder::<Sqlite>::new(
            "SELECT review_id, reaction, COUNT(*) AS count FROM review_reactions WHERE review_id IN (",
        );
        let mut ids = query.separated(", ");
        for review in &reviews {
            ids.push_bind(review.id);
        }
        ids.push_unseparated(") GROUP BY review_id, reaction");

        let rows = query
            .build_query_as::<ReactionCountRow>()
            .fetch_all(&self.pool)
            .await?;

        let mut counts: HashMap<i64, Vec<ReactionCount>> = HashMap::new();
        for row in rows {
            counts.entry(row.review_id).or_default().push(ReactionCount {
                reaction: row.reaction,
                count: row.count,
            });
        }

        Ok(reviews
            .into_iter()
            .map(|review| {
                let mut reactions = counts.remove(&review.id).unwrap_or_default();
                reactions.sort_by_key(|c| c.reaction);
                ReviewWithReactions { review, reactions }
            })
            .collect())
    }

    /// Counts a book's reviews.
    pub async fn count_for_book(&self, book_id: i64) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reviews WHERE book_id = ?1")
            .bind(book_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Deletes a review and refreshes the book's rating in one transaction.
    ///
    /// Reactions on the review go with it (ON DELETE CASCADE).
    ///
    /// ## Returns
    /// * `Ok(book_id)` - The book the review belonged to
    /// * `Err(DbError::NotFound)` - No such review
    pub async fn delete(&self, id: i64) -> DbResult<i64> {
        let mut tx = self.pool.begin().await?;

        let book_id: Option<i64> = sqlx::query_scalar("SELECT book_id FROM reviews WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let book_id = book_id.ok_or_else(|| DbError::not_found("Review", id))?;

        sqlx::query("DELETE FROM reviews WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let rating = refresh_rating(&mut tx, book_id).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(review_id = id, book_id, book_rating = rating, "Review deleted");
        Ok(book_id)
    }
}

async fn fetch_review(conn: &mut SqliteConnection, id: i64) -> DbResult<Option<Review>> {
    let sql = format!("{REVIEW_SELECT} WHERE r.id = ?1");

    let review = sqlx::query_as::<_, Review>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(review)
}

// =============================================================================
// Unit Tests
// =============================================================================
