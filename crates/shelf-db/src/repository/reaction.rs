//! # Reaction Repository
//!
//! Likes and dislikes on reviews. A user holds at most one reaction per
//! review (`UNIQUE (review_id, user_id)`); changing one's mind is an
//! update, not a second insert.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use shelf_core::{Reaction, ReactionCount, ReviewReaction};

const REACTION_COLUMNS: &str = "id, user_id, review_id, reaction";

/// Repository for review reaction database operations.
#[derive(Debug, Clone)]
pub struct ReactionRepository {
    pool: SqlitePool,
}

impl ReactionRepository {
    /// Creates a new ReactionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReactionRepository { pool }
    }

    /// Records a user's reaction to a review.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Review doesn't exist
    /// * `Err(DbError::UniqueViolation)` - User already reacted to this review
    pub async fn create(
        &self,
        user_id: i64,
        review_id: i64,
        reaction: Reaction,
    ) -> DbResult<ReviewReaction> {
        debug!(user_id, review_id, %reaction, "Creating reaction");

        // The review foreign key is the existence check, so a review deleted
        // mid-request still reads as missing.
        let sql = format!(
            "INSERT INTO review_reactions (user_id, review_id, reaction) \
             VALUES (?1, ?2, ?3) RETURNING {REACTION_COLUMNS}"
        );

        sqlx::query_as::<_, ReviewReaction>(&sql)
            .bind(user_id)
            .bind(review_id)
            .bind(reaction)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::UniqueViolation { .. } => DbError::duplicate("reaction", reaction.as_str()),
                DbError::ForeignKeyViolation { .. } => DbError::not_found("Review", review_id),
                other => other,
            })
    }

    /// Gets the user's reaction to a review, if any.
    pub async fn get(&self, user_id: i64, review_id: i64) -> DbResult<Option<ReviewReaction>> {
        let sql = format!(
            "SELECT {REACTION_COLUMNS} FROM review_reactions WHERE user_id = ?1 AND review_id = ?2"
        );

        let reaction = sqlx::query_as::<_, ReviewReaction>(&sql)
            .bind(user_id)
            .bind(review_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(reaction)
    }

    /// Changes the user's existing reaction.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - User has no reaction on this review
    pub async fn update(
        &self,
        user_id: i64,
        review_id: i64,
        reaction: Reaction,
    ) -> DbResult<ReviewReaction> {
        debug!(user_id, review_id, %reaction, "Updating reaction");

        let sql = format!(
            "UPDATE review_reactions SET reaction = ?3 \
             WHERE user_id = ?1 AND review_id = ?2 RETURNING {REACTION_COLUMNS}"
        );

        sqlx::query_as::<_, ReviewReaction>(&sql)
            .bind(user_id)
            .bind(review_id)
            .bind(reaction)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Reaction", review_id))
    }

    /// Removes the user's reaction.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - User has no reaction on this review
    pub async fn delete(&self, user_id: i64, review_id: i64) -> DbResult<()> {
        let result =
            sqlx::query("DELETE FROM review_reactions WHERE user_id = ?1 AND review_id = ?2")
                .bind(user_id)
                .bind(review_id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Reaction", review_id));
        }

        debug!(user_id, review_id, "Reaction deleted");
        Ok(())
    }

    /// Counts reactions on a review per kind, likes first.
    pub async fn counts_for_review(&self, review_id: i64) -> DbResult<Vec<ReactionCount>> {
        let rows: Vec<(Reaction, i64)> = sqlx::query_as(
            "SELECT reaction, COUNT(*) FROM review_reactions WHERE review_id = ?1 GROUP BY reaction",
        )
        .bind(review_id)
        .fetch_all(&self.pool)
        .await?;

        let mut counts: Vec<ReactionCount> = rows
            .into_iter()
            .map(|(reaction, count)| ReactionCount { reaction, count })
            .collect();
        counts.sort_by_key(|c| c.reaction);

        Ok(counts)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures;
    use crate::Database;
    use shelf_core::{Review, User};

    async fn reviewed(db: &Database) -> (Review, User) {
        let category = fixtures::category(db, "test_cat").await;
        let book = fixtures::book(db, "test_book", &category).await;
        let author = fixtures::user(db, "author").await;
        let review = fixtures::review(db, &book, &author, 4).await;
        let reader = fixtures::user(db, "reader").await;
        (review, reader)
    }

    #[tokio::test]
    async fn test_second_reaction_rejected() {
        let db = fixtures::database().await;
        let (review, reader) = reviewed(&db).await;

        let created = db
            .reactions()
            .create(reader.id, review.id, Reaction::default())
            .await
            .unwrap();
        assert_eq!(created.reaction, Reaction::Like);

        let err = db
            .reactions()
            .create(reader.id, review.id, Reaction::Dislike)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "reaction"));
    }

    #[tokio::test]
    async fn test_create_on_missing_review() {
        let db = fixtures::database().await;
        let reader = fixtures::user(&db, "reader").await;

        let err = db
            .reactions()
            .create(reader.id, 77, Reaction::Like)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { ref entity, ref id } if entity == "Review" && id == "77"));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let db = fixtures::database().await;
        let (review, reader) = reviewed(&db).await;

        assert!(matches!(
            db.reactions().update(reader.id, review.id, Reaction::Dislike).await,
            Err(DbError::NotFound { .. })
        ));
        assert!(matches!(
            db.reactions().delete(reader.id, review.id).await,
            Err(DbError::NotFound { .. })
        ));

        db.reactions().create(reader.id, review.id, Reaction::Like).await.unwrap();
        let updated = db
            .reactions()
            .update(reader.id, review.id, Reaction::Dislike)
            .await
            .unwrap();
        assert_eq!(updated.reaction, Reaction::Dislike);

        let counts = db.reactions().counts_for_review(review.id).await.unwrap();
        assert_eq!(
            counts,
            vec![ReactionCount {
                reaction: Reaction::Dislike,
                count: 1
            }]
        );

        db.reactions().delete(reader.id, review.id).await.unwrap();
        assert!(db.reactions().get(reader.id, review.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reactions_removed_with_review() {
        let db = fixtures::database().await;
        let (review, reader) = reviewed(&db).await;
        db.reactions().create(reader.id, review.id, Reaction::Like).await.unwrap();

        db.reviews().delete(review.id).await.unwrap();
        assert!(db.reactions().counts_for_review(review.id).await.unwrap().is_empty());
    }
}
