//! # User Repository
//!
//! Database operations for accounts.
//!
//! ## Account Removal
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Deleting a User                                      │
//! │                                                                         │
//! │  BEGIN                                                                 │
//! │    sentinel = get-or-create users(username = 'deleted', inactive)      │
//! │    drop reactions that would collide with the sentinel's own           │
//! │    UPDATE review_reactions SET user_id = sentinel                      │
//! │    UPDATE reviews          SET user_id = sentinel                      │
//! │    DELETE FROM users WHERE id = ?                                      │
//! │  COMMIT                                                                │
//! │                                                                         │
//! │  Reviews survive, so book ratings stay unchanged.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, error, info};

use crate::error::{DbError, DbResult};
use shelf_core::{CoreError, User, SENTINEL_USERNAME};

/// Stored instead of a password hash for accounts that must never log in.
pub const UNUSABLE_PASSWORD: &str = "!";

const USER_COLUMNS: &str = "id, username, password_hash, is_active, date_joined";

/// What happened to a removed account's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountRemoval {
    pub sentinel_id: i64,
    pub reviews_reassigned: u64,
    pub reactions_reassigned: u64,
    /// Reactions dropped because the sentinel already reacted to the same review.
    pub reactions_dropped: u64,
}

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Creates an active account.
    ///
    /// ## Returns
    /// * `Ok(User)` - The stored account
    /// * `Err(DbError::UniqueViolation)` - Username is taken
    pub async fn create(&self, username: &str, password_hash: &str) -> DbResult<User> {
        debug!(username = %username, "Creating user");

        let sql = format!(
            "INSERT INTO users (username, password_hash, is_active, date_joined) \
             VALUES (?1, ?2, 1, ?3) RETURNING {USER_COLUMNS}"
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .bind(password_hash)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::UniqueViolation { .. } => DbError::duplicate("username", username),
                other => other,
            })
    }

    /// Gets a user by id.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Gets a user by username.
    pub async fn get_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1");

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Checks whether a username is taken.
    pub async fn exists(&self, username: &str) -> DbResult<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE username = ?1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(found.is_some())
    }

    /// Returns the sentinel account, creating it on first use.
    pub async fn sentinel(&self) -> DbResult<User> {
        let mut conn = self.pool.acquire().await?;
        let id = sentinel_id(&mut conn).await?;
        drop(conn);

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("User", id))
    }

    /// Deletes an account, handing its reviews and reactions to the sentinel.
    ///
    /// ## Returns
    /// * `Ok(AccountRemoval)` - Counts of reassigned rows
    /// * `Err(DbError::NotFound)` - No such user
    /// * `Err(DbError::Domain(CoreError::ReservedAccount))` - Attempt to delete the sentinel
    pub async fn delete(&self, id: i64) -> DbResult<AccountRemoval> {
        let mut tx = self.pool.begin().await?;

        let username: Option<String> = sqlx::query_scalar("SELECT username FROM users WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        let username = username.ok_or_else(|| DbError::not_found("User", id))?;
        if username == SENTINEL_USERNAME {
            return Err(CoreError::ReservedAccount(username).into());
        }

        let sentinel_id = sentinel_id(&mut tx).await?;

        let reactions_dropped = sqlx::query(
            r#"
            DELETE FROM review_reactions
            WHERE user_id = ?1
            AND review_id IN (SELECT review_id FROM review_reactions WHERE user_id = ?2)
            "#,
        )
        .bind(id)
        .bind(sentinel_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let reactions_reassigned =
            sqlx::query("UPDATE review_reactions SET user_id = ?2 WHERE user_id = ?1")
                .bind(id)
                .bind(sentinel_id)
                .execute(&mut *tx)
                .await?
                .rows_affected();

        let reviews_reassigned = sqlx::query("UPDATE reviews SET user_id = ?2 WHERE user_id = ?1")
            .bind(id)
            .bind(sentinel_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            user_id = id,
            reviews_reassigned,
            reactions_reassigned,
            reactions_dropped,
            "User deleted, content moved to sentinel"
        );

        Ok(AccountRemoval {
            sentinel_id,
            reviews_reassigned,
            reactions_reassigned,
            reactions_dropped,
        })
    }
}

/// Looks up the sentinel account id, inserting the account if missing.
///
/// Fails with `ReservedAccount` if the name belongs to a usable account;
/// content is never handed to someone who can log in.
async fn sentinel_id(conn: &mut SqliteConnection) -> DbResult<i64> {
    sqlx::query(
        r#"
        INSERT INTO users (username, password_hash, is_active, date_joined)
        VALUES (?1, ?2, 0, ?3)
        ON CONFLICT (username) DO NOTHING
        "#,
    )
    .bind(SENTINEL_USERNAME)
    .bind(UNUSABLE_PASSWORD)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    let (id, is_active, password_hash): (i64, bool, String) =
        sqlx::query_as("SELECT id, is_active, password_hash FROM users WHERE username = ?1")
            .bind(SENTINEL_USERNAME)
            .fetch_one(&mut *conn)
            .await?;

    if is_active || password_hash != UNUSABLE_PASSWORD {
        error!(user_id = id, "Sentinel username is held by a usable account");
        return Err(CoreError::ReservedAccount(SENTINEL_USERNAME.to_string()).into());
    }

    Ok(id)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures;
    use shelf_core::Reaction;

    #[tokio::test]
    async fn test_create_and_lookup() {
        let db = fixtures::database().await;
        let created = db.users().create("reader", "hash").await.unwrap();

        assert!(created.is_active);
        assert!(db.users().exists("reader").await.unwrap());
        assert!(!db.users().exists("nobody").await.unwrap());

        let by_name = db.users().get_by_username("reader").await.unwrap().unwrap();
        assert_eq!(by_name.id, created.id);
        assert_eq!(by_name.password_hash, "hash");
    }

    #[tokio::test]
    async fn test_duplicate_username() {
        let db = fixtures::database().await;
        db.users().create("reader", "hash").await.unwrap();

        let err = db.users().create("reader", "other").await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "username"));
    }

    #[tokio::test]
    async fn test_sentinel_is_inactive_and_stable() {
        let db = fixtures::database().await;
        let first = db.users().sentinel().await.unwrap();
        let second = db.users().sentinel().await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.username, SENTINEL_USERNAME);
        assert!(!first.is_active);
    }

    #[tokio::test]
    async fn test_delete_reassigns_content_to_sentinel() {
        let db = fixtures::database().await;
        let category = fixtures::category(&db, "test_cat").await;
        let book = fixtures::book(&db, "test_book", &category).await;
        let author = fixtures::user(&db, "author").await;
        let leaving = fixtures::user(&db, "remove_usr").await;

        let review = fixtures::review(&db, &book, &leaving, 4).await;
        let other_review = fixtures::review(&db, &book, &author, 2).await;
        db.reactions()
            .create(leaving.id, other_review.id, Reaction::Like)
            .await
            .unwrap();

        let removal = db.users().delete(leaving.id).await.unwrap();
        assert_eq!(removal.reviews_reassigned, 1);
        assert_eq!(removal.reactions_reassigned, 1);
        assert_eq!(removal.reactions_dropped, 0);

        assert!(db.users().get_by_id(leaving.id).await.unwrap().is_none());

        let kept = db.reviews().get(review.id).await.unwrap().unwrap();
        assert_eq!(kept.user_id, removal.sentinel_id);
        assert_eq!(kept.author_name, SENTINEL_USERNAME);

        let reaction = db
            .reactions()
            .get(removal.sentinel_id, other_review.id)
            .await
            .unwrap();
        assert!(reaction.is_some());

        // Rating is untouched: both reviews still count.
        let book = db.books().get(book.id).await.unwrap().unwrap();
        assert_eq!(book.rating, 3);
    }

    #[tokio::test]
    async fn test_delete_drops_reactions_colliding_with_sentinel() {
        let db = fixtures::database().await;
        let category = fixtures::category(&db, "test_cat").await;
        let book = fixtures::book(&db, "test_book", &category).await;
        let author = fixtures::user(&db, "author").await;
        let review = fixtures::review(&db, &book, &author, 5).await;

        let first = fixtures::user(&db, "first").await;
        let second = fixtures::user(&db, "second").await;
        db.reactions().create(first.id, review.id, Reaction::Like).await.unwrap();
        db.reactions().create(second.id, review.id, Reaction::Dislike).await.unwrap();

        db.users().delete(first.id).await.unwrap();
        let removal = db.users().delete(second.id).await.unwrap();

        assert_eq!(removal.reactions_dropped, 1);
        assert_eq!(removal.reactions_reassigned, 0);

        let counts = db.reactions().counts_for_review(review.id).await.unwrap();
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[0].reaction, Reaction::Like);
        assert_eq!(counts[0].count, 1);
    }

    #[tokio::test]
    async fn test_delete_sentinel_refused() {
        let db = fixtures::database().await;
        let sentinel = db.users().sentinel().await.unwrap();

        let err = db.users().delete(sentinel.id).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::ReservedAccount(_))));
    }

    #[tokio::test]
    async fn test_delete_refused_when_sentinel_name_is_live() {
        let db = fixtures::database().await;
        let category = fixtures::category(&db, "test_cat").await;
        let book = fixtures::book(&db, "test_book", &category).await;
        let squatter = db.users().create(SENTINEL_USERNAME, "hash").await.unwrap();
        let leaving = fixtures::user(&db, "remove_usr").await;
        let review = fixtures::review(&db, &book, &leaving, 4).await;

        let err = db.users().delete(leaving.id).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::ReservedAccount(_))));

        // Nothing moved
        assert!(db.users().get_by_id(leaving.id).await.unwrap().is_some());
        let kept = db.reviews().get(review.id).await.unwrap().unwrap();
        assert_eq!(kept.user_id, leaving.id);
        assert_ne!(kept.user_id, squatter.id);
    }

    #[tokio::test]
    async fn test_delete_missing_user() {
        let db = fixtures::database().await;
        let err = db.users().delete(999).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
