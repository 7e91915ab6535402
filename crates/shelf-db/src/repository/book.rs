//! # Book Repository
//!
//! Database operations for books.
//!
//! ## Listing Filters
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How Book Listing Works                               │
//! │                                                                         │
//! │  GET /api/books/?category=fantasy&search=ring lord&page=2              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BookFilter { category: "fantasy", search_terms: ["ring", "lord"] }    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  WHERE b.category_slug = ?                                             │
//! │    AND b.title_folded LIKE '%ring%'   ← every term must match          │
//! │    AND b.title_folded LIKE '%lord%'                                    │
//! │  ORDER BY b.id LIMIT ? OFFSET ?                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `title_folded` holds `title.to_lowercase()` and search terms are folded
//! the same way, so matching ignores case outside ASCII too ("дюна" finds
//! "Дюна").

use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use shelf_core::rating::clamp_rating;
use shelf_core::{Book, BookDetail, Category, NewBook, PageRequest};

/// Filters for the book listing.
#[derive(Debug, Clone, Default)]
pub struct BookFilter {
    /// Only books in this category.
    pub category: Option<String>,
    /// Title must contain every term.
    pub search_terms: Vec<String>,
}

/// Joined row: book columns plus its category.
#[derive(Debug, sqlx::FromRow)]
struct BookRow {
    id: i64,
    title: String,
    author: String,
    description: Option<String>,
    cover_img: Option<String>,
    rating: i64,
    category_slug: String,
    category_title: String,
}

impl From<BookRow> for Book {
    fn from(row: BookRow) -> Self {
        Book {
            id: row.id,
            title: row.title,
            author: row.author,
            description: row.description,
            cover_img: row.cover_img,
            rating: row.rating,
            category: Category {
                slug: row.category_slug,
                title: row.category_title,
            },
        }
    }
}

const BOOK_SELECT: &str = r#"
    SELECT
        b.id,
        b.title,
        b.author,
        b.description,
        b.cover_img,
        b.rating,
        c.slug AS category_slug,
        c.title AS category_title
    FROM books b
    INNER JOIN categories c ON c.slug = b.category_slug
"#;

/// Repository for book database operations.
#[derive(Debug, Clone)]
pub struct BookRepository {
    pool: SqlitePool,
}

impl BookRepository {
    /// Creates a new BookRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BookRepository { pool }
    }

    /// Lists one page of books matching the filter, ordered by id.
    pub async fn list(&self, filter: &BookFilter, page: PageRequest) -> DbResult<Vec<Book>> {
        debug!(
            category = ?filter.category,
            terms = filter.search_terms.len(),
            page = page.number,
            "Listing books"
        );

        let mut query = QueryBuilder::<Sqlite>::new(BOOK_SELECT);
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY b.id LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows = query
            .build_query_as::<BookRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Book::from).collect())
    }

    /// Counts books matching the filter.
    pub async fn count(&self, filter: &BookFilter) -> DbResult<i64> {
        let mut query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM books b");
        push_filters(&mut query, filter);

        let count = query
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Gets a book with its category.
    pub async fn get(&self, id: i64) -> DbResult<Option<Book>> {
        let sql = format!("{BOOK_SELECT} WHERE b.id = ?1");

        let row = sqlx::query_as::<_, BookRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Book::from))
    }

    /// Gets a book together with its number of reviews.
    pub async fn get_detail(&self, id: i64) -> DbResult<Option<BookDetail>> {
        let Some(book) = self.get(id).await? else {
            return Ok(None);
        };

        let reviews_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reviews WHERE book_id = ?1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(Some(BookDetail {
            book,
            reviews_count,
        }))
    }

    /// Adds a book to the catalog. New books start at the minimum rating.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Category doesn't exist
    pub async fn insert(&self, book: &NewBook) -> DbResult<Book> {
        debug!(title = %book.title, category = %book.category_slug, "Inserting book");

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO books (title, title_folded, author, category_slug, description, cover_img, rating)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            RETURNING id
            "#,
        )
        .bind(&book.title)
        .bind(book.title.to_lowercase())
        .bind(&book.author)
        .bind(&book.category_slug)
        .bind(&book.description)
        .bind(&book.cover_img)
        .bind(clamp_rating(None))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::ForeignKeyViolation { .. } => {
                DbError::not_found("Category", &book.category_slug)
            }
            other => other,
        })?;

        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Book", id))
    }

    /// Recomputes a book's rating from its reviews.
    ///
    /// Review writes call [`refresh_rating`] inside their own transaction;
    /// this is the standalone entry point (e.g. after bulk imports).
    pub async fn refresh_rating(&self, id: i64) -> DbResult<i64> {
        let mut conn = self.pool.acquire().await?;
        refresh_rating(&mut conn, id).await
    }

    /// Fills `title_folded` for rows written without it (older rows, raw
    /// SQL imports). Returns the number of rows updated.
    pub async fn fold_titles(&self) -> DbResult<u64> {
        let rows: Vec<(i64, String)> =
            sqlx::query_as("SELECT id, title FROM books WHERE title_folded IS NULL")
                .fetch_all(&self.pool)
                .await?;

        if rows.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        for (id, title) in &rows {
            sqlx::query("UPDATE books SET title_folded = ?2 WHERE id = ?1")
                .bind(id)
                .bind(title.to_lowercase())
                .execute(&mut *tx)
                .await?;
        }
        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(books = rows.len(), "Folded book titles for search");
        Ok(rows.len() as u64)
    }
}

/// Appends the WHERE clause for a filter.
fn push_filters(query: &mut QueryBuilder<'_, Sqlite>, filter: &BookFilter) {
    query.push(" WHERE 1 = 1");

    if let Some(slug) = &filter.category {
        query.push(" AND b.category_slug = ").push_bind(slug.clone());
    }

    for term in &filter.search_terms {
        query
            .push(" AND b.title_folded LIKE ")
            .push_bind(format!("%{}%", escape_like(&term.to_lowercase())))
            .push(" ESCAPE '\\'");
    }
}

/// Escapes LIKE wildcards so search terms match literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Sets `books.rating` to the clamped average of the book's review ratings.
///
/// Takes a connection so callers can run it inside their transaction.
pub(crate) async fn refresh_rating(conn: &mut SqliteConnection, book_id: i64) -> DbResult<i64> {
    let average: Option<f64> =
        sqlx::query_scalar("SELECT AVG(rating) FROM reviews WHERE book_id = ?1")
            .bind(book_id)
            .fetch_one(&mut *conn)
            .await?;

    let rating = clamp_rating(average);

    let result = sqlx::query("UPDATE books SET rating = ?2 WHERE id = ?1")
        .bind(book_id)
        .bind(rating)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Book", book_id));
    }

    debug!(book_id, ?average, rating, "Book rating refreshed");
    Ok(rating)
}

// =============================================================================
// Unit Tests
// =============================================================================
