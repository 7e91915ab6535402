//! # Category Repository

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use shelf_core::Category;

/// Repository for category database operations.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    /// Creates a new CategoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// Lists all categories ordered by slug.
    pub async fn list(&self) -> DbResult<Vec<Category>> {
        let categories =
            sqlx::query_as::<_, Category>("SELECT slug, title FROM categories ORDER BY slug")
                .fetch_all(&self.pool)
                .await?;

        Ok(categories)
    }

    /// Gets a category by slug.
    pub async fn get(&self, slug: &str) -> DbResult<Option<Category>> {
        let category =
            sqlx::query_as::<_, Category>("SELECT slug, title FROM categories WHERE slug = ?1")
                .bind(slug)
                .fetch_optional(&self.pool)
                .await?;

        Ok(category)
    }

    /// Inserts a category.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - Slug already exists
    pub async fn insert(&self, category: &Category) -> DbResult<Category> {
        debug!(slug = %category.slug, "Inserting category");

        sqlx::query("INSERT INTO categories (slug, title) VALUES (?1, ?2)")
            .bind(&category.slug)
            .bind(&category.title)
            .execute(&self.pool)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::UniqueViolation { .. } => DbError::duplicate("slug", &category.slug),
                other => other,
            })?;

        Ok(category.clone())
    }
}
