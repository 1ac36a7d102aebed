//! Review repository for database operations.

use sqlx::PgPool;

use savory_core::{ReviewId, StoreId, UserId};

use super::RepositoryError;
use crate::models::{Review, ReviewInput, ReviewWithAuthor, ReviewWithStore};

const REVIEW_COLUMNS: &str = "id, author_id, store_id, text, rating, created";

/// Repository for review database operations.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Persist a new review by `author` on `store`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the store or author no
    /// longer exists (foreign key violation).
    pub async fn create(
        &self,
        input: &ReviewInput,
        author: UserId,
        store: StoreId,
    ) -> Result<Review, RepositoryError> {
        let review = sqlx::query_as::<_, Review>(&format!(
            "INSERT INTO reviews (author_id, store_id, text, rating)
             VALUES ($1, $2, $3, $4)
             RETURNING {REVIEW_COLUMNS}"
        ))
        .bind(author)
        .bind(store)
        .bind(&input.text)
        .bind(input.rating)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::Conflict("store or author no longer exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        Ok(review)
    }

    /// Get a review by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_id(&self, id: ReviewId) -> Result<Option<Review>, RepositoryError> {
        let review = sqlx::query_as::<_, Review>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(review)
    }

    /// Update a review's text and rating, returning the updated row with
    /// its store's slug resolved (for the post-edit redirect).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the review doesn't exist.
    pub async fn update(
        &self,
        id: ReviewId,
        input: &ReviewInput,
    ) -> Result<ReviewWithStore, RepositoryError> {
        let review = sqlx::query_as::<_, ReviewWithStore>(
            "UPDATE reviews r
             SET text = $2, rating = $3
             FROM stores s
             WHERE r.id = $1 AND s.id = r.store_id
             RETURNING r.id, r.author_id, r.store_id, s.slug AS store_slug,
                       r.text, r.rating, r.created",
        )
        .bind(id)
        .bind(&input.text)
        .bind(input.rating)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(review)
    }

    /// Delete a review, returning the removed row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the review doesn't exist.
    pub async fn delete(&self, id: ReviewId) -> Result<Review, RepositoryError> {
        let review = sqlx::query_as::<_, Review>(&format!(
            "DELETE FROM reviews WHERE id = $1 RETURNING {REVIEW_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(review)
    }

    /// Delete every review referencing `store`, returning the number
    /// removed. Used by the store-deletion cascade.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_all_for_store(&self, store: StoreId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM reviews WHERE store_id = $1")
            .bind(store)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Every review of `store` with the author's name joined, newest
    /// first. Used by the store detail page.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn for_store(&self, store: StoreId) -> Result<Vec<ReviewWithAuthor>, RepositoryError> {
        let reviews = sqlx::query_as::<_, ReviewWithAuthor>(
            "SELECT r.id, r.author_id, u.name AS author_name, r.store_id,
                    r.text, r.rating, r.created
             FROM reviews r
             JOIN users u ON u.id = r.author_id
             WHERE r.store_id = $1
             ORDER BY r.created DESC",
        )
        .bind(store)
        .fetch_all(self.pool)
        .await?;

        Ok(reviews)
    }
}
