//! Store repository for database operations.
//!
//! Wraps every query the site issues against the `stores` table: CRUD,
//! the paginated listing, tag filtering and aggregation, full-text
//! search, the geo `near` query, and the top-rated aggregation.
//! Geospatial and text ranking are the database engine's job; this layer
//! only shapes the queries.

use sqlx::PgPool;

use savory_core::{Slug, StoreId, UserId};

use super::RepositoryError;
use crate::models::{NearbyStore, Store, StoreInput, TagCount, TopStore};

/// Default search radius for the `near` query, in meters (10 km).
pub const DEFAULT_NEAR_DISTANCE_M: f64 = 10_000.0;

/// Maximum results returned by the `near` query.
pub const NEAR_LIMIT: i64 = 10;

/// Maximum results returned by text search.
pub const SEARCH_LIMIT: i64 = 5;

/// Maximum stores on the top-rated page.
pub const TOP_LIMIT: i64 = 10;

const STORE_COLUMNS: &str =
    "id, name, slug, description, tags, photo, address, lng, lat, author_id, created";

/// Repository for store database operations.
pub struct StoreRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StoreRepository<'a> {
    /// Create a new store repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Persist a new store owned by `author`.
    ///
    /// The slug is derived from the name inside the insert transaction;
    /// when the derived slug is already taken, the next free numeric
    /// suffix is used (`coffee`, `coffee-2`, ...). The unique constraint
    /// on `slug` is the backstop against concurrent creates.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name yields no usable
    /// slug or a concurrent insert claimed the slug first.
    pub async fn create(
        &self,
        input: &StoreInput,
        author: UserId,
    ) -> Result<Store, RepositoryError> {
        let base = Slug::from_name(&input.name)
            .map_err(|e| RepositoryError::Conflict(e.to_string()))?;

        let mut tx = self.pool.begin().await?;

        let taken: Vec<String> =
            sqlx::query_scalar("SELECT slug FROM stores WHERE slug = $1 OR slug LIKE $1 || '-%'")
                .bind(base.as_str())
                .fetch_all(&mut *tx)
                .await?;
        let slug = base.next_available(&taken);

        let store = sqlx::query_as::<_, Store>(&format!(
            "INSERT INTO stores (name, slug, description, tags, address, lng, lat, photo, author_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {STORE_COLUMNS}"
        ))
        .bind(&input.name)
        .bind(&slug)
        .bind(&input.description)
        .bind(&input.tags)
        .bind(input.address.as_deref())
        .bind(input.lng)
        .bind(input.lat)
        .bind(input.photo.as_deref())
        .bind(author)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("slug already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        tx.commit().await?;

        Ok(store)
    }

    /// Get a store by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_id(&self, id: StoreId) -> Result<Option<Store>, RepositoryError> {
        let store = sqlx::query_as::<_, Store>(&format!(
            "SELECT {STORE_COLUMNS} FROM stores WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(store)
    }

    /// Get a store by its slug, used for public detail pages.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<Store>, RepositoryError> {
        let store = sqlx::query_as::<_, Store>(&format!(
            "SELECT {STORE_COLUMNS} FROM stores WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        Ok(store)
    }

    /// One page of stores, newest first, plus the total count.
    ///
    /// The page query and the count run concurrently on the pool.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if either query fails.
    pub async fn list(
        &self,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Store>, i64), RepositoryError> {
        let page_sql =
            format!("SELECT {STORE_COLUMNS} FROM stores ORDER BY created DESC OFFSET $1 LIMIT $2");

        let items = sqlx::query_as::<_, Store>(&page_sql)
            .bind(offset)
            .bind(limit)
            .fetch_all(self.pool);

        let count = sqlx::query_scalar::<_, i64>("SELECT count(*) FROM stores")
            .fetch_one(self.pool);

        let (items, count) = tokio::try_join!(items, count)?;

        Ok((items, count))
    }

    /// Stores carrying `tag`, or every store with at least one tag when
    /// no tag is given.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_tag(&self, tag: Option<&str>) -> Result<Vec<Store>, RepositoryError> {
        let stores = match tag {
            Some(tag) => {
                sqlx::query_as::<_, Store>(&format!(
                    "SELECT {STORE_COLUMNS} FROM stores WHERE $1 = ANY(tags) ORDER BY created DESC"
                ))
                .bind(tag)
                .fetch_all(self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Store>(&format!(
                    "SELECT {STORE_COLUMNS} FROM stores WHERE cardinality(tags) > 0
                     ORDER BY created DESC"
                ))
                .fetch_all(self.pool)
                .await?
            }
        };

        Ok(stores)
    }

    /// Distinct tags with usage counts, most used first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn tags_with_counts(&self) -> Result<Vec<TagCount>, RepositoryError> {
        let tags = sqlx::query_as::<_, TagCount>(
            "SELECT tag, count(*) AS count
             FROM stores, unnest(tags) AS tag
             GROUP BY tag
             ORDER BY count DESC, tag ASC",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(tags)
    }

    /// Full-text search over name and description, ranked by relevance
    /// descending. At most [`SEARCH_LIMIT`] results.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn search(&self, query: &str) -> Result<Vec<Store>, RepositoryError> {
        let stores = sqlx::query_as::<_, Store>(&format!(
            "SELECT {STORE_COLUMNS}
             FROM stores
             WHERE to_tsvector('english', name || ' ' || description)
                   @@ plainto_tsquery('english', $1)
             ORDER BY ts_rank(
                 to_tsvector('english', name || ' ' || description),
                 plainto_tsquery('english', $1)
             ) DESC
             LIMIT $2"
        ))
        .bind(query)
        .bind(SEARCH_LIMIT)
        .fetch_all(self.pool)
        .await?;

        Ok(stores)
    }

    /// Stores within `max_distance_m` meters of the probe point, nearest
    /// first. At most `limit` results.
    ///
    /// Distance is the great-circle (haversine) distance computed by the
    /// database.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn near(
        &self,
        lng: f64,
        lat: f64,
        max_distance_m: f64,
        limit: i64,
    ) -> Result<Vec<NearbyStore>, RepositoryError> {
        let stores = sqlx::query_as::<_, NearbyStore>(
            "SELECT slug, name, description, photo, address, lng, lat, distance_m
             FROM (
                 SELECT slug, name, description, photo, address, lng, lat,
                        2.0 * 6371000.0 * asin(sqrt(
                            power(sin(radians(lat - $2) / 2.0), 2)
                            + cos(radians($2)) * cos(radians(lat))
                              * power(sin(radians(lng - $1) / 2.0), 2)
                        )) AS distance_m
                 FROM stores
                 WHERE lng IS NOT NULL AND lat IS NOT NULL
             ) nearby
             WHERE distance_m <= $3
             ORDER BY distance_m ASC
             LIMIT $4",
        )
        .bind(lng)
        .bind(lat)
        .bind(max_distance_m)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(stores)
    }

    /// Stores with at least two reviews, ranked by average rating
    /// descending. At most [`TOP_LIMIT`] results.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn top(&self) -> Result<Vec<TopStore>, RepositoryError> {
        let stores = sqlx::query_as::<_, TopStore>(
            "SELECT s.id, s.name, s.slug, s.photo,
                    avg(r.rating)::double precision AS average_rating,
                    count(r.id) AS review_count
             FROM stores s
             JOIN reviews r ON r.store_id = s.id
             GROUP BY s.id, s.name, s.slug, s.photo
             HAVING count(r.id) >= 2
             ORDER BY average_rating DESC
             LIMIT $1",
        )
        .bind(TOP_LIMIT)
        .fetch_all(self.pool)
        .await?;

        Ok(stores)
    }

    /// Merge-update the mutable fields of a store.
    ///
    /// The slug is left untouched on rename, and the photo is only
    /// replaced when the input carries a new one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the store doesn't exist.
    pub async fn update(&self, id: StoreId, input: &StoreInput) -> Result<Store, RepositoryError> {
        let store = sqlx::query_as::<_, Store>(&format!(
            "UPDATE stores
             SET name = $2, description = $3, tags = $4, address = $5,
                 lng = $6, lat = $7, photo = COALESCE($8, photo)
             WHERE id = $1
             RETURNING {STORE_COLUMNS}"
        ))
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.tags)
        .bind(input.address.as_deref())
        .bind(input.lng)
        .bind(input.lat)
        .bind(input.photo.as_deref())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(store)
    }

    /// Delete a store and cascade: its reviews are removed and it is
    /// pulled from every user's hearts set, all in one transaction.
    ///
    /// Returns the removed store row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the store doesn't exist;
    /// nothing is deleted in that case.
    pub async fn delete(&self, id: StoreId) -> Result<Store, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM reviews WHERE store_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM hearts WHERE store_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let store = sqlx::query_as::<_, Store>(&format!(
            "DELETE FROM stores WHERE id = $1 RETURNING {STORE_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        tx.commit().await?;

        Ok(store)
    }

    /// The stores a user has hearted, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn hearted_by(&self, user: UserId) -> Result<Vec<Store>, RepositoryError> {
        let stores = sqlx::query_as::<_, Store>(
            "SELECT s.id, s.name, s.slug, s.description, s.tags, s.photo, s.address,
                    s.lng, s.lat, s.author_id, s.created
             FROM stores s
             JOIN hearts h ON h.store_id = s.id
             WHERE h.user_id = $1
             ORDER BY s.created DESC",
        )
        .bind(user)
        .fetch_all(self.pool)
        .await?;

        Ok(stores)
    }
}
