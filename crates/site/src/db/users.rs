//! User repository for database operations.
//!
//! Covers account CRUD for the auth service, password-reset tokens, and
//! the hearts (favorites) set including the atomic favorite toggle.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use savory_core::{Email, StoreId, UserId};

use super::RepositoryError;
use crate::models::{User, UserWithHearts};

const USER_COLUMNS: &str = "id, name, email, created";

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Get a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Create a new user with name, email, and password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        name: &str,
        email: &Email,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (name, email, password_hash)
             VALUES ($1, $2, $3)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("email already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        Ok(user)
    }

    /// Get a user's password hash by email, for login verification.
    ///
    /// Returns `None` if no account exists for the email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserWithHash>(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|r| {
            (
                User {
                    id: r.id,
                    name: r.name,
                    email: r.email,
                    created: r.created,
                },
                r.password_hash,
            )
        }))
    }

    /// Update a user's display name and email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the new email is taken.
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn update_account(
        &self,
        id: UserId,
        name: &str,
        email: &Email,
    ) -> Result<User, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET name = $2, email = $3 WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(name)
        .bind(email)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("email already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?
        .ok_or(RepositoryError::NotFound)?;

        Ok(user)
    }

    /// Attach a password-reset token to the account with this email.
    ///
    /// Returns the user, or `None` when no account exists for the email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_reset_token(
        &self,
        email: &Email,
        token: &str,
        expires: DateTime<Utc>,
    ) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET reset_token = $2, reset_expires = $3
             WHERE email = $1
             RETURNING {USER_COLUMNS}"
        ))
        .bind(email)
        .bind(token)
        .bind(expires)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Find the user holding an unexpired reset token.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_reset_token(&self, token: &str) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users
             WHERE reset_token = $1 AND reset_expires > now()"
        ))
        .bind(token)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Replace the user's password hash and clear any reset token.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn update_password(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE users
             SET password_hash = $2, reset_token = NULL, reset_expires = NULL
             WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// The user's hearted store IDs, oldest heart first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn hearts(&self, user: UserId) -> Result<Vec<StoreId>, RepositoryError> {
        let hearts = sqlx::query_scalar::<_, StoreId>(
            "SELECT store_id FROM hearts WHERE user_id = $1 ORDER BY created ASC",
        )
        .bind(user)
        .fetch_all(self.pool)
        .await?;

        Ok(hearts)
    }

    /// Flip `store` in the user's hearts set and return the updated set.
    ///
    /// The flip is a single conditional statement: the insert takes the
    /// row when it is absent, and the delete fires only when the insert
    /// found it already present. The composite primary key makes
    /// duplicates impossible under concurrent toggles from multiple
    /// sessions.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the user or store no
    /// longer exists (foreign key violation).
    pub async fn toggle_heart(
        &self,
        user: UserId,
        store: StoreId,
    ) -> Result<Vec<StoreId>, RepositoryError> {
        sqlx::query(
            "WITH added AS (
                 INSERT INTO hearts (user_id, store_id)
                 VALUES ($1, $2)
                 ON CONFLICT (user_id, store_id) DO NOTHING
                 RETURNING store_id
             )
             DELETE FROM hearts
             WHERE user_id = $1 AND store_id = $2
               AND NOT EXISTS (SELECT 1 FROM added)",
        )
        .bind(user)
        .bind(store)
        .execute(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::Conflict("user or store no longer exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        self.hearts(user).await
    }

    /// A user with their hearts set, for the favorite-toggle JSON
    /// response.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn get_with_hearts(&self, id: UserId) -> Result<UserWithHearts, RepositoryError> {
        let user = self.get_by_id(id).await?.ok_or(RepositoryError::NotFound)?;
        let hearts = self.hearts(id).await?;

        Ok(UserWithHearts {
            id: user.id,
            name: user.name,
            email: user.email,
            hearts,
        })
    }
}

/// Row shape for login lookups (user columns plus the password hash).
#[derive(sqlx::FromRow)]
struct UserWithHash {
    id: UserId,
    name: String,
    email: Email,
    created: DateTime<Utc>,
    password_hash: String,
}
