//! User domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use savory_core::{Email, StoreId, UserId};

/// Session keys for user data.
pub mod session_keys {
    /// Key under which the logged-in user is stored.
    pub const CURRENT_USER: &str = "current_user";
}

/// A registered user.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Email address (unique, lowercased).
    pub email: Email,
    /// When the account was created.
    pub created: DateTime<Utc>,
}

/// A user together with their hearted store IDs, returned as JSON by the
/// favorite-toggle endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct UserWithHearts {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub hearts: Vec<StoreId>,
}

/// The authenticated user stored in the session cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub name: String,
    pub email: Email,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}
