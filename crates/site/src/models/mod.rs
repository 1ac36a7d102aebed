//! Domain types for the site.
//!
//! These types represent validated domain objects separate from raw form
//! input; the repository layer reads them straight from query rows.

pub mod review;
pub mod store;
pub mod user;

pub use review::{Review, ReviewInput, ReviewWithAuthor, ReviewWithStore};
pub use store::{NearbyStore, Store, StoreInput, TagCount, TopStore};
pub use user::{CurrentUser, User, UserWithHearts, session_keys};
