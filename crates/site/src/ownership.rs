//! Ownership guard for owner-scoped mutations.
//!
//! Stores and reviews may only be modified by their author. The check is
//! pure and synchronous; callers fetch the resource first, then guard
//! before mutating. The resulting [`NotOwner`] maps to 403 Forbidden at
//! the error layer.

use savory_core::UserId;
use thiserror::Error;

use crate::models::{Review, Store};

/// Error returned when the acting user is not the resource's author.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("You must own a {resource} in order to modify it!")]
pub struct NotOwner {
    resource: &'static str,
}

impl NotOwner {
    /// Create an ownership failure for the named resource kind.
    #[must_use]
    pub const fn new(resource: &'static str) -> Self {
        Self { resource }
    }
}

/// A resource with a recorded author.
pub trait Owned {
    /// Label used in error messages ("store", "review").
    const KIND: &'static str;

    /// The owning user.
    fn author(&self) -> UserId;
}

impl Owned for Store {
    const KIND: &'static str = "store";

    fn author(&self) -> UserId {
        self.author_id
    }
}

impl Owned for Review {
    const KIND: &'static str = "review";

    fn author(&self) -> UserId {
        self.author_id
    }
}

/// Check that `user` owns `resource`.
///
/// # Errors
///
/// Returns [`NotOwner`] when `resource.author() != user`.
pub fn assert_owner<T: Owned>(resource: &T, user: UserId) -> Result<(), NotOwner> {
    if resource.author() == user {
        Ok(())
    } else {
        Err(NotOwner::new(T::KIND))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use savory_core::{Rating, ReviewId, Slug, StoreId, UserId};

    use super::*;

    fn store_owned_by(author: i32) -> Store {
        Store {
            id: StoreId::new(1),
            name: "Test Store".to_owned(),
            slug: Slug::from_name("Test Store").unwrap(),
            description: String::new(),
            tags: vec![],
            photo: None,
            address: None,
            lng: None,
            lat: None,
            author_id: UserId::new(author),
            created: Utc::now(),
        }
    }

    fn review_owned_by(author: i32) -> Review {
        Review {
            id: ReviewId::new(1),
            author_id: UserId::new(author),
            store_id: StoreId::new(1),
            text: "Great tacos".to_owned(),
            rating: Rating::new(5).unwrap(),
            created: Utc::now(),
        }
    }

    #[test]
    fn test_owner_passes() {
        assert!(assert_owner(&store_owned_by(7), UserId::new(7)).is_ok());
        assert!(assert_owner(&review_owned_by(3), UserId::new(3)).is_ok());
    }

    #[test]
    fn test_non_owner_fails() {
        let err = assert_owner(&store_owned_by(7), UserId::new(8)).unwrap_err();
        assert_eq!(err, NotOwner::new("store"));
        assert_eq!(
            err.to_string(),
            "You must own a store in order to modify it!"
        );

        assert!(assert_owner(&review_owned_by(3), UserId::new(4)).is_err());
    }

    #[test]
    fn test_exhaustive_pairs() {
        // Fails exactly when author != acting user
        for author in 1..4 {
            for actor in 1..4 {
                let outcome = assert_owner(&store_owned_by(author), UserId::new(actor));
                assert_eq!(outcome.is_ok(), author == actor);
            }
        }
    }
}
