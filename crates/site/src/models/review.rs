//! Review domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use savory_core::{Rating, ReviewId, Slug, StoreId, UserId};

/// A review of a store.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Review {
    /// Unique review ID.
    pub id: ReviewId,
    /// The user who wrote the review.
    pub author_id: UserId,
    /// The store being reviewed.
    pub store_id: StoreId,
    /// Review body.
    pub text: String,
    /// Rating on the 1-5 scale.
    pub rating: Rating,
    /// When the review was created.
    pub created: DateTime<Utc>,
}

/// A review joined with its author's display name, for the store detail
/// page.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ReviewWithAuthor {
    pub id: ReviewId,
    pub author_id: UserId,
    pub author_name: String,
    pub store_id: StoreId,
    pub text: String,
    pub rating: Rating,
    pub created: DateTime<Utc>,
}

/// A review joined with its store's slug, for the post-edit redirect.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ReviewWithStore {
    pub id: ReviewId,
    pub author_id: UserId,
    pub store_id: StoreId,
    pub store_slug: Slug,
    pub text: String,
    pub rating: Rating,
    pub created: DateTime<Utc>,
}

/// Validated input for creating or updating a review.
#[derive(Debug, Clone)]
pub struct ReviewInput {
    pub text: String,
    pub rating: Rating,
}

impl ReviewInput {
    /// Build input from raw form fields.
    ///
    /// # Errors
    ///
    /// Returns a human-readable message when the text is empty or the
    /// rating is off the 1-5 scale.
    pub fn parse(text: &str, rating: i16) -> Result<Self, String> {
        let text = text.trim();
        if text.is_empty() {
            return Err("Your review must have some text!".to_owned());
        }
        let rating = Rating::new(rating).map_err(|e| e.to_string())?;
        Ok(Self {
            text: text.to_owned(),
            rating,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let input = ReviewInput::parse("  Great coffee  ", 4).unwrap();
        assert_eq!(input.text, "Great coffee");
        assert_eq!(input.rating.as_i16(), 4);
    }

    #[test]
    fn test_parse_empty_text() {
        assert!(ReviewInput::parse("   ", 4).is_err());
    }

    #[test]
    fn test_parse_bad_rating() {
        assert!(ReviewInput::parse("fine", 0).is_err());
        assert!(ReviewInput::parse("fine", 6).is_err());
    }
}
