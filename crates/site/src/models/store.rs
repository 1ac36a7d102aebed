//! Store domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use savory_core::{GeoPoint, Slug, StoreId, UserId};

/// A store listing.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Store {
    /// Unique store ID.
    pub id: StoreId,
    /// Display name.
    pub name: String,
    /// URL-safe unique identifier derived from the name.
    pub slug: Slug,
    /// Free-text description.
    pub description: String,
    /// Tag labels (a set; duplicates are rejected on write).
    pub tags: Vec<String>,
    /// Filename of the uploaded photo, if any.
    pub photo: Option<String>,
    /// Free-text street address.
    pub address: Option<String>,
    /// Longitude in degrees.
    pub lng: Option<f64>,
    /// Latitude in degrees.
    pub lat: Option<f64>,
    /// The owning user. Immutable after creation.
    pub author_id: UserId,
    /// When the store was created.
    pub created: DateTime<Utc>,
}

impl Store {
    /// The store's location as a validated point, when both coordinates
    /// are present.
    #[must_use]
    pub fn location(&self) -> Option<GeoPoint> {
        match (self.lng, self.lat) {
            (Some(lng), Some(lat)) => GeoPoint::new(lng, lat).ok(),
            _ => None,
        }
    }
}

/// Validated input for creating or updating a store.
///
/// Route handlers build this from multipart form data; validation happens
/// in [`StoreInput::validate`] before any repository call.
#[derive(Debug, Clone, Default)]
pub struct StoreInput {
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub address: Option<String>,
    pub lng: Option<f64>,
    pub lat: Option<f64>,
    /// Set when a new photo was uploaded and resized.
    pub photo: Option<String>,
}

impl StoreInput {
    /// Check required fields: a non-empty name and a complete, valid
    /// location (address + both coordinates).
    ///
    /// # Errors
    ///
    /// Returns a human-readable message suitable for a form flash.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("You must supply a store name!".to_owned());
        }
        if self.address.as_deref().is_none_or(|a| a.trim().is_empty()) {
            return Err("You must supply an address!".to_owned());
        }
        let (Some(lng), Some(lat)) = (self.lng, self.lat) else {
            return Err("You must supply coordinates!".to_owned());
        };
        GeoPoint::new(lng, lat).map_err(|e| e.to_string())?;
        Ok(())
    }
}

/// A store row returned by the geo `near` query, with its computed
/// distance from the probe point.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct NearbyStore {
    pub slug: Slug,
    pub name: String,
    pub description: String,
    pub photo: Option<String>,
    pub address: Option<String>,
    pub lng: f64,
    pub lat: f64,
    /// Great-circle distance from the query point, in meters.
    pub distance_m: f64,
}

/// A store row from the top-rated aggregation.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TopStore {
    pub id: StoreId,
    pub name: String,
    pub slug: Slug,
    pub photo: Option<String>,
    /// Mean review rating.
    pub average_rating: f64,
    /// Number of reviews contributing to the average.
    pub review_count: i64,
}

/// A tag label with its usage count.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TagCount {
    pub tag: String,
    pub count: i64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn valid_input() -> StoreInput {
        StoreInput {
            name: "Taco Place".to_owned(),
            description: "Late night tacos".to_owned(),
            tags: vec!["Open Late".to_owned()],
            address: Some("123 King St W".to_owned()),
            lng: Some(-79.8),
            lat: Some(43.2),
            photo: None,
        }
    }

    #[test]
    fn test_valid_input_passes() {
        assert!(valid_input().validate().is_ok());
    }

    #[test]
    fn test_missing_name_fails() {
        let mut input = valid_input();
        input.name = "   ".to_owned();
        assert!(input.validate().unwrap_err().contains("store name"));
    }

    #[test]
    fn test_missing_address_fails() {
        let mut input = valid_input();
        input.address = None;
        assert!(input.validate().unwrap_err().contains("address"));
    }

    #[test]
    fn test_missing_coordinates_fail() {
        let mut input = valid_input();
        input.lat = None;
        assert!(input.validate().unwrap_err().contains("coordinates"));
    }

    #[test]
    fn test_out_of_range_coordinates_fail() {
        let mut input = valid_input();
        input.lng = Some(-361.0);
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_location_requires_both_coordinates() {
        let mut store = Store {
            id: StoreId::new(1),
            name: "s".to_owned(),
            slug: Slug::from_name("s").unwrap(),
            description: String::new(),
            tags: vec![],
            photo: None,
            address: None,
            lng: Some(-79.8),
            lat: None,
            author_id: UserId::new(1),
            created: Utc::now(),
        };
        assert!(store.location().is_none());
        store.lat = Some(43.2);
        assert_eq!(store.location().unwrap().lng(), -79.8);
    }
}
