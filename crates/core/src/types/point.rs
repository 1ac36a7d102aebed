//! Geographic point type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`GeoPoint`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum GeoPointError {
    /// Longitude outside [-180, 180] or not finite.
    #[error("longitude must be a finite value between -180 and 180, got {0}")]
    InvalidLongitude(f64),
    /// Latitude outside [-90, 90] or not finite.
    #[error("latitude must be a finite value between -90 and 90, got {0}")]
    InvalidLatitude(f64),
}

/// A validated geographic point (longitude, latitude) in degrees.
///
/// Longitude comes first, matching GeoJSON coordinate order.
///
/// ## Examples
///
/// ```
/// use savory_core::GeoPoint;
///
/// let point = GeoPoint::new(-79.8, 43.2).unwrap();
/// assert_eq!(point.lng(), -79.8);
/// assert_eq!(point.lat(), 43.2);
///
/// assert!(GeoPoint::new(-200.0, 43.2).is_err());
/// assert!(GeoPoint::new(-79.8, 91.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    lng: f64,
    lat: f64,
}

impl GeoPoint {
    /// Create a validated point from longitude and latitude degrees.
    ///
    /// # Errors
    ///
    /// Returns an error if either coordinate is non-finite or out of range.
    pub fn new(lng: f64, lat: f64) -> Result<Self, GeoPointError> {
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(GeoPointError::InvalidLongitude(lng));
        }
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(GeoPointError::InvalidLatitude(lat));
        }
        Ok(Self { lng, lat })
    }

    /// Longitude in degrees.
    #[must_use]
    pub const fn lng(&self) -> f64 {
        self.lng
    }

    /// Latitude in degrees.
    #[must_use]
    pub const fn lat(&self) -> f64 {
        self.lat
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.lng, self.lat)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_point() {
        let p = GeoPoint::new(-79.8, 43.2).unwrap();
        assert_eq!(p.lng(), -79.8);
        assert_eq!(p.lat(), 43.2);
    }

    #[test]
    fn test_boundaries_are_valid() {
        assert!(GeoPoint::new(-180.0, -90.0).is_ok());
        assert!(GeoPoint::new(180.0, 90.0).is_ok());
        assert!(GeoPoint::new(0.0, 0.0).is_ok());
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert!(matches!(
            GeoPoint::new(-180.1, 0.0),
            Err(GeoPointError::InvalidLongitude(_))
        ));
        assert!(matches!(
            GeoPoint::new(0.0, 90.5),
            Err(GeoPointError::InvalidLatitude(_))
        ));
    }

    #[test]
    fn test_rejects_non_finite() {
        assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
        assert!(GeoPoint::new(0.0, f64::INFINITY).is_err());
    }
}
