//! Core types for Savory.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod point;
pub mod rating;
pub mod slug;

pub use email::{Email, EmailError};
pub use id::*;
pub use point::{GeoPoint, GeoPointError};
pub use rating::{Rating, RatingError};
pub use slug::{Slug, SlugError};
