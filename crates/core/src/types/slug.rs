//! URL-safe store identifiers.
//!
//! A [`Slug`] is derived from a store's human-readable name and used in
//! public URLs (`/store/{slug}`). Slugs are unique across all stores;
//! when a derived slug is already taken, [`Slug::next_available`] picks
//! the next free numeric suffix (`coffee`, `coffee-2`, `coffee-3`, ...).

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when deriving a [`Slug`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum SlugError {
    /// The source name contains no usable characters.
    #[error("name produces an empty slug")]
    Empty,
}

/// A URL-safe unique string identifier derived from a human-readable name.
///
/// Contains only lowercase ASCII letters, digits, and single dashes;
/// never starts or ends with a dash.
///
/// ## Examples
///
/// ```
/// use savory_core::Slug;
///
/// let slug = Slug::from_name("Milk & Honey Cafe").unwrap();
/// assert_eq!(slug.as_str(), "milk-honey-cafe");
///
/// assert!(Slug::from_name("!!!").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Derive a slug from a human-readable name.
    ///
    /// Uppercase is folded, every run of non-alphanumeric characters
    /// collapses to a single dash, and leading/trailing dashes are
    /// trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`SlugError::Empty`] if nothing usable remains.
    pub fn from_name(name: &str) -> Result<Self, SlugError> {
        let mut out = String::with_capacity(name.len());
        let mut pending_dash = false;

        for c in name.chars() {
            if c.is_ascii_alphanumeric() {
                if pending_dash && !out.is_empty() {
                    out.push('-');
                }
                pending_dash = false;
                out.push(c.to_ascii_lowercase());
            } else {
                pending_dash = true;
            }
        }

        if out.is_empty() {
            return Err(SlugError::Empty);
        }

        Ok(Self(out))
    }

    /// Pick the first slug not present in `taken`, suffixing with the
    /// next free number when the base itself is taken.
    ///
    /// `taken` should hold every existing slug equal to the base or of
    /// the form `{base}-{n}`. The suffix is one past the highest taken
    /// suffix, so deleted intermediate stores never cause a collision.
    #[must_use]
    pub fn next_available(&self, taken: &[String]) -> Self {
        if !taken.iter().any(|t| t == &self.0) {
            return self.clone();
        }

        let prefix = format!("{}-", self.0);
        let max_suffix = taken
            .iter()
            .filter_map(|t| t.strip_prefix(&prefix))
            .filter_map(|rest| rest.parse::<u32>().ok())
            .max()
            .unwrap_or(1);

        Self(format!("{}-{}", self.0, max_suffix + 1))
    }

    /// Returns the slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Slug` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Slug {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Slug {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        // Database values are assumed valid
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Slug {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_basic() {
        assert_eq!(Slug::from_name("Coffee Shop").unwrap().as_str(), "coffee-shop");
    }

    #[test]
    fn test_from_name_collapses_punctuation() {
        assert_eq!(
            Slug::from_name("Milk & Honey -- Cafe!").unwrap().as_str(),
            "milk-honey-cafe"
        );
    }

    #[test]
    fn test_from_name_trims_dashes() {
        assert_eq!(Slug::from_name("  --Tacos!--  ").unwrap().as_str(), "tacos");
    }

    #[test]
    fn test_from_name_empty() {
        assert!(matches!(Slug::from_name("!!!"), Err(SlugError::Empty)));
        assert!(matches!(Slug::from_name(""), Err(SlugError::Empty)));
    }

    #[test]
    fn test_next_available_no_collision() {
        let base = Slug::from_name("Coffee").unwrap();
        assert_eq!(base.next_available(&[]).as_str(), "coffee");
        assert_eq!(
            base.next_available(&["coffee-house".to_owned()]).as_str(),
            "coffee"
        );
    }

    #[test]
    fn test_next_available_first_collision() {
        let base = Slug::from_name("Coffee").unwrap();
        let taken = vec!["coffee".to_owned()];
        assert_eq!(base.next_available(&taken).as_str(), "coffee-2");
    }

    #[test]
    fn test_next_available_skips_past_highest() {
        let base = Slug::from_name("Coffee").unwrap();
        let taken = vec![
            "coffee".to_owned(),
            "coffee-2".to_owned(),
            "coffee-7".to_owned(),
        ];
        assert_eq!(base.next_available(&taken).as_str(), "coffee-8");
    }

    #[test]
    fn test_next_available_ignores_non_numeric_suffixes() {
        let base = Slug::from_name("Coffee").unwrap();
        let taken = vec!["coffee".to_owned(), "coffee-house".to_owned()];
        assert_eq!(base.next_available(&taken).as_str(), "coffee-2");
    }

    #[test]
    fn test_identical_names_get_distinct_slugs() {
        let base = Slug::from_name("Taco Place").unwrap();
        let mut taken: Vec<String> = Vec::new();

        let first = base.next_available(&taken);
        taken.push(first.clone().into_inner());
        let second = base.next_available(&taken);
        taken.push(second.clone().into_inner());
        let third = base.next_available(&taken);

        assert_eq!(first.as_str(), "taco-place");
        assert_eq!(second.as_str(), "taco-place-2");
        assert_eq!(third.as_str(), "taco-place-3");
    }
}
