//! URL slug type for categories and products.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when creating a [`Slug`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SlugError {
    /// Nothing usable was left after normalisation.
    #[error("slug cannot be empty")]
    Empty,
    /// The slug is too long.
    #[error("slug must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The slug contains a character outside `a-z`, `0-9` and `-`.
    #[error("slug may only contain lowercase letters, digits and hyphens")]
    InvalidCharacter,
}

/// A URL-safe identifier such as `fresh-fruit` or `organic-bananas-1kg`.
///
/// ## Constraints
///
/// - Only `a-z`, `0-9` and `-`
/// - No leading, trailing or repeated hyphens
/// - 1-120 characters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Maximum length of a slug.
    pub const MAX_LENGTH: usize = 120;

    /// Derive a slug from a human-readable name.
    ///
    /// ```
    /// use freshmart_core::Slug;
    ///
    /// let slug = Slug::from_name("Organic Bananas (1 kg)").unwrap();
    /// assert_eq!(slug.as_str(), "organic-bananas-1-kg");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `SlugError::Empty` if the name has no ASCII letters or digits.
    pub fn from_name(name: &str) -> Result<Self, SlugError> {
        let mut out = String::with_capacity(name.len());
        let mut pending_hyphen = false;

        for c in name.chars() {
            if c.is_ascii_alphanumeric() {
                if pending_hyphen && !out.is_empty() {
                    out.push('-');
                }
                pending_hyphen = false;
                out.push(c.to_ascii_lowercase());
            } else {
                pending_hyphen = true;
            }
        }

        if out.is_empty() {
            return Err(SlugError::Empty);
        }

        if out.len() > Self::MAX_LENGTH {
            out.truncate(Self::MAX_LENGTH);
            while out.ends_with('-') {
                out.pop();
            }
        }

        Ok(Self(out))
    }

    /// Validate an explicitly supplied slug.
    ///
    /// # Errors
    ///
    /// Returns an error if the slug is empty, too long, or not in canonical form.
    pub fn parse(s: &str) -> Result<Self, SlugError> {
        if s.is_empty() {
            return Err(SlugError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(SlugError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        let valid_chars = s
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
        if !valid_chars || s.starts_with('-') || s.ends_with('-') || s.contains("--") {
            return Err(SlugError::InvalidCharacter);
        }
        Ok(Self(s.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_collapses_separators() {
        assert_eq!(
            Slug::from_name("  Dairy & Eggs!! ").unwrap().as_str(),
            "dairy-eggs"
        );
        assert_eq!(
            Slug::from_name("Bread--Bakery").unwrap().as_str(),
            "bread-bakery"
        );
    }

    #[test]
    fn test_from_name_drops_non_ascii() {
        assert_eq!(
            Slug::from_name("Crème fraîche").unwrap().as_str(),
            "cr-me-fra-che"
        );
    }

    #[test]
    fn test_from_name_empty() {
        assert_eq!(Slug::from_name("!!!"), Err(SlugError::Empty));
        assert_eq!(Slug::from_name(""), Err(SlugError::Empty));
    }

    #[test]
    fn test_from_name_truncates_without_trailing_hyphen() {
        let name = format!("{} b", "a".repeat(119));
        let slug = Slug::from_name(&name).unwrap();
        assert_eq!(slug.as_str().len(), 119);
        assert!(!slug.as_str().ends_with('-'));
    }

    #[test]
    fn test_parse_valid() {
        assert!(Slug::parse("fresh-fruit").is_ok());
        assert!(Slug::parse("milk-2l").is_ok());
    }

    #[test]
    fn test_parse_invalid() {
        assert_eq!(Slug::parse(""), Err(SlugError::Empty));
        assert_eq!(Slug::parse("Fresh"), Err(SlugError::InvalidCharacter));
        assert_eq!(Slug::parse("-fresh"), Err(SlugError::InvalidCharacter));
        assert_eq!(Slug::parse("fresh--fruit"), Err(SlugError::InvalidCharacter));
        assert!(matches!(
            Slug::parse(&"a".repeat(121)),
            Err(SlugError::TooLong { .. })
        ));
    }
}
