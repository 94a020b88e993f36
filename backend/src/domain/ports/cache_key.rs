//! Cache keys for place listings and the builder that assembles them.
//!
//! Keys are colon-separated parts. Free-form input such as a search query
//! is added hashed so keys stay short and free of whitespace.

use sha2::{Digest, Sha256};
use thiserror::Error;

/// Default separator placed between key parts.
pub const DEFAULT_KEY_SEPARATOR: &str = ":";

/// Key used to store and retrieve cached place listings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlaceCacheKey(String);

impl PlaceCacheKey {
    /// Construct a cache key after validating that it is non-empty and trimmed.
    pub fn new(value: impl Into<String>) -> Result<Self, PlaceCacheKeyValidationError> {
        let raw = value.into();
        if raw.trim().is_empty() {
            return Err(PlaceCacheKeyValidationError::Empty);
        }
        if raw.chars().any(char::is_whitespace) {
            return Err(PlaceCacheKeyValidationError::ContainsWhitespace);
        }
        Ok(Self(raw))
    }

    /// Borrow the underlying key as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for PlaceCacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for PlaceCacheKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Validation errors returned when constructing [`PlaceCacheKey`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaceCacheKeyValidationError {
    /// Key is empty after trimming whitespace.
    #[error("place cache key must not be empty")]
    Empty,
    /// Key contains whitespace.
    #[error("place cache key must not contain whitespace")]
    ContainsWhitespace,
}

/// Incrementally assembles a [`PlaceCacheKey`].
///
/// # Examples
/// ```
/// use walk_backend::domain::ports::CacheKeyBuilder;
///
/// let key = CacheKeyBuilder::new()
///     .part("search-list-places")
///     .hashed_part("old town")
///     .build()
///     .expect("non-empty key");
/// assert!(key.as_str().starts_with("search-list-places:"));
/// ```
#[derive(Debug, Clone)]
pub struct CacheKeyBuilder {
    separator: String,
    parts: Vec<String>,
}

impl Default for CacheKeyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheKeyBuilder {
    /// Start a key using [`DEFAULT_KEY_SEPARATOR`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_separator(DEFAULT_KEY_SEPARATOR)
    }

    /// Start a key using a custom separator.
    #[must_use]
    pub fn with_separator(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
            parts: Vec::new(),
        }
    }

    /// Append a literal part.
    #[must_use]
    pub fn part(mut self, part: impl Into<String>) -> Self {
        self.parts.push(part.into());
        self
    }

    /// Append the lowercase hex SHA-256 digest of `part`.
    #[must_use]
    pub fn hashed_part(mut self, part: impl AsRef<[u8]>) -> Self {
        let digest = Sha256::digest(part.as_ref());
        self.parts.push(hex::encode(digest));
        self
    }

    /// Join the parts into a validated key.
    pub fn build(self) -> Result<PlaceCacheKey, PlaceCacheKeyValidationError> {
        PlaceCacheKey::new(self.parts.join(&self.separator))
    }
}
