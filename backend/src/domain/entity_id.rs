//! Time-ordered identifier shared by places and categories.
//!
//! Identifiers are version 7 UUIDs so they sort by creation time. The
//! canonical string form (lowercase, hyphenated) is what travels over the
//! wire, both in HTTP payloads and as the body of reindex messages.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Errors raised when parsing an [`EntityId`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntityIdError {
    /// The input is not a UUID in any accepted textual form.
    #[error("the provided string is not a valid ID: {input:?}")]
    InvalidString { input: String },
}

/// Opaque, sortable 128-bit identifier.
///
/// # Examples
/// ```
/// use walk_backend::domain::EntityId;
///
/// let id = EntityId::generate();
/// let parsed: EntityId = id.to_string().parse().expect("canonical form parses");
/// assert_eq!(parsed, id);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId(Uuid);

impl EntityId {
    /// Generate a fresh time-ordered identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }

    /// The all-zero identifier, used as "no identifier".
    #[must_use]
    pub const fn nil() -> Self {
        Self(Uuid::nil())
    }

    /// Return `true` for the all-zero identifier.
    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    /// Parse an identifier from its textual form.
    pub fn parse(input: &str) -> Result<Self, EntityIdError> {
        Uuid::parse_str(input)
            .map(Self)
            .map_err(|_| EntityIdError::InvalidString {
                input: input.to_owned(),
            })
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Access the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.hyphenated(), f)
    }
}

impl FromStr for EntityId {
    type Err = EntityIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for EntityId {
    type Error = EntityIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<EntityId> for String {
    fn from(value: EntityId) -> Self {
        value.to_string()
    }
}
