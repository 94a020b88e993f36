//! Place aggregate and the client-supplied draft it is built from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::EntityId;
use super::slug::{is_valid_slug, slugify};

/// Validation errors returned when building a [`Place`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaceValidationError {
    /// The name is empty after trimming.
    #[error("place name must not be empty")]
    EmptyName,
    /// The name does not produce a usable slug.
    #[error("place name must contain at least one ASCII letter or digit")]
    InvalidSlug,
    /// A tag is empty after trimming.
    #[error("place tags must not be empty")]
    EmptyTag,
}

/// A point of interest listed in the directory.
///
/// ## Invariants
/// - `name` is non-empty once trimmed.
/// - `name_slug` is a valid slug derived from `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    id: EntityId,
    name: String,
    name_slug: String,
    description: String,
    category: EntityId,
    tags: Vec<String>,
    created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
}

/// Fields required to build a [`Place`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceParts {
    /// Identifier of the place.
    pub id: EntityId,
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Category the place belongs to.
    pub category: EntityId,
    /// Search tags.
    pub tags: Vec<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp, if the place was ever updated.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Place {
    /// Validate the parts and derive the slug from the name.
    pub fn new(parts: PlaceParts) -> Result<Self, PlaceValidationError> {
        let PlaceParts {
            id,
            name,
            description,
            category,
            tags,
            created_at,
            updated_at,
        } = parts;

        let name = name.trim().to_owned();
        if name.is_empty() {
            return Err(PlaceValidationError::EmptyName);
        }
        let name_slug = slugify(&name);
        if !is_valid_slug(&name_slug) {
            return Err(PlaceValidationError::InvalidSlug);
        }
        let tags = tags
            .into_iter()
            .map(|tag| {
                let trimmed = tag.trim();
                if trimmed.is_empty() {
                    Err(PlaceValidationError::EmptyTag)
                } else {
                    Ok(trimmed.to_owned())
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id,
            name,
            name_slug,
            description,
            category,
            tags,
            created_at,
            updated_at,
        })
    }

    /// Identifier of the place.
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Slug derived from the name.
    pub fn name_slug(&self) -> &str {
        &self.name_slug
    }

    /// Free-form description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Category identifier.
    pub fn category(&self) -> EntityId {
        self.category
    }

    /// Search tags.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Creation timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Last update timestamp.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Case-insensitive match of `needle` against name, description, and tags.
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.name.to_lowercase().contains(&needle)
            || self.description.to_lowercase().contains(&needle)
            || self
                .tags
                .iter()
                .any(|tag| tag.to_lowercase().contains(&needle))
    }
}

/// Client-supplied place fields before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceDraft {
    /// Display name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Category identifier in string form.
    pub category: String,
    /// Search tags.
    #[serde(default)]
    pub tags: Vec<String>,
}
