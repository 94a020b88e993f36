//! Place category model.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::EntityId;

/// Validation errors returned by [`Category::new`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CategoryValidationError {
    /// The name is empty after trimming.
    #[error("category name must not be empty")]
    EmptyName,
    /// Order zero is reserved for "unordered".
    #[error("category order must not be zero")]
    ZeroOrder,
}

/// Grouping used to browse places.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    id: EntityId,
    name: String,
    order: i8,
}

impl Category {
    /// Validate and construct a category.
    pub fn new(
        id: EntityId,
        name: impl Into<String>,
        order: i8,
    ) -> Result<Self, CategoryValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(CategoryValidationError::EmptyName);
        }
        if order == 0 {
            return Err(CategoryValidationError::ZeroOrder);
        }
        Ok(Self { id, name, order })
    }

    /// Identifier of the category.
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sort position in listings.
    pub fn order(&self) -> i8 {
        self.order
    }
}

/// Unvalidated category fields supplied by a client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CategoryDraft {
    /// Display name.
    pub name: String,
    /// Position in category listings; must not be zero.
    pub order: i8,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", 1, CategoryValidationError::EmptyName)]
    #[case("Museums", 0, CategoryValidationError::ZeroOrder)]
    fn new_validates_fields(
        #[case] name: &str,
        #[case] order: i8,
        #[case] expected: CategoryValidationError,
    ) {
        assert_eq!(
            Category::new(EntityId::generate(), name, order),
            Err(expected)
        );
    }

    #[rstest]
    fn new_accepts_valid_category() {
        let id = EntityId::generate();
        let category = Category::new(id, "Parks", 2).expect("valid category");
        assert_eq!(category.id(), id);
        assert_eq!(category.name(), "Parks");
        assert_eq!(category.order(), 2);
    }
}
