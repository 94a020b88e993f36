//! Port for category persistence.

use async_trait::async_trait;

use crate::domain::{Category, EntityId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by category repository adapters.
    pub enum CategoryRepositoryError {
        /// No category exists with the requested identifier.
        NotFound { id: String } => "category {id} not found",
        /// Repository connection could not be established.
        Connection { message: String } => "category repository connection failed: {message}",
        /// Query failed during execution.
        Query { message: String } => "category repository query failed: {message}",
    }
}

/// Port for reading and writing categories.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Find a category by identifier.
    async fn find(&self, id: &EntityId) -> Result<Category, CategoryRepositoryError>;

    /// List every category ordered by their `order` field.
    async fn find_all(&self) -> Result<Vec<Category>, CategoryRepositoryError>;

    /// Insert a new category and return its identifier.
    async fn create(&self, category: &Category) -> Result<EntityId, CategoryRepositoryError>;

    /// Replace an existing category.
    async fn update(&self, category: &Category) -> Result<(), CategoryRepositoryError>;

    /// Remove a category.
    async fn delete(&self, id: &EntityId) -> Result<(), CategoryRepositoryError>;
}
