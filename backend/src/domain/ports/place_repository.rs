//! Port for place persistence.

use async_trait::async_trait;

use crate::domain::{EntityId, Place};

use super::define_port_error;

define_port_error! {
    /// Errors raised by place repository adapters.
    pub enum PlaceRepositoryError {
        /// No place exists with the requested identifier.
        NotFound { id: String } => "place {id} not found",
        /// Repository connection could not be established.
        Connection { message: String } => "place repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "place repository query failed: {message}",
    }
}

/// Port for reading and writing places.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlaceRepository: Send + Sync {
    /// Find a place by identifier.
    async fn find(&self, id: &EntityId) -> Result<Place, PlaceRepositoryError>;

    /// List every place.
    async fn find_all(&self) -> Result<Vec<Place>, PlaceRepositoryError>;

    /// Insert a new place and return its identifier.
    async fn create(&self, place: &Place) -> Result<EntityId, PlaceRepositoryError>;

    /// Replace an existing place.
    async fn update(&self, place: &Place) -> Result<(), PlaceRepositoryError>;

    /// Remove a place.
    async fn delete(&self, id: &EntityId) -> Result<(), PlaceRepositoryError>;

    /// Full-text search over places.
    async fn search(&self, query: &str) -> Result<Vec<Place>, PlaceRepositoryError>;
}
