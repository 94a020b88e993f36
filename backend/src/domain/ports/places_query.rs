//! Driving port for place and category reads.

use async_trait::async_trait;

use crate::domain::{Category, EntityId, Error, Place};

/// Use-case port for browsing the directory.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlacesQuery: Send + Sync {
    /// List every place.
    async fn list_places(&self) -> Result<Vec<Place>, Error>;

    /// Find one place.
    async fn find_place(&self, id: EntityId) -> Result<Place, Error>;

    /// Search places by free text.
    async fn search_places(&self, query: String) -> Result<Vec<Place>, Error>;

    /// List every category.
    async fn list_categories(&self) -> Result<Vec<Category>, Error>;

    /// Find one category.
    async fn find_category(&self, id: EntityId) -> Result<Category, Error>;
}
