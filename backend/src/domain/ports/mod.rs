//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (repositories, cache, reindex queue, metrics, indexer) describe what
//! the domain needs from infrastructure. Driving ports (`PlacesCommand`,
//! `PlacesQuery`, `CategoriesCommand`) are what inbound adapters call.

mod macros;
pub(crate) use macros::define_port_error;

mod cache_key;
mod categories_command;
mod category_repository;
mod place_cache;
mod place_indexer;
mod place_repository;
mod places_command;
mod places_query;
mod reindex_metrics;
mod reindex_queue;

pub use cache_key::{
    CacheKeyBuilder, DEFAULT_KEY_SEPARATOR, PlaceCacheKey, PlaceCacheKeyValidationError,
};
#[cfg(test)]
pub use categories_command::MockCategoriesCommand;
pub use categories_command::CategoriesCommand;
#[cfg(test)]
pub use category_repository::MockCategoryRepository;
pub use category_repository::{CategoryRepository, CategoryRepositoryError};
#[cfg(test)]
pub use place_cache::MockPlaceCache;
pub use place_cache::{PlaceCache, PlaceCacheError};
#[cfg(test)]
pub use place_indexer::MockPlaceIndexer;
pub use place_indexer::{PlaceIndexer, PlaceIndexerError};
#[cfg(test)]
pub use place_repository::MockPlaceRepository;
pub use place_repository::{PlaceRepository, PlaceRepositoryError};
#[cfg(test)]
pub use places_command::MockPlacesCommand;
pub use places_command::PlacesCommand;
#[cfg(test)]
pub use places_query::MockPlacesQuery;
pub use places_query::PlacesQuery;
#[cfg(test)]
pub use reindex_metrics::MockReindexMetrics;
pub use reindex_metrics::{
    NoOpReindexMetrics, ReindexMetrics, ReindexMetricsError, ReindexOutcome,
};
#[cfg(test)]
pub use reindex_queue::MockReindexQueue;
pub use reindex_queue::{ReindexError, ReindexQueue};
