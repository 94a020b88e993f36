//! Port interface for caching place listings.
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::Place;

use super::{PlaceCacheKey, define_port_error};

define_port_error! {
    /// Errors surfaced by the caching adapter.
    pub enum PlaceCacheError {
        /// Cache backend is unavailable or timing out.
        Backend { message: String } => "place cache backend failure: {message}",
        /// Serialisation or deserialisation of cached content failed.
        Serialization { message: String } => "place cache serialisation failed: {message}",
    }
}

/// Port for caching listings of places.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlaceCache: Send + Sync {
    /// Read a cached listing; `None` on a miss.
    async fn get(&self, key: &PlaceCacheKey) -> Result<Option<Vec<Place>>, PlaceCacheError>;

    /// Store a listing under `key` for `ttl`.
    async fn set(
        &self,
        key: &PlaceCacheKey,
        places: &[Place],
        ttl: Duration,
    ) -> Result<(), PlaceCacheError>;

    /// Invalidate the given keys.
    async fn delete(&self, keys: &[PlaceCacheKey]) -> Result<(), PlaceCacheError>;
}
