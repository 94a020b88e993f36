//! Search index adapter that records what it would forward.
//!
//! No search engine is wired in yet; the consumer still exercises the full
//! acknowledgement path against this adapter.

use async_trait::async_trait;
use tracing::info;

use crate::domain::ports::{PlaceIndexer, PlaceIndexerError};
use crate::domain::{EntityId, Place};

/// [`PlaceIndexer`] that logs each index operation.
#[derive(Debug, Clone, Default)]
pub struct LoggingPlaceIndexer;

impl LoggingPlaceIndexer {
    /// Create a new logging indexer.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PlaceIndexer for LoggingPlaceIndexer {
    async fn upsert(&self, place: &Place) -> Result<(), PlaceIndexerError> {
        info!(
            place_id = %place.id(),
            name = place.name(),
            slug = place.name_slug(),
            "would forward place to search index"
        );
        Ok(())
    }

    async fn remove(&self, id: &EntityId) -> Result<(), PlaceIndexerError> {
        info!(place_id = %id, "would remove place from search index");
        Ok(())
    }
}
