//! Port for pushing place changes into the search index.

use async_trait::async_trait;

use crate::domain::{EntityId, Place};

use super::define_port_error;

define_port_error! {
    /// Errors raised by search index adapters.
    pub enum PlaceIndexerError {
        /// The index backend could not be reached.
        Unavailable { message: String } => "place index unavailable: {message}",
    }
}

/// Port for refreshing search index entries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlaceIndexer: Send + Sync {
    /// Insert or refresh the index entry for `place`.
    async fn upsert(&self, place: &Place) -> Result<(), PlaceIndexerError>;

    /// Remove the index entry for a deleted place.
    async fn remove(&self, id: &EntityId) -> Result<(), PlaceIndexerError>;
}
