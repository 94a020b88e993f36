//! Driving port for place mutations.

use async_trait::async_trait;

use crate::domain::{EntityId, Error, PlaceDraft, RequestContext};

/// Use-case port for creating, updating, and deleting places.
///
/// Every successful mutation has been written and queued for reindexing.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlacesCommand: Send + Sync {
    /// Create a place and return its identifier.
    async fn create(&self, ctx: &RequestContext, draft: PlaceDraft) -> Result<EntityId, Error>;

    /// Replace the fields of an existing place.
    async fn update(
        &self,
        ctx: &RequestContext,
        id: EntityId,
        draft: PlaceDraft,
    ) -> Result<(), Error>;

    /// Delete a place.
    async fn delete(&self, ctx: &RequestContext, id: EntityId) -> Result<(), Error>;
}
