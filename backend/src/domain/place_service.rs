//! Place domain service.
//!
//! Implements the place driving ports on top of the repository, cache, and
//! reindex queue ports. Every mutation follows the same sequence: write,
//! invalidate the cached listing, then publish a reindex request and wait
//! for the broker's verdict. A reindex failure fails the mutation even
//! though the write has already committed; the two are not atomic.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{debug, warn};

use crate::domain::ports::{
    CacheKeyBuilder, CategoryRepository, CategoryRepositoryError, PlaceCache, PlaceCacheKey,
    NoOpReindexMetrics, PlaceRepository, PlaceRepositoryError, PlacesCommand, PlacesQuery,
    ReindexError, ReindexMetrics, ReindexOutcome, ReindexQueue,
};
use crate::domain::category_service::map_category_error;
use crate::domain::{
    Category, EntityId, Error, Place, PlaceDraft, PlaceParts, RequestContext,
};

/// Cache key of the full place listing.
pub const LIST_PLACES_CACHE_KEY: &str = "list-places";
/// Prefix of cached search results.
pub const SEARCH_PLACES_CACHE_PREFIX: &str = "search-list-places";
/// Lifetime of cached listings.
pub const PLACES_CACHE_TTL: Duration = Duration::from_secs(5 * 60);
/// Default upper bound on waiting for a reindex confirmation.
pub const DEFAULT_REINDEX_TIMEOUT: Duration = Duration::from_secs(5);

fn map_place_error(error: PlaceRepositoryError) -> Error {
    match error {
        PlaceRepositoryError::NotFound { id } => Error::not_found(format!("place {id} not found")),
        PlaceRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("place repository unavailable: {message}"))
        }
        PlaceRepositoryError::Query { message } => {
            Error::internal(format!("place repository error: {message}"))
        }
    }
}

fn map_reindex_error(error: ReindexError) -> Error {
    match error {
        ReindexError::Publish { .. } | ReindexError::Cancelled { .. } => {
            Error::service_unavailable(error.to_string())
        }
        ReindexError::InvalidId
        | ReindexError::RoutingFailure { .. }
        | ReindexError::BrokerRejected { .. } => Error::internal(error.to_string()),
    }
}

fn list_places_key() -> Result<PlaceCacheKey, Error> {
    PlaceCacheKey::new(LIST_PLACES_CACHE_KEY).map_err(|err| Error::internal(err.to_string()))
}

/// Port bundle required by [`PlaceService`].
#[derive(Clone)]
pub struct PlaceServicePorts {
    /// Place persistence.
    pub places: Arc<dyn PlaceRepository>,
    /// Category persistence.
    pub categories: Arc<dyn CategoryRepository>,
    /// Listing cache.
    pub cache: Arc<dyn PlaceCache>,
    /// Reindex notification publisher.
    pub reindex: Arc<dyn ReindexQueue>,
}

/// Place service implementing [`PlacesCommand`] and [`PlacesQuery`].
#[derive(Clone)]
pub struct PlaceService {
    ports: PlaceServicePorts,
    clock: Arc<dyn Clock>,
    metrics: Arc<dyn ReindexMetrics>,
    reindex_timeout: Duration,
}

impl PlaceService {
    /// Create a service using [`DEFAULT_REINDEX_TIMEOUT`].
    pub fn new(ports: PlaceServicePorts, clock: Arc<dyn Clock>) -> Self {
        Self {
            ports,
            clock,
            metrics: Arc::new(NoOpReindexMetrics),
            reindex_timeout: DEFAULT_REINDEX_TIMEOUT,
        }
    }

    /// Report reindex outcomes to `metrics` instead of discarding them.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<dyn ReindexMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Override how long a mutation waits for the reindex confirmation.
    #[must_use]
    pub fn with_reindex_timeout(mut self, timeout: Duration) -> Self {
        self.reindex_timeout = timeout;
        self
    }

    async fn build_place(
        &self,
        id: EntityId,
        draft: PlaceDraft,
        created_at: chrono::DateTime<chrono::Utc>,
        updated_at: Option<chrono::DateTime<chrono::Utc>>,
    ) -> Result<Place, Error> {
        let category = EntityId::parse(&draft.category)
            .map_err(|err| Error::invalid_request(format!("invalid category: {err}")))?;
        self.ports
            .categories
            .find(&category)
            .await
            .map_err(|err| match err {
                CategoryRepositoryError::NotFound { id } => {
                    Error::invalid_request(format!("category {id} does not exist"))
                }
                other => map_category_error(other),
            })?;

        Place::new(PlaceParts {
            id,
            name: draft.name,
            description: draft.description,
            category,
            tags: draft.tags,
            created_at,
            updated_at,
        })
        .map_err(|err| Error::invalid_request(format!("invalid place: {err}")))
    }

    async fn cached(&self, key: &PlaceCacheKey) -> Option<Vec<Place>> {
        match self.ports.cache.get(key).await {
            Ok(hit) => hit,
            Err(error) => {
                warn!(key = %key, error = %error, "place cache read failed; falling back to repository");
                None
            }
        }
    }

    async fn store(&self, key: &PlaceCacheKey, places: &[Place]) {
        if let Err(error) = self.ports.cache.set(key, places, PLACES_CACHE_TTL).await {
            warn!(key = %key, error = %error, "place cache write failed");
        }
    }

    /// Invalidate the listing and publish the reindex request.
    async fn after_write(&self, ctx: &RequestContext, id: EntityId) -> Result<(), Error> {
        self.ports
            .cache
            .delete(&[list_places_key()?])
            .await
            .map_err(|err| Error::service_unavailable(err.to_string()))?;

        let reindex_ctx = ctx.child_with_timeout(self.reindex_timeout);
        let published = self.ports.reindex.publish_reindex(&reindex_ctx, &id).await;
        if let Err(error) = self.metrics.record(ReindexOutcome::of(&published)).await {
            warn!(place_id = %id, error = %error, "recording reindex outcome failed");
        }
        published.map_err(|err| {
            warn!(place_id = %id, error = %err, "reindex publish failed after write");
            map_reindex_error(err)
        })?;
        debug!(place_id = %id, "reindex confirmed");
        Ok(())
    }
}

#[async_trait]
impl PlacesCommand for PlaceService {
    async fn create(&self, ctx: &RequestContext, draft: PlaceDraft) -> Result<EntityId, Error> {
        let place = self
            .build_place(EntityId::generate(), draft, self.clock.utc(), None)
            .await?;

        let id = self
            .ports
            .places
            .create(&place)
            .await
            .map_err(map_place_error)?;

        self.after_write(ctx, id).await?;
        Ok(id)
    }

    async fn update(
        &self,
        ctx: &RequestContext,
        id: EntityId,
        draft: PlaceDraft,
    ) -> Result<(), Error> {
        let existing = self.ports.places.find(&id).await.map_err(map_place_error)?;
        let place = self
            .build_place(id, draft, existing.created_at(), Some(self.clock.utc()))
            .await?;

        self.ports
            .places
            .update(&place)
            .await
            .map_err(map_place_error)?;

        self.after_write(ctx, id).await
    }

    async fn delete(&self, ctx: &RequestContext, id: EntityId) -> Result<(), Error> {
        self.ports
            .places
            .delete(&id)
            .await
            .map_err(map_place_error)?;

        self.after_write(ctx, id).await
    }
}

#[async_trait]
impl PlacesQuery for PlaceService {
    async fn list_places(&self) -> Result<Vec<Place>, Error> {
        let key = list_places_key()?;
        if let Some(places) = self.cached(&key).await {
            return Ok(places);
        }

        let places = self
            .ports
            .places
            .find_all()
            .await
            .map_err(map_place_error)?;
        self.store(&key, &places).await;
        Ok(places)
    }

    async fn find_place(&self, id: EntityId) -> Result<Place, Error> {
        self.ports.places.find(&id).await.map_err(map_place_error)
    }

    async fn search_places(&self, query: String) -> Result<Vec<Place>, Error> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::invalid_request("search query must not be empty"));
        }

        let key = CacheKeyBuilder::new()
            .part(SEARCH_PLACES_CACHE_PREFIX)
            .hashed_part(query)
            .build()
            .map_err(|err| Error::internal(err.to_string()))?;
        if let Some(places) = self.cached(&key).await {
            return Ok(places);
        }

        let places = self
            .ports
            .places
            .search(query)
            .await
            .map_err(map_place_error)?;
        self.store(&key, &places).await;
        Ok(places)
    }

    async fn list_categories(&self) -> Result<Vec<Category>, Error> {
        self.ports
            .categories
            .find_all()
            .await
            .map_err(map_category_error)
    }

    async fn find_category(&self, id: EntityId) -> Result<Category, Error> {
        self.ports
            .categories
            .find(&id)
            .await
            .map_err(map_category_error)
    }
}

#[cfg(test)]
#[path = "place_service_tests.rs"]
mod tests;
