//! Builders wiring outbound adapters into the domain services.

use std::sync::Arc;
use std::time::Duration;

use mockable::DefaultClock;
use tracing::info;

use walk_backend::config::{RabbitMqSettings, RedisSettings};
use walk_backend::domain::ports::{PlaceCache, PlaceIndexer, PlaceRepository, ReindexMetrics};
use walk_backend::domain::{
    Category, CategoryService, EntityId, PlaceService, PlaceServicePorts, ReindexHandler,
};
use walk_backend::inbound::amqp::{ConsumerOptions, ReindexTopology};
use walk_backend::inbound::http::state::{HttpState, HttpStatePorts};
use walk_backend::outbound::broker::{BrokerChannel, LapinBrokerChannel};
use walk_backend::outbound::cache::RedisPlaceCache;
use walk_backend::outbound::indexer::LoggingPlaceIndexer;
use walk_backend::outbound::persistence::{InMemoryCategoryRepository, InMemoryPlaceRepository};
use walk_backend::outbound::queue::{ReindexPublisher, ReindexTarget};

/// Categories available on a fresh start, in display order.
const SEED_CATEGORIES: [&str; 4] = ["Parks", "Museums", "Viewpoints", "Cafes"];

/// Every long-lived adapter the process shares between HTTP and AMQP.
pub struct Adapters {
    pub broker: Arc<LapinBrokerChannel>,
    pub publisher: Arc<ReindexPublisher>,
    pub places: Arc<InMemoryPlaceRepository>,
    pub categories: Arc<InMemoryCategoryRepository>,
    pub cache: Arc<dyn PlaceCache>,
    pub indexer: Arc<dyn PlaceIndexer>,
}

fn seed_categories() -> std::io::Result<Vec<Category>> {
    SEED_CATEGORIES
        .iter()
        .zip(1_i8..)
        .map(|(name, order)| {
            Category::new(EntityId::generate(), *name, order)
                .map_err(|err| std::io::Error::other(format!("invalid seed category: {err}")))
        })
        .collect()
}

/// Connect the broker and cache and create the in-process repositories.
///
/// # Errors
/// Returns [`std::io::Error`] when the broker or cache cannot be reached.
pub async fn build_adapters(
    rabbitmq: &RabbitMqSettings,
    redis: &RedisSettings,
) -> std::io::Result<Adapters> {
    let broker = Arc::new(
        LapinBrokerChannel::connect(rabbitmq.uri())
            .await
            .map_err(|err| std::io::Error::other(format!("connect broker: {err}")))?,
    );
    let publisher = Arc::new(ReindexPublisher::new(
        Arc::clone(&broker) as Arc<dyn BrokerChannel>,
        ReindexTarget {
            exchange: rabbitmq.exchange().to_owned(),
            routing_key: rabbitmq.routing_key().to_owned(),
        },
    ));

    let cache = RedisPlaceCache::connect(redis.url(), redis.pool_size())
        .await
        .map_err(|err| std::io::Error::other(format!("connect cache: {err}")))?;
    info!(pool_size = redis.pool_size(), "place cache pool ready");

    let categories = seed_categories()?;
    info!(count = categories.len(), "seeded place categories");

    Ok(Adapters {
        broker,
        publisher,
        places: Arc::new(InMemoryPlaceRepository::new()),
        categories: Arc::new(InMemoryCategoryRepository::with_categories(categories)),
        cache: Arc::new(cache),
        indexer: Arc::new(LoggingPlaceIndexer::new()),
    })
}

/// Build the shared HTTP state around a [`PlaceService`] and a
/// [`CategoryService`].
pub fn build_http_state(
    adapters: &Adapters,
    reindex_metrics: Arc<dyn ReindexMetrics>,
    reindex_timeout: Duration,
    request_timeout: Duration,
) -> HttpState {
    let service = Arc::new(
        PlaceService::new(
            PlaceServicePorts {
                places: Arc::clone(&adapters.places) as Arc<dyn PlaceRepository>,
                categories: adapters.categories.clone(),
                cache: Arc::clone(&adapters.cache),
                reindex: adapters.publisher.clone(),
            },
            Arc::new(DefaultClock),
        )
        .with_metrics(reindex_metrics)
        .with_reindex_timeout(reindex_timeout),
    );
    let categories = Arc::new(CategoryService::new(adapters.categories.clone()));
    HttpState::new(HttpStatePorts {
        places: service.clone(),
        places_query: service,
        categories,
    })
    .with_request_timeout(request_timeout)
}

/// Build the consumer's handler over the same repository the API writes to.
pub fn build_reindex_handler(adapters: &Adapters) -> ReindexHandler {
    ReindexHandler::new(
        Arc::clone(&adapters.places) as Arc<dyn PlaceRepository>,
        Arc::clone(&adapters.indexer),
    )
}

/// Topology and consume-loop options from the broker settings.
pub fn consumer_settings(rabbitmq: &RabbitMqSettings) -> (ReindexTopology, ConsumerOptions) {
    (
        ReindexTopology {
            exchange: rabbitmq.exchange().to_owned(),
            queue: rabbitmq.queue().to_owned(),
            routing_key: rabbitmq.routing_key().to_owned(),
        },
        ConsumerOptions {
            consumer_tag: rabbitmq.consumer_tag().to_owned(),
            prefetch: rabbitmq.consumer_prefetch(),
            workers: rabbitmq.consumer_workers(),
        },
    )
}
