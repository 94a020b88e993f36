//! Settlement decisions for consumed reindex messages.
//!
//! The handler turns one delivery into a [`ConsumerAction`]; the AMQP
//! adapter owns acknowledging it with the broker. Keeping the decision here
//! lets the retry policy be exercised without a broker.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::EntityId;
use crate::domain::ports::{PlaceIndexer, PlaceRepository, PlaceRepositoryError};

/// How a consumed delivery must be settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerAction {
    /// Processing finished; remove the message from the queue.
    Ack,
    /// Transient failure; return the message to the queue.
    NackRequeue,
    /// The message can never succeed or already failed once; drop it.
    NackDiscard,
}

/// Broker-agnostic view of a consumed reindex message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReindexDelivery {
    /// Raw message body; the place identifier as text.
    pub body: Vec<u8>,
    /// Whether the broker has delivered this message before.
    pub redelivered: bool,
}

impl ReindexDelivery {
    /// Build a first-time delivery carrying `body`.
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self {
            body: body.into(),
            redelivered: false,
        }
    }

    /// Mark the delivery as a redelivery.
    #[must_use]
    pub fn redelivered(mut self) -> Self {
        self.redelivered = true;
        self
    }

    fn place_id(&self) -> Option<EntityId> {
        let text = std::str::from_utf8(&self.body).ok()?;
        let id = EntityId::parse(text.trim()).ok()?;
        (!id.is_nil()).then_some(id)
    }
}

/// Looks up the referenced place and refreshes its index entry.
#[derive(Clone)]
pub struct ReindexHandler {
    places: Arc<dyn PlaceRepository>,
    indexer: Arc<dyn PlaceIndexer>,
}

impl ReindexHandler {
    /// Create a handler over the given repository and indexer.
    pub fn new(places: Arc<dyn PlaceRepository>, indexer: Arc<dyn PlaceIndexer>) -> Self {
        Self { places, indexer }
    }

    /// Process one delivery and decide how to settle it.
    pub async fn handle(&self, delivery: &ReindexDelivery) -> ConsumerAction {
        let Some(id) = delivery.place_id() else {
            warn!(
                body = %String::from_utf8_lossy(&delivery.body),
                "discarding reindex message with malformed place identifier"
            );
            return ConsumerAction::NackDiscard;
        };

        let outcome = match self.places.find(&id).await {
            Ok(place) => {
                debug!(place_id = %id, "forwarding place to search index");
                self.indexer
                    .upsert(&place)
                    .await
                    .map_err(|err| err.to_string())
            }
            Err(PlaceRepositoryError::NotFound { .. }) => {
                debug!(place_id = %id, "place deleted; removing from search index");
                self.indexer.remove(&id).await.map_err(|err| err.to_string())
            }
            Err(err) => Err(err.to_string()),
        };

        match outcome {
            Ok(()) => {
                info!(place_id = %id, "place reindexed");
                ConsumerAction::Ack
            }
            Err(error) if delivery.redelivered => {
                warn!(place_id = %id, %error, "reindex failed on redelivery; discarding");
                ConsumerAction::NackDiscard
            }
            Err(error) => {
                warn!(place_id = %id, %error, "reindex failed; requeueing");
                ConsumerAction::NackRequeue
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rstest::rstest;

    use super::*;
    use crate::domain::ports::{MockPlaceIndexer, MockPlaceRepository, PlaceIndexerError};
    use crate::domain::{Place, PlaceParts};

    fn place(id: EntityId) -> Place {
        Place::new(PlaceParts {
            id,
            name: "Canal Lock".to_owned(),
            description: String::new(),
            category: EntityId::generate(),
            tags: Vec::new(),
            created_at: Utc::now(),
            updated_at: None,
        })
        .expect("valid place")
    }

    fn handler(places: MockPlaceRepository, indexer: MockPlaceIndexer) -> ReindexHandler {
        ReindexHandler::new(Arc::new(places), Arc::new(indexer))
    }

    #[rstest]
    #[case(b"not-an-id".to_vec())]
    #[case(b"00000000-0000-0000-0000-000000000000".to_vec())]
    #[case(vec![0xff, 0xfe])]
    #[tokio::test]
    async fn malformed_bodies_are_discarded(#[case] body: Vec<u8>) {
        let mut places = MockPlaceRepository::new();
        places.expect_find().times(0);
        let indexer = MockPlaceIndexer::new();

        let action = handler(places, indexer)
            .handle(&ReindexDelivery::new(body))
            .await;
        assert_eq!(action, ConsumerAction::NackDiscard);
    }

    #[rstest]
    #[tokio::test]
    async fn existing_place_is_upserted_and_acked() {
        let id = EntityId::generate();
        let mut places = MockPlaceRepository::new();
        places
            .expect_find()
            .withf(move |found| *found == id)
            .returning(move |found| Ok(place(*found)));
        let mut indexer = MockPlaceIndexer::new();
        indexer
            .expect_upsert()
            .withf(move |place| place.id() == id)
            .times(1)
            .returning(|_| Ok(()));
        indexer.expect_remove().times(0);

        let action = handler(places, indexer)
            .handle(&ReindexDelivery::new(id.to_string()))
            .await;
        assert_eq!(action, ConsumerAction::Ack);
    }

    #[rstest]
    #[tokio::test]
    async fn deleted_place_is_removed_and_acked() {
        let id = EntityId::generate();
        let mut places = MockPlaceRepository::new();
        places
            .expect_find()
            .returning(|found| Err(PlaceRepositoryError::not_found(found.to_string())));
        let mut indexer = MockPlaceIndexer::new();
        indexer
            .expect_remove()
            .withf(move |removed| *removed == id)
            .times(1)
            .returning(|_| Ok(()));

        let action = handler(places, indexer)
            .handle(&ReindexDelivery::new(format!(" {id}\n")))
            .await;
        assert_eq!(action, ConsumerAction::Ack);
    }

    #[rstest]
    #[case(false, ConsumerAction::NackRequeue)]
    #[case(true, ConsumerAction::NackDiscard)]
    #[tokio::test]
    async fn transient_failures_requeue_once(
        #[case] redelivered: bool,
        #[case] expected: ConsumerAction,
    ) {
        let id = EntityId::generate();
        let mut places = MockPlaceRepository::new();
        places
            .expect_find()
            .returning(move |found| Ok(place(*found)));
        let mut indexer = MockPlaceIndexer::new();
        indexer
            .expect_upsert()
            .returning(|_| Err(PlaceIndexerError::unavailable("index offline")));

        let mut delivery = ReindexDelivery::new(id.to_string());
        if redelivered {
            delivery = delivery.redelivered();
        }
        let action = handler(places, indexer).handle(&delivery).await;
        assert_eq!(action, expected);
    }

    #[rstest]
    #[tokio::test]
    async fn repository_outage_requeues_first_delivery() {
        let mut places = MockPlaceRepository::new();
        places
            .expect_find()
            .returning(|_| Err(PlaceRepositoryError::connection("refused")));
        let indexer = MockPlaceIndexer::new();

        let action = handler(places, indexer)
            .handle(&ReindexDelivery::new(EntityId::generate().to_string()))
            .await;
        assert_eq!(action, ConsumerAction::NackRequeue);
    }
}
