//! Broker-confirmed reindex publisher.
//!
//! [`ReindexPublisher`] implements the `ReindexQueue` port on top of any
//! [`BrokerChannel`]. Each call publishes the place identifier as a
//! persistent, mandatory, plain-text message tagged with a fresh
//! correlation identifier, then blocks until the broker confirms, returns,
//! or rejects that exact message, or until the caller's context ends.

mod correlation;
mod dispatcher;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub use self::correlation::CorrelationId;
use self::dispatcher::{PublishOutcome, WaiterRegistry, dispatch};
use crate::domain::ports::{ReindexError, ReindexQueue};
use crate::domain::{EntityId, RequestContext};
use crate::outbound::broker::{BrokerChannel, OutboundMessage};

/// MIME type of reindex message bodies.
pub const REINDEX_CONTENT_TYPE: &str = "text/plain";

/// Where reindex messages are published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReindexTarget {
    /// Exchange receiving reindex requests.
    pub exchange: String,
    /// Routing key binding the reindex queue.
    pub routing_key: String,
}

/// Publishes reindex requests and waits for the broker's verdict.
///
/// Construct inside a Tokio runtime: `new` spawns the notification
/// dispatcher, which stops when the publisher is dropped.
pub struct ReindexPublisher {
    channel: Arc<dyn BrokerChannel>,
    target: ReindexTarget,
    registry: Arc<WaiterRegistry>,
    dispatcher: JoinHandle<()>,
}

impl ReindexPublisher {
    /// Subscribe to `channel`'s notification streams and start dispatching.
    pub fn new(channel: Arc<dyn BrokerChannel>, target: ReindexTarget) -> Self {
        let registry = Arc::new(WaiterRegistry::default());
        let dispatcher = tokio::spawn(dispatch(
            Arc::clone(&registry),
            channel.notify_return(),
            channel.notify_publish(),
        ));
        Self {
            channel,
            target,
            registry,
            dispatcher,
        }
    }

    /// Number of publishes currently awaiting a broker verdict.
    pub fn pending(&self) -> usize {
        self.registry.pending()
    }

    fn message(&self, id: &EntityId, correlation_id: &CorrelationId) -> OutboundMessage {
        OutboundMessage {
            exchange: self.target.exchange.clone(),
            routing_key: self.target.routing_key.clone(),
            body: id.to_string().into_bytes(),
            content_type: REINDEX_CONTENT_TYPE.to_owned(),
            correlation_id: correlation_id.to_string(),
            persistent: true,
            mandatory: true,
        }
    }
}

impl Drop for ReindexPublisher {
    fn drop(&mut self) {
        self.dispatcher.abort();
    }
}

fn outcome_to_result(
    correlation_id: &CorrelationId,
    outcome: Option<PublishOutcome>,
) -> Result<(), ReindexError> {
    match outcome {
        Some(PublishOutcome::Confirmed) => Ok(()),
        Some(PublishOutcome::Returned(returned)) => Err(ReindexError::routing_failure(
            correlation_id.as_str(),
            returned.reply_code,
            returned.reply_text,
            returned.exchange,
            returned.routing_key,
        )),
        Some(PublishOutcome::Rejected {
            delivery_tag,
            reconnection_count,
        }) => Err(ReindexError::broker_rejected(delivery_tag, reconnection_count)),
        None => Err(ReindexError::publish("notification streams closed")),
    }
}

#[async_trait]
impl ReindexQueue for ReindexPublisher {
    async fn publish_reindex(
        &self,
        ctx: &RequestContext,
        id: &EntityId,
    ) -> Result<(), ReindexError> {
        if id.is_nil() {
            return Err(ReindexError::invalid_id());
        }
        if let Some(reason) = ctx.err() {
            return Err(ReindexError::cancelled(reason));
        }

        let correlation_id = CorrelationId::generate();
        let mut waiter = self
            .registry
            .register(correlation_id.clone())
            .ok_or_else(|| ReindexError::publish("notification streams closed"))?;

        let published = tokio::select! {
            biased;
            reason = ctx.done() => {
                debug!(place_id = %id, %correlation_id, %reason, "reindex publish abandoned");
                return Err(ReindexError::cancelled(reason));
            }
            published = self.channel.publish(self.message(id, &correlation_id)) => published,
        };
        let delivery_tag = published.map_err(|err| {
            warn!(place_id = %id, %correlation_id, error = %err, "reindex publish failed");
            ReindexError::publish(err.to_string())
        })?;
        debug!(place_id = %id, %correlation_id, delivery_tag, "awaiting reindex confirmation");

        tokio::select! {
            biased;
            reason = ctx.done() => {
                debug!(place_id = %id, %correlation_id, %reason, "stopped waiting for reindex confirmation");
                Err(ReindexError::cancelled(reason))
            }
            outcome = waiter.outcome() => outcome_to_result(&correlation_id, outcome),
        }
    }
}
