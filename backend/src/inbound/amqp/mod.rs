//! AMQP inbound adapter consuming reindex requests.
//!
//! [`ReindexConsumer`] declares the reindex topology (durable direct
//! exchange, durable queue, binding), then consumes the queue with a
//! bounded number of concurrent workers. Each delivery is handed to the
//! domain [`ReindexHandler`] and settled according to the returned
//! [`ConsumerAction`].

use futures_util::StreamExt;
use lapin::message::Delivery;
use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, BasicNackOptions, BasicQosOptions,
    ExchangeDeclareOptions, QueueBindOptions, QueueDeclareOptions,
};
use lapin::types::FieldTable;
use lapin::{Channel, Connection, ConnectionProperties, ExchangeKind};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::{ConsumerAction, ReindexDelivery, ReindexHandler};

const REPLY_SUCCESS: u16 = 200;

/// Errors raised while setting up or running the consumer.
#[derive(Debug, Error)]
pub enum ConsumerError {
    /// The broker connection or channel could not be opened.
    #[error("broker connection failed: {0}")]
    Connection(#[source] lapin::Error),
    /// Declaring the exchange, queue, or binding failed.
    #[error("declaring reindex topology failed: {0}")]
    Topology(#[source] lapin::Error),
    /// Registering the consumer failed.
    #[error("starting consumer failed: {0}")]
    Consume(#[source] lapin::Error),
}

/// Names of the broker objects carrying reindex requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReindexTopology {
    /// Durable direct exchange receiving reindex requests.
    pub exchange: String,
    /// Durable queue the consumer reads.
    pub queue: String,
    /// Key binding the queue to the exchange.
    pub routing_key: String,
}

/// Process knobs for the consume loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerOptions {
    /// Tag identifying this consumer to the broker.
    pub consumer_tag: String,
    /// Unacknowledged deliveries the broker may push ahead of the workers.
    pub prefetch: u16,
    /// Deliveries processed concurrently.
    pub workers: usize,
}

/// How a delivery is settled with the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Settlement {
    Ack,
    Nack { requeue: bool },
}

impl From<ConsumerAction> for Settlement {
    fn from(value: ConsumerAction) -> Self {
        match value {
            ConsumerAction::Ack => Self::Ack,
            ConsumerAction::NackRequeue => Self::Nack { requeue: true },
            ConsumerAction::NackDiscard => Self::Nack { requeue: false },
        }
    }
}

/// Declare the durable exchange and queue and bind them.
///
/// Idempotent: declaring objects that already exist with the same
/// arguments succeeds.
pub async fn declare_topology(
    channel: &Channel,
    topology: &ReindexTopology,
) -> Result<(), ConsumerError> {
    channel
        .exchange_declare(
            &topology.exchange,
            ExchangeKind::Direct,
            ExchangeDeclareOptions {
                durable: true,
                ..ExchangeDeclareOptions::default()
            },
            FieldTable::default(),
        )
        .await
        .map_err(ConsumerError::Topology)?;
    channel
        .queue_declare(
            &topology.queue,
            QueueDeclareOptions {
                durable: true,
                ..QueueDeclareOptions::default()
            },
            FieldTable::default(),
        )
        .await
        .map_err(ConsumerError::Topology)?;
    channel
        .queue_bind(
            &topology.queue,
            &topology.exchange,
            &topology.routing_key,
            QueueBindOptions::default(),
            FieldTable::default(),
        )
        .await
        .map_err(ConsumerError::Topology)?;
    debug!(
        exchange = %topology.exchange,
        queue = %topology.queue,
        routing_key = %topology.routing_key,
        "reindex topology declared"
    );
    Ok(())
}

/// Consumes the reindex queue until shut down.
pub struct ReindexConsumer {
    connection: Connection,
    channel: Channel,
    topology: ReindexTopology,
    options: ConsumerOptions,
    handler: ReindexHandler,
}

impl ReindexConsumer {
    /// Connect, declare the topology, and apply the prefetch limit.
    pub async fn connect(
        uri: &str,
        topology: ReindexTopology,
        options: ConsumerOptions,
        handler: ReindexHandler,
    ) -> Result<Self, ConsumerError> {
        let connection = Connection::connect(uri, ConnectionProperties::default())
            .await
            .map_err(ConsumerError::Connection)?;
        let channel = connection
            .create_channel()
            .await
            .map_err(ConsumerError::Connection)?;
        declare_topology(&channel, &topology).await?;
        channel
            .basic_qos(options.prefetch, BasicQosOptions::default())
            .await
            .map_err(ConsumerError::Consume)?;
        Ok(Self {
            connection,
            channel,
            topology,
            options,
            handler,
        })
    }

    /// Process deliveries until `shutdown` is cancelled or the broker
    /// closes the consumer, then close the channel.
    ///
    /// Deliveries in flight when shutdown begins finish and are settled;
    /// the broker redelivers anything prefetched but not yet started.
    pub async fn run(self, shutdown: CancellationToken) -> Result<(), ConsumerError> {
        let consumer = self
            .channel
            .basic_consume(
                &self.topology.queue,
                &self.options.consumer_tag,
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(ConsumerError::Consume)?;
        info!(
            queue = %self.topology.queue,
            consumer_tag = %self.options.consumer_tag,
            workers = self.options.workers,
            prefetch = self.options.prefetch,
            "reindex consumer started"
        );

        let handler = &self.handler;
        consumer
            .take_until(shutdown.cancelled())
            .for_each_concurrent(self.options.workers.max(1), |delivery| async move {
                match delivery {
                    Ok(delivery) => process(handler, delivery).await,
                    Err(error) => warn!(%error, "reindex consumer stream error"),
                }
            })
            .await;

        info!("reindex consumer stopping");
        if self.channel.status().connected() {
            self.channel
                .close(REPLY_SUCCESS, "shutdown")
                .await
                .map_err(ConsumerError::Connection)?;
        }
        if self.connection.status().connected() {
            self.connection
                .close(REPLY_SUCCESS, "shutdown")
                .await
                .map_err(ConsumerError::Connection)?;
        }
        Ok(())
    }
}

async fn process(handler: &ReindexHandler, delivery: Delivery) {
    let message = ReindexDelivery {
        body: delivery.data.clone(),
        redelivered: delivery.redelivered,
    };
    let settlement = Settlement::from(handler.handle(&message).await);
    let result = match settlement {
        Settlement::Ack => delivery.acker.ack(BasicAckOptions::default()).await,
        Settlement::Nack { requeue } => {
            delivery
                .acker
                .nack(BasicNackOptions {
                    requeue,
                    ..BasicNackOptions::default()
                })
                .await
        }
    };
    if let Err(error) = result {
        warn!(
            delivery_tag = delivery.delivery_tag,
            ?settlement,
            %error,
            "failed to settle reindex delivery"
        );
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(ConsumerAction::Ack, Settlement::Ack)]
    #[case(ConsumerAction::NackRequeue, Settlement::Nack { requeue: true })]
    #[case(ConsumerAction::NackDiscard, Settlement::Nack { requeue: false })]
    fn actions_map_to_broker_settlements(
        #[case] action: ConsumerAction,
        #[case] expected: Settlement,
    ) {
        assert_eq!(Settlement::from(action), expected);
    }
}
