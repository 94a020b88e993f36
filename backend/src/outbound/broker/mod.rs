//! Broker channel abstraction used by the reindex publisher.
//!
//! A [`BrokerChannel`] publishes messages and exposes two connection-wide
//! notification streams: messages the broker could not route, and publisher
//! confirmations. Every subscriber sees every notification; demultiplexing
//! to individual publishes is the publisher's job.

mod lapin_channel;

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

pub use lapin_channel::LapinBrokerChannel;

/// Channel-scoped sequence number the broker assigns to each publish.
pub type DeliveryTag = u64;

/// Failures handing a message to the broker connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BrokerError {
    /// The connection or channel could not be (re)established.
    #[error("broker connection failed: {message}")]
    Connection { message: String },
    /// The channel refused the publish frame.
    #[error("broker publish failed: {message}")]
    Publish { message: String },
}

impl BrokerError {
    /// Convenience constructor for [`BrokerError::Connection`].
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Convenience constructor for [`BrokerError::Publish`].
    pub fn publish(message: impl Into<String>) -> Self {
        Self::Publish {
            message: message.into(),
        }
    }
}

/// A message ready to publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Target exchange.
    pub exchange: String,
    /// Routing key used by the exchange.
    pub routing_key: String,
    /// Raw payload.
    pub body: Vec<u8>,
    /// MIME type advertised in the message properties.
    pub content_type: String,
    /// Correlation identifier echoed back in notifications.
    pub correlation_id: String,
    /// Whether the broker must persist the message to disk.
    pub persistent: bool,
    /// Whether the broker must return the message when it cannot route it.
    pub mandatory: bool,
}

/// A mandatory message the broker could not route to any queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnNotification {
    /// Correlation identifier of the returned message; empty when absent.
    pub correlation_id: String,
    /// AMQP reply code, e.g. 312 `NO_ROUTE`.
    pub reply_code: u16,
    /// Broker-supplied reply text.
    pub reply_text: String,
    /// Exchange the message was published to.
    pub exchange: String,
    /// Routing key the message was published with.
    pub routing_key: String,
}

/// The broker's verdict on one publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmNotification {
    /// Correlation identifier of the confirmed publish.
    pub correlation_id: String,
    /// Delivery tag of the confirmed publish.
    pub delivery_tag: DeliveryTag,
    /// `true` for `basic.ack`, `false` for `basic.nack`.
    pub ack: bool,
    /// How many times the channel had been re-opened when it published.
    pub reconnection_count: u32,
}

/// Publish side of a broker connection in confirm mode.
#[async_trait]
pub trait BrokerChannel: Send + Sync {
    /// Hand `message` to the broker and return its delivery tag.
    ///
    /// Success means the frame was written, not that the broker accepted
    /// it; the verdict arrives on the notification streams.
    async fn publish(&self, message: OutboundMessage) -> Result<DeliveryTag, BrokerError>;

    /// Subscribe to returned (unroutable) messages.
    fn notify_return(&self) -> mpsc::UnboundedReceiver<ReturnNotification>;

    /// Subscribe to publisher confirmations.
    fn notify_publish(&self) -> mpsc::UnboundedReceiver<ConfirmNotification>;
}

/// Fan-out list of notification subscribers.
///
/// Closed receivers are pruned on the next emit.
#[derive(Debug)]
pub(crate) struct Subscribers<T> {
    senders: Mutex<Vec<mpsc::UnboundedSender<T>>>,
}

impl<T> Default for Subscribers<T> {
    fn default() -> Self {
        Self {
            senders: Mutex::new(Vec::new()),
        }
    }
}

impl<T: Clone> Subscribers<T> {
    pub(crate) fn subscribe(&self) -> mpsc::UnboundedReceiver<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().push(tx);
        rx
    }

    pub(crate) fn emit(&self, notification: &T) {
        self.lock()
            .retain(|sender| sender.send(notification.clone()).is_ok());
    }

    /// Drop every sender so subscribers observe the end of the stream.
    pub(crate) fn close(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<mpsc::UnboundedSender<T>>> {
        self.senders.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
