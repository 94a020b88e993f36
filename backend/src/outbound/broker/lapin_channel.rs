//! lapin-backed [`BrokerChannel`] running in publisher-confirm mode.
//!
//! Publishes are serialised behind an async mutex so the locally counted
//! delivery tags follow the channel's confirm sequence. Each publish
//! spawns a task awaiting its confirmation, which emits the returned
//! message (if any) before the confirmation itself.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use lapin::message::BasicReturnMessage;
use lapin::options::{BasicPublishOptions, ConfirmSelectOptions};
use lapin::publisher_confirm::{Confirmation, PublisherConfirm};
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties};
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, warn};

use super::{
    BrokerChannel, BrokerError, ConfirmNotification, DeliveryTag, OutboundMessage,
    ReturnNotification, Subscribers,
};

const TRANSIENT_DELIVERY_MODE: u8 = 1;
const PERSISTENT_DELIVERY_MODE: u8 = 2;
const REPLY_SUCCESS: u16 = 200;

struct ChannelState {
    connection: Option<Connection>,
    channel: Option<Channel>,
    next_delivery_tag: DeliveryTag,
    reconnections: u32,
}

/// Sequence position of one publish on the current channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PublishStamp {
    delivery_tag: DeliveryTag,
    reconnection_count: u32,
}

impl ChannelState {
    /// Claim the next delivery tag together with the channel generation it
    /// belongs to.
    fn stamp(&mut self) -> PublishStamp {
        self.next_delivery_tag += 1;
        PublishStamp {
            delivery_tag: self.next_delivery_tag,
            reconnection_count: self.reconnections,
        }
    }

    /// Start a new channel generation; delivery tags restart at 1.
    fn reopened(&mut self) -> u32 {
        self.next_delivery_tag = 0;
        self.reconnections += 1;
        self.reconnections
    }
}

/// Broker channel over a single lapin connection.
pub struct LapinBrokerChannel {
    uri: String,
    state: Mutex<ChannelState>,
    returns: Arc<Subscribers<ReturnNotification>>,
    confirms: Arc<Subscribers<ConfirmNotification>>,
    reconnections: AtomicU32,
}

impl LapinBrokerChannel {
    /// Connect to `uri` and put a fresh channel into confirm mode.
    pub async fn connect(uri: impl Into<String>) -> Result<Self, BrokerError> {
        let uri = uri.into();
        let (connection, channel) = open(&uri).await?;
        info!("broker channel opened in confirm mode");
        Ok(Self {
            uri,
            state: Mutex::new(ChannelState {
                connection: Some(connection),
                channel: Some(channel),
                next_delivery_tag: 0,
                reconnections: 0,
            }),
            returns: Arc::new(Subscribers::default()),
            confirms: Arc::new(Subscribers::default()),
            reconnections: AtomicU32::new(0),
        })
    }

    /// Number of times the channel has been re-opened since connecting.
    pub fn reconnection_count(&self) -> u32 {
        self.reconnections.load(Ordering::SeqCst)
    }

    /// Close the channel and connection and end every notification stream.
    pub async fn close(&self) -> Result<(), BrokerError> {
        let mut state = self.state.lock().await;
        let channel = state.channel.take();
        let connection = state.connection.take();
        self.returns.close();
        self.confirms.close();

        if let Some(channel) = channel.filter(|channel| channel.status().connected()) {
            channel
                .close(REPLY_SUCCESS, "shutdown")
                .await
                .map_err(|err| BrokerError::connection(err.to_string()))?;
        }
        if let Some(connection) = connection.filter(|conn| conn.status().connected()) {
            connection
                .close(REPLY_SUCCESS, "shutdown")
                .await
                .map_err(|err| BrokerError::connection(err.to_string()))?;
        }
        Ok(())
    }

    /// Return the open channel, re-opening the connection when it dropped.
    async fn ready_channel(&self, state: &mut ChannelState) -> Result<Channel, BrokerError> {
        if let Some(channel) = state
            .channel
            .as_ref()
            .filter(|channel| channel.status().connected())
        {
            return Ok(channel.clone());
        }

        warn!("broker channel is closed; reconnecting");
        let (connection, channel) = open(&self.uri).await?;
        state.connection = Some(connection);
        state.channel = Some(channel.clone());
        let reconnection = state.reopened();
        self.reconnections.store(reconnection, Ordering::SeqCst);
        info!(reconnection, "broker channel re-opened");
        Ok(channel)
    }
}

#[async_trait]
impl BrokerChannel for LapinBrokerChannel {
    async fn publish(&self, message: OutboundMessage) -> Result<DeliveryTag, BrokerError> {
        let mut state = self.state.lock().await;
        let channel = self.ready_channel(&mut state).await?;

        let confirm = channel
            .basic_publish(
                &message.exchange,
                &message.routing_key,
                BasicPublishOptions {
                    mandatory: message.mandatory,
                    ..BasicPublishOptions::default()
                },
                &message.body,
                message_properties(&message),
            )
            .await
            .map_err(|err| BrokerError::publish(err.to_string()))?;

        let PublishStamp {
            delivery_tag,
            reconnection_count,
        } = state.stamp();
        drop(state);

        debug!(
            correlation_id = %message.correlation_id,
            delivery_tag,
            exchange = %message.exchange,
            routing_key = %message.routing_key,
            "message handed to broker"
        );

        let pending = PendingConfirm {
            correlation_id: message.correlation_id,
            delivery_tag,
            reconnection_count,
            returns: Arc::clone(&self.returns),
            confirms: Arc::clone(&self.confirms),
        };
        tokio::spawn(pending.settle(confirm));
        Ok(delivery_tag)
    }

    fn notify_return(&self) -> mpsc::UnboundedReceiver<ReturnNotification> {
        self.returns.subscribe()
    }

    fn notify_publish(&self) -> mpsc::UnboundedReceiver<ConfirmNotification> {
        self.confirms.subscribe()
    }
}

async fn open(uri: &str) -> Result<(Connection, Channel), BrokerError> {
    let connection = Connection::connect(uri, ConnectionProperties::default())
        .await
        .map_err(|err| BrokerError::connection(err.to_string()))?;
    let channel = connection
        .create_channel()
        .await
        .map_err(|err| BrokerError::connection(err.to_string()))?;
    channel
        .confirm_select(ConfirmSelectOptions::default())
        .await
        .map_err(|err| BrokerError::connection(err.to_string()))?;
    Ok((connection, channel))
}

fn message_properties(message: &OutboundMessage) -> BasicProperties {
    let delivery_mode = if message.persistent {
        PERSISTENT_DELIVERY_MODE
    } else {
        TRANSIENT_DELIVERY_MODE
    };
    BasicProperties::default()
        .with_content_type(message.content_type.clone().into())
        .with_correlation_id(message.correlation_id.clone().into())
        .with_delivery_mode(delivery_mode)
}

fn return_notification(returned: &BasicReturnMessage, fallback: &str) -> ReturnNotification {
    let correlation_id = returned
        .delivery
        .properties
        .correlation_id()
        .as_ref()
        .map_or_else(|| fallback.to_owned(), |id| id.as_str().to_owned());
    ReturnNotification {
        correlation_id,
        reply_code: returned.reply_code,
        reply_text: returned.reply_text.as_str().to_owned(),
        exchange: returned.delivery.exchange.as_str().to_owned(),
        routing_key: returned.delivery.routing_key.as_str().to_owned(),
    }
}

/// Everything needed to report one publish's confirmation.
struct PendingConfirm {
    correlation_id: String,
    delivery_tag: DeliveryTag,
    reconnection_count: u32,
    returns: Arc<Subscribers<ReturnNotification>>,
    confirms: Arc<Subscribers<ConfirmNotification>>,
}

impl PendingConfirm {
    async fn settle(self, confirm: PublisherConfirm) {
        let (ack, returned) = match confirm.await {
            Ok(Confirmation::Ack(returned)) => (true, returned),
            Ok(Confirmation::Nack(returned)) => (false, returned),
            Ok(Confirmation::NotRequested) => {
                warn!(
                    delivery_tag = self.delivery_tag,
                    "channel not in confirm mode; treating publish as acknowledged"
                );
                (true, None)
            }
            Err(error) => {
                warn!(
                    delivery_tag = self.delivery_tag,
                    %error,
                    "publisher confirm lost; reporting as not acknowledged"
                );
                (false, None)
            }
        };

        if let Some(returned) = returned {
            self.returns
                .emit(&return_notification(&returned, &self.correlation_id));
        }
        self.confirms.emit(&ConfirmNotification {
            correlation_id: self.correlation_id,
            delivery_tag: self.delivery_tag,
            ack,
            reconnection_count: self.reconnection_count,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn message(persistent: bool) -> OutboundMessage {
        OutboundMessage {
            exchange: "reindex".to_owned(),
            routing_key: "place".to_owned(),
            body: b"id".to_vec(),
            content_type: "text/plain".to_owned(),
            correlation_id: "corr-1".to_owned(),
            persistent,
            mandatory: true,
        }
    }

    fn detached_state() -> ChannelState {
        ChannelState {
            connection: None,
            channel: None,
            next_delivery_tag: 0,
            reconnections: 0,
        }
    }

    #[rstest]
    fn stamps_follow_the_channel_generation() {
        let mut state = detached_state();
        assert_eq!(
            state.stamp(),
            PublishStamp {
                delivery_tag: 1,
                reconnection_count: 0
            }
        );
        assert_eq!(state.stamp().delivery_tag, 2);

        assert_eq!(state.reopened(), 1);
        assert_eq!(
            state.stamp(),
            PublishStamp {
                delivery_tag: 1,
                reconnection_count: 1
            }
        );
    }

    #[rstest]
    #[case(true, PERSISTENT_DELIVERY_MODE)]
    #[case(false, TRANSIENT_DELIVERY_MODE)]
    fn properties_carry_delivery_mode(#[case] persistent: bool, #[case] expected: u8) {
        let properties = message_properties(&message(persistent));
        assert_eq!(*properties.delivery_mode(), Some(expected));
    }

    #[rstest]
    fn properties_carry_correlation_and_content_type() {
        let properties = message_properties(&message(true));
        assert_eq!(
            properties.correlation_id().as_ref().map(|id| id.as_str()),
            Some("corr-1")
        );
        assert_eq!(
            properties.content_type().as_ref().map(|ct| ct.as_str()),
            Some("text/plain")
        );
    }
}
