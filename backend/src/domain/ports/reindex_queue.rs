//! Domain port for requesting a search reindex of a place.
//!
//! Adapters publish the identifier to a broker and wait for the broker's
//! verdict, so a successful return means the message was routed and
//! accepted, not merely written to a socket.

use async_trait::async_trait;

use crate::domain::{ContextError, EntityId, RequestContext};

use super::define_port_error;

define_port_error! {
    /// Outcome failures of a reindex publish.
    pub enum ReindexError {
        /// The nil identifier cannot be reindexed.
        InvalidId => "cannot publish reindex for the nil identifier",
        /// Handing the message to the broker connection failed.
        Publish { message: String } => "reindex publish failed: {message}",
        /// The broker could not route the message to any queue.
        RoutingFailure {
            correlation_id: String,
            reply_code: u16,
            reply_text: String,
            exchange: String,
            routing_key: String,
        } => "publish {correlation_id} returned: reply code {reply_code}, reply text {reply_text}, exchange {exchange}, routing key {routing_key}",
        /// The broker negatively acknowledged the message.
        BrokerRejected { delivery_tag: u64, reconnection_count: u32 } =>
            "publish {delivery_tag} was not acknowledged, reconnection: {reconnection_count}",
        /// The caller's context ended before the broker answered.
        Cancelled { reason: ContextError } => "reindex publish abandoned: {reason}",
    }
}

impl ReindexError {
    /// Return `true` when the caller gave up waiting.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Return `true` when publishing again with a fresh correlation ID may succeed.
    ///
    /// Routing failures and invalid identifiers are deterministic; broker
    /// rejections, connection failures, and timeouts are transient.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Publish { .. } | Self::BrokerRejected { .. } | Self::Cancelled { .. }
        )
    }
}

/// Port for triggering out-of-band reindexing of a place.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReindexQueue: Send + Sync {
    /// Publish `id` and wait until the broker confirms, returns, or rejects it.
    async fn publish_reindex(
        &self,
        ctx: &RequestContext,
        id: &EntityId,
    ) -> Result<(), ReindexError>;
}
