//! Fan-out of broker notifications to the publishes waiting on them.
//!
//! One dispatcher task per broker channel reads the shared return and
//! confirm streams and hands each notification to the waiter registered
//! under its correlation identifier. Waiters register before publishing
//! and deregister when dropped, so an abandoned publish leaves nothing
//! behind and its late notification is simply discarded.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use super::CorrelationId;
use crate::outbound::broker::{ConfirmNotification, DeliveryTag, ReturnNotification};

/// Final broker verdict on one publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum PublishOutcome {
    /// The broker routed and accepted the message.
    Confirmed,
    /// The broker could not route the message.
    Returned(ReturnNotification),
    /// The broker negatively acknowledged the message.
    Rejected {
        delivery_tag: DeliveryTag,
        reconnection_count: u32,
    },
}

#[derive(Default)]
struct RegistryState {
    waiters: HashMap<CorrelationId, oneshot::Sender<PublishOutcome>>,
    closed: bool,
}

/// Map of in-flight publishes keyed by correlation identifier.
#[derive(Default)]
pub(super) struct WaiterRegistry {
    state: Mutex<RegistryState>,
}

impl WaiterRegistry {
    /// Register interest in `id`; `None` once the dispatcher has stopped.
    pub(super) fn register(self: &Arc<Self>, id: CorrelationId) -> Option<Waiter> {
        let (sender, receiver) = oneshot::channel();
        {
            let mut state = self.lock();
            if state.closed {
                return None;
            }
            state.waiters.insert(id.clone(), sender);
        }
        Some(Waiter {
            receiver,
            _registration: Registration {
                registry: Arc::clone(self),
                id,
            },
        })
    }

    /// Number of publishes still awaiting a verdict.
    pub(super) fn pending(&self) -> usize {
        self.lock().waiters.len()
    }

    fn deliver(&self, id: &str, outcome: PublishOutcome) {
        let sender = self.lock().waiters.remove(id);
        match sender {
            Some(sender) => {
                if sender.send(outcome).is_err() {
                    debug!(correlation_id = id, "waiter went away before delivery");
                }
            }
            None => {
                debug!(
                    correlation_id = id,
                    ?outcome,
                    "dropping notification for an unknown or abandoned publish"
                );
            }
        }
    }

    fn deregister(&self, id: &str) {
        self.lock().waiters.remove(id);
    }

    /// Refuse new waiters and wake every pending one with a closed slot.
    fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        state.waiters.clear();
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Removes the registry entry when the waiter is dropped.
struct Registration {
    registry: Arc<WaiterRegistry>,
    id: CorrelationId,
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.registry.deregister(self.id.as_str());
    }
}

/// Single-slot receiver for one publish's verdict.
pub(super) struct Waiter {
    receiver: oneshot::Receiver<PublishOutcome>,
    _registration: Registration,
}

impl Waiter {
    /// Wait for the verdict; `None` when the notification streams closed.
    pub(super) async fn outcome(&mut self) -> Option<PublishOutcome> {
        (&mut self.receiver).await.ok()
    }
}

/// Route notifications to waiters until both streams close.
pub(super) async fn dispatch(
    registry: Arc<WaiterRegistry>,
    mut returns: mpsc::UnboundedReceiver<ReturnNotification>,
    mut confirms: mpsc::UnboundedReceiver<ConfirmNotification>,
) {
    let mut returns_open = true;
    let mut confirms_open = true;

    loop {
        tokio::select! {
            biased;
            returned = returns.recv(), if returns_open => match returned {
                Some(notification) => deliver_return(&registry, notification),
                None => returns_open = false,
            },
            confirmed = confirms.recv(), if confirms_open => match confirmed {
                Some(notification) => {
                    // A return always precedes the ack of the same publish.
                    while let Ok(notification) = returns.try_recv() {
                        deliver_return(&registry, notification);
                    }
                    deliver_confirm(&registry, notification);
                }
                None => confirms_open = false,
            },
            else => break,
        }
    }

    registry.close();
    debug!("reindex notification streams closed; dispatcher stopped");
}

fn deliver_return(registry: &WaiterRegistry, notification: ReturnNotification) {
    let id = notification.correlation_id.clone();
    registry.deliver(&id, PublishOutcome::Returned(notification));
}

fn deliver_confirm(registry: &WaiterRegistry, notification: ConfirmNotification) {
    let outcome = if notification.ack {
        PublishOutcome::Confirmed
    } else {
        PublishOutcome::Rejected {
            delivery_tag: notification.delivery_tag,
            reconnection_count: notification.reconnection_count,
        }
    };
    registry.deliver(&notification.correlation_id, outcome);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn confirm(id: &CorrelationId, ack: bool) -> ConfirmNotification {
        ConfirmNotification {
            correlation_id: id.to_string(),
            delivery_tag: 3,
            ack,
            reconnection_count: 1,
        }
    }

    fn returned(id: &CorrelationId) -> ReturnNotification {
        ReturnNotification {
            correlation_id: id.to_string(),
            reply_code: 312,
            reply_text: "NO_ROUTE".to_owned(),
            exchange: "reindex".to_owned(),
            routing_key: "place".to_owned(),
        }
    }

    #[rstest]
    fn dropping_a_waiter_deregisters_it() {
        let registry = Arc::new(WaiterRegistry::default());
        let waiter = registry
            .register(CorrelationId::generate())
            .expect("registry open");
        assert_eq!(registry.pending(), 1);

        drop(waiter);
        assert_eq!(registry.pending(), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn return_queued_before_ack_wins() {
        let registry = Arc::new(WaiterRegistry::default());
        let id = CorrelationId::generate();
        let mut waiter = registry.register(id.clone()).expect("registry open");
        let (return_tx, return_rx) = mpsc::unbounded_channel();
        let (confirm_tx, confirm_rx) = mpsc::unbounded_channel();

        confirm_tx.send(confirm(&id, true)).expect("send confirm");
        return_tx.send(returned(&id)).expect("send return");
        drop((return_tx, confirm_tx));

        dispatch(Arc::clone(&registry), return_rx, confirm_rx).await;
        assert_eq!(
            waiter.outcome().await,
            Some(PublishOutcome::Returned(returned(&id)))
        );
    }

    #[rstest]
    #[tokio::test]
    async fn negative_ack_becomes_rejection() {
        let registry = Arc::new(WaiterRegistry::default());
        let id = CorrelationId::generate();
        let mut waiter = registry.register(id.clone()).expect("registry open");
        let (return_tx, return_rx) = mpsc::unbounded_channel::<ReturnNotification>();
        let (confirm_tx, confirm_rx) = mpsc::unbounded_channel();

        confirm_tx.send(confirm(&id, false)).expect("send confirm");
        drop((return_tx, confirm_tx));

        dispatch(Arc::clone(&registry), return_rx, confirm_rx).await;
        assert_eq!(
            waiter.outcome().await,
            Some(PublishOutcome::Rejected {
                delivery_tag: 3,
                reconnection_count: 1,
            })
        );
    }

    #[rstest]
    #[tokio::test]
    async fn closed_streams_release_waiters_and_refuse_new_ones() {
        let registry = Arc::new(WaiterRegistry::default());
        let mut waiter = registry
            .register(CorrelationId::generate())
            .expect("registry open");
        let (_, return_rx) = mpsc::unbounded_channel::<ReturnNotification>();
        let (_, confirm_rx) = mpsc::unbounded_channel::<ConfirmNotification>();

        dispatch(Arc::clone(&registry), return_rx, confirm_rx).await;

        assert_eq!(waiter.outcome().await, None);
        assert!(registry.register(CorrelationId::generate()).is_none());
    }
}
