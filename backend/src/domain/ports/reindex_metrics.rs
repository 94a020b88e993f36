//! Port for counting reindex publish outcomes.
//!
//! Lets the place service report how each broker verdict turned out
//! without depending on a metrics backend.

use async_trait::async_trait;

use super::{ReindexError, define_port_error};

define_port_error! {
    /// Errors exposed when recording reindex metrics.
    pub enum ReindexMetricsError {
        /// Metric exporter rejected the write.
        Export { message: String } => "reindex metrics exporter failed: {message}",
    }
}

/// How one reindex publish ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReindexOutcome {
    /// The broker acknowledged the message.
    Confirmed,
    /// The message was returned as unroutable.
    Returned,
    /// The broker nacked the message.
    Rejected,
    /// The message never reached the broker.
    Failed,
    /// The caller stopped waiting first.
    Cancelled,
}

impl ReindexOutcome {
    /// Classify a publish result.
    pub fn of(result: &Result<(), ReindexError>) -> Self {
        match result {
            Ok(()) => Self::Confirmed,
            Err(ReindexError::RoutingFailure { .. }) => Self::Returned,
            Err(ReindexError::BrokerRejected { .. }) => Self::Rejected,
            Err(ReindexError::Cancelled { .. }) => Self::Cancelled,
            Err(ReindexError::Publish { .. } | ReindexError::InvalidId) => Self::Failed,
        }
    }

    /// Label value used by exporters.
    pub fn as_label(self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Returned => "returned",
            Self::Rejected => "rejected",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Metrics recording port for reindex publishes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReindexMetrics: Send + Sync {
    /// Count one finished publish.
    async fn record(&self, outcome: ReindexOutcome) -> Result<(), ReindexMetricsError>;
}

/// Discards every observation.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpReindexMetrics;

#[async_trait]
impl ReindexMetrics for NoOpReindexMetrics {
    async fn record(&self, _outcome: ReindexOutcome) -> Result<(), ReindexMetricsError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::domain::ContextError;

    #[rstest]
    #[case(Ok(()), ReindexOutcome::Confirmed)]
    #[case(
        Err(ReindexError::routing_failure("c-1", 312_u16, "NO_ROUTE", "reindex", "place")),
        ReindexOutcome::Returned
    )]
    #[case(Err(ReindexError::broker_rejected(4_u64, 0_u32)), ReindexOutcome::Rejected)]
    #[case(Err(ReindexError::publish("socket closed")), ReindexOutcome::Failed)]
    #[case(
        Err(ReindexError::cancelled(ContextError::DeadlineExceeded)),
        ReindexOutcome::Cancelled
    )]
    fn classifies_publish_results(
        #[case] result: Result<(), ReindexError>,
        #[case] expected: ReindexOutcome,
    ) {
        assert_eq!(ReindexOutcome::of(&result), expected);
    }

    #[tokio::test]
    async fn noop_record_returns_ok() {
        assert!(
            NoOpReindexMetrics
                .record(ReindexOutcome::Confirmed)
                .await
                .is_ok()
        );
    }
}
