//! Prometheus adapter for reindex publish outcomes.
//!
//! Registers `walk_reindex_publish_total`, a counter labelled by `outcome`
//! (`confirmed`, `returned`, `rejected`, `failed`, `cancelled`), on the
//! registry scraped from `/prometheus`.

use async_trait::async_trait;
use prometheus::{IntCounterVec, Opts, Registry};

use crate::domain::ports::{ReindexMetrics, ReindexMetricsError, ReindexOutcome};

/// Prometheus-backed [`ReindexMetrics`].
pub struct PrometheusReindexMetrics {
    publishes_total: IntCounterVec,
}

impl PrometheusReindexMetrics {
    /// Create the counter and register it with `registry`.
    ///
    /// # Errors
    ///
    /// Returns an error when a metric with the same name is already
    /// registered.
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let publishes_total = IntCounterVec::new(
            Opts::new(
                "walk_reindex_publish_total",
                "Reindex publishes by broker outcome",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(publishes_total.clone()))?;
        Ok(Self { publishes_total })
    }
}

#[async_trait]
impl ReindexMetrics for PrometheusReindexMetrics {
    async fn record(&self, outcome: ReindexOutcome) -> Result<(), ReindexMetricsError> {
        self.publishes_total
            .get_metric_with_label_values(&[outcome.as_label()])
            .map_err(|err| ReindexMetricsError::export(err.to_string()))?
            .inc();
        Ok(())
    }
}
