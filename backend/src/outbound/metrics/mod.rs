//! Outbound adapters exporting domain metrics to Prometheus.

mod prometheus_reindex;

pub use prometheus_reindex::PrometheusReindexMetrics;
