//! Prometheus request metrics and the scrape endpoint.
//!
//! The middleware counts and times every request under the `walk`
//! namespace. Domain counters registered on the same registry are served
//! from the same endpoint.

use actix_web_prom::{PrometheusMetrics, PrometheusMetricsBuilder};

/// Path Prometheus scrapes.
pub const METRICS_ENDPOINT: &str = "/prometheus";

/// Build the request metrics middleware.
///
/// # Errors
/// Returns [`std::io::Error`] when the collectors cannot be registered.
pub fn build_metrics() -> std::io::Result<PrometheusMetrics> {
    PrometheusMetricsBuilder::new("walk")
        .endpoint(METRICS_ENDPOINT)
        .build()
        .map_err(|err| std::io::Error::other(format!("configure Prometheus metrics: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, test as actix_test, web};

    use walk_backend::domain::ports::{ReindexMetrics, ReindexOutcome};
    use walk_backend::inbound::http::version::{VersionInfo, version};
    use walk_backend::outbound::metrics::PrometheusReindexMetrics;

    #[actix_web::test]
    async fn scrape_reports_requests_and_reindex_outcomes() {
        let metrics = build_metrics().expect("metrics middleware");
        let reindex =
            PrometheusReindexMetrics::new(&metrics.registry).expect("register reindex counter");
        reindex
            .record(ReindexOutcome::Confirmed)
            .await
            .expect("record outcome");
        let app = actix_test::init_service(
            App::new()
                .wrap(metrics.clone())
                .app_data(web::Data::new(VersionInfo::new("1.0.0")))
                .service(version),
        )
        .await;

        let request = actix_test::TestRequest::get().uri("/version").to_request();
        actix_test::call_service(&app, request).await;
        let request = actix_test::TestRequest::get()
            .uri(METRICS_ENDPOINT)
            .to_request();
        let body = actix_test::call_and_read_body(&app, request).await;
        let text = String::from_utf8(body.to_vec()).expect("utf-8 exposition");

        assert!(text.contains("walk_http_requests_total"), "{text}");
        assert!(
            text.contains("walk_reindex_publish_total{outcome=\"confirmed\"} 1"),
            "{text}"
        );
    }
}
