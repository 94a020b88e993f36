//! Server construction and middleware wiring.

mod config;
mod metrics;
mod state_builders;

pub use config::ServerConfig;
pub use metrics::build_metrics;
pub use state_builders::{
    Adapters, build_adapters, build_http_state, build_reindex_handler, consumer_settings,
};

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use actix_web_prom::PrometheusMetrics;

use walk_backend::Trace;
#[cfg(debug_assertions)]
use walk_backend::doc::ApiDoc;
use walk_backend::inbound::http::health::{HealthState, live, ready};
use walk_backend::inbound::http::state::HttpState;
use walk_backend::inbound::http::version::{VersionInfo, version};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

fn build_app(
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    version_info: web::Data<VersionInfo>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .app_data(version_info)
        .wrap(Trace)
        .configure(walk_backend::inbound::http::configure)
        .service(ready)
        .service(live)
        .service(version);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Construct an Actix HTTP server serving the API, health probes, release
/// identifier, and Prometheus scrape endpoint.
///
/// Signal handling is left to the caller so the readiness probe can fail
/// before the listener stops accepting connections.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    http_state: HttpState,
    metrics: PrometheusMetrics,
    config: &ServerConfig,
) -> std::io::Result<Server> {
    let server_health_state = health_state.clone();
    let http_state = web::Data::new(http_state);
    let version_info = web::Data::new(VersionInfo::new(config.version.clone()));

    let server = HttpServer::new(move || {
        build_app(
            server_health_state.clone(),
            http_state.clone(),
            version_info.clone(),
        )
        .wrap(metrics.clone())
    })
    .disable_signals()
    .bind(config.bind_addr())?
    .run();

    health_state.mark_ready();
    Ok(server)
}
