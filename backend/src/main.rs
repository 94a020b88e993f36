//! Backend entry-point: wires the broker, cache, REST endpoints, and the
//! reindex consumer, then serves until interrupted.

mod server;

use std::ffi::OsString;
use std::sync::Arc;

use actix_web::web;
use ortho_config::OrthoConfig;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use walk_backend::config::{ApiSettings, RabbitMqSettings, RedisSettings};
use walk_backend::inbound::amqp::ReindexConsumer;
use walk_backend::inbound::http::health::HealthState;
use walk_backend::outbound::metrics::PrometheusReindexMetrics;

use server::{
    ServerConfig, build_adapters, build_http_state, build_metrics, build_reindex_handler,
    consumer_settings, create_server,
};

fn program_args() -> [OsString; 1] {
    [OsString::from("walk-backend")]
}

fn config_error(name: &str, err: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::other(format!("load {name} settings: {err}"))
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let rabbitmq = RabbitMqSettings::load_from_iter(program_args())
        .map_err(|err| config_error("RABBITMQ", err))?;
    let redis =
        RedisSettings::load_from_iter(program_args()).map_err(|err| config_error("REDIS", err))?;
    let api = ApiSettings::load_from_iter(program_args()).map_err(|err| config_error("API", err))?;
    let server_config = ServerConfig::from_settings(&api)?;

    let adapters = build_adapters(&rabbitmq, &redis).await?;

    // Declaring the topology before serving keeps mandatory publishes routable.
    let (topology, options) = consumer_settings(&rabbitmq);
    let consumer = ReindexConsumer::connect(
        rabbitmq.uri(),
        topology,
        options,
        build_reindex_handler(&adapters),
    )
    .await
    .map_err(|err| std::io::Error::other(format!("start reindex consumer: {err}")))?;
    let shutdown = CancellationToken::new();
    let consumer_task = tokio::spawn(consumer.run(shutdown.clone()));

    let metrics = build_metrics()?;
    let reindex_metrics = PrometheusReindexMetrics::new(&metrics.registry)
        .map_err(|err| std::io::Error::other(format!("register reindex metrics: {err}")))?;
    let http_state = build_http_state(
        &adapters,
        Arc::new(reindex_metrics),
        rabbitmq.confirm_timeout(),
        server_config.request_timeout,
    );
    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state.clone(), http_state, metrics, &server_config)?;
    info!(
        bind_addr = %server_config.bind_addr(),
        version = %api.version(),
        "listening"
    );

    let handle = server.handle();
    let signal_health = health_state.clone();
    actix_web::rt::spawn(async move {
        if let Err(error) = tokio::signal::ctrl_c().await {
            error!(%error, "failed to listen for shutdown signal");
            return;
        }
        info!("shutdown requested; draining");
        signal_health.mark_unhealthy();
        handle.stop(true).await;
    });

    server.await?;

    shutdown.cancel();
    match consumer_task.await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => warn!(error = %err, "reindex consumer stopped with an error"),
        Err(err) => warn!(error = %err, "reindex consumer task failed"),
    }
    if let Err(err) = adapters.broker.close().await {
        warn!(error = %err, "closing broker channel failed");
    }
    info!("shutdown complete");
    Ok(())
}
