use crate::cli::ServeArgs;
use crate::infra::{AppState, LoggingNotifier};
use crate::routes::with_lifecycle_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use hireloop::config::AppConfig;
use hireloop::error::AppError;
use hireloop::marketplace::LifecycleService;
use hireloop::persistence::Database;
use hireloop::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let database = Database::connect(&config.database).await?;
    database.migrate().await?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        database: database.clone(),
    };

    let policy = config.lifecycle.transition_policy();
    let service = Arc::new(LifecycleService::new(
        database.clone(),
        policy,
        Arc::new(LoggingNotifier),
    ));

    let app = with_lifecycle_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, ?policy, "job lifecycle service ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(readiness_flag))
        .await?;
    database.close().await;
    info!("job lifecycle service stopped");
    Ok(())
}

pub(crate) async fn migrate() -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let database = Database::connect(&config.database).await?;
    database.migrate().await?;
    database.close().await;

    info!(url = %config.database.url, "database schema is up to date");
    Ok(())
}

async fn shutdown_signal(readiness: Arc<AtomicBool>) {
    if tokio::signal::ctrl_c().await.is_err() {
        tracing::warn!("unable to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    readiness.store(false, Ordering::Release);
    info!("shutdown requested, draining connections");
}
