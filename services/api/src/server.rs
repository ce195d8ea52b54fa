use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryUserStore};
use crate::routes::with_leaderboard_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::sync::watch;
use topper::config::AppConfig;
use topper::error::AppError;
use topper::leaderboard::{LeaderboardService, SweepScheduler, SystemClock};
use topper::telemetry;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if args.no_sweep {
        config.leaderboard.sweep_enabled = false;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(InMemoryUserStore::default());
    let service = Arc::new(LeaderboardService::new(
        store,
        Arc::new(SystemClock),
        &config.leaderboard,
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = config.leaderboard.sweep_enabled.then(|| {
        SweepScheduler::spawn(
            service.sweep(),
            config.leaderboard.sweep_interval,
            shutdown_rx,
        )
    });

    let app = with_leaderboard_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        sweep_enabled = config.leaderboard.sweep_enabled,
        "topper rating service ready"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(readiness_flag))
        .await?;

    shutdown_tx.send_replace(true);
    if let Some(handle) = scheduler {
        if let Err(err) = handle.await {
            warn!(error = %err, "sweep scheduler did not stop cleanly");
        }
    }

    info!("topper rating service stopped");
    Ok(())
}

async fn shutdown_signal(readiness: Arc<std::sync::atomic::AtomicBool>) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    readiness.store(false, Ordering::Release);
    info!("shutdown requested");
}
