//! statkit reporter binary.
//!
//! - Loads `statkit.yaml` (or the path given as the first argument)
//! - Serves `/healthz` and `/metrics` on `reporter.listen`
//! - Builds the sink payload every `reporter.interval_secs`
//! - Shuts down on Ctrl-C / SIGTERM

use std::process::ExitCode;
use std::sync::Arc;

use tokio::sync::watch;
use tracing_subscriber::{fmt, EnvFilter};

use statkit_core::error::{Result, StatkitError};
use statkit_report::{app_state::AppState, config, router, schedule, PayloadReporter};

#[tokio::main]
async fn main() -> ExitCode {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(code = e.code().as_str(), error = %e, "statkit-report failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "statkit.yaml".to_string());
    let cfg = config::load_from_file(&path)?;
    let listen = cfg.reporter.listen_addr()?;
    let interval = cfg.reporter.interval();

    let state = AppState::from_config(cfg);
    let registry = state.registry();

    let clock = registry.clock();
    let started = clock.now();
    registry.gauge_fn("statkit.uptime_seconds", move || clock.now() - started)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let reporter = Arc::new(PayloadReporter::new(state.cfg().reporter.clone()));
    let reporting = schedule::spawn(reporter, Arc::clone(&registry), interval, shutdown_rx);

    let app = router::build_router(state);

    tracing::info!(%listen, config = %path, "statkit-report starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| StatkitError::Report(format!("bind {listen} failed: {e}")))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| StatkitError::Report(format!("server failed: {e}")))?;

    let _ = shutdown_tx.send(true);
    if let Err(e) = reporting.await {
        tracing::warn!(error = %e, "reporter task ended abnormally");
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("signal received, starting graceful shutdown");
}
