//! routemeter server
//!
//! - Static files under `server.static_dir`
//! - Prometheus scrape endpoint at `server.metrics_path`
//! - Every routed request counted, status-tallied and timed
//!
//! Usage: `routemeter-server [config.yaml]` (default `routemeter.yaml`).

use std::process::ExitCode;

use tracing_subscriber::{fmt, EnvFilter};

use routemeter_core::error::Result;
use routemeter_server::{app_state, config, router};

#[tokio::main]
async fn main() -> ExitCode {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, code = e.code().as_str(), "routemeter-server failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let path = std::env::args().nth(1).unwrap_or_else(|| "routemeter.yaml".to_string());
    let cfg = config::load_from_file(&path)?;
    let listen = cfg.server.listen_addr()?;

    // Registration conflicts surface here, before the listener is bound.
    let state = app_state::AppState::new(cfg)?;

    tracing::info!(
        %listen,
        static_dir = ?state.cfg().server.static_dir,
        metrics_path = %state.cfg().server.metrics_path,
        "routemeter-server starting"
    );
    let app = router::build_router(state);

    let listener = tokio::net::TcpListener::bind(listen).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("routemeter-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "ctrl-c handler unavailable; running until killed");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
