// Transaction Report - Web Server
// REST API with Axum

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use txn_report::{router, AppState, CsvParser, LogRejections, ServerConfig};

fn setup_logging(directive: &str) {
    let filter = EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Ctrl+C received; shutting down");
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::parse();
    setup_logging(&config.log_level);

    info!("Transaction Report server v{}", txn_report::VERSION);

    let matcher = config.matching.matcher();
    info!(?matcher, "category matching");

    let parser = CsvParser::new(matcher).with_observer(Arc::new(LogRejections));
    let app = router(AppState::new(parser), config.max_upload_bytes);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Server running on http://{}", addr);
    info!("   Upload: POST /transactions/   Report: GET /report/");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}
