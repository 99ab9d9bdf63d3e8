//! Email Checker web front-end
//!
//! Screens addresses against an external reputation API, alerts an operator
//! about suspicious ones, and turns uploaded address lists into an XLSX report.

use anyhow::Context;
use axum::{middleware::from_fn, Router};
use screening_core::{DisabledNotifier, Notifier, Screener, SmtpNotifier, ValidationClient};
use std::{net::SocketAddr, sync::Arc};
use tokio::signal;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{info, warn, Level};

mod config;
mod error_page;
mod logging;
mod middleware;
mod routes;
#[cfg(test)]
mod test_support;
mod views;

use config::*;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub screener: Arc<Screener>,
    pub config: Arc<AppConfig>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config().context("Failed to load configuration")?;

    let _log_guard = logging::init_tracing(&config.logging).context("Failed to initialize logging")?;

    info!("Email Checker startup v{}", env!("CARGO_PKG_VERSION"));

    config.validate().context("Invalid configuration")?;

    let screener = build_screener(&config)?;
    info!(
        "Screener ready: bulk concurrency {}, notifications {}",
        screener.concurrency(),
        if config.notifications.enabled { "enabled" } else { "disabled" }
    );

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let app_state = AppState {
        screener: Arc::new(screener),
        config: Arc::new(config),
    };

    let app = create_router(app_state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down gracefully");
    Ok(())
}

/// Wire the validation client and notifier from configuration
fn build_screener(config: &AppConfig) -> anyhow::Result<Screener> {
    let client = ValidationClient::new(config.validation.client_config())
        .context("Failed to initialize validation client")?;

    let notifier: Arc<dyn Notifier> = if config.notifications.enabled {
        let smtp = SmtpNotifier::new(&config.notifications.smtp_config())
            .context("Failed to initialize SMTP notifier")?;
        Arc::new(smtp)
    } else {
        warn!("Notifications are disabled; suspicious results will only be logged");
        Arc::new(DisabledNotifier)
    };

    Ok(Screener::new(Arc::new(client), notifier)
        .with_concurrency(config.validation.bulk_concurrency))
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    routes::build_routes(Arc::new(state))
        .layer(from_fn(middleware::security_headers))
        .layer(from_fn(middleware::request_id))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
