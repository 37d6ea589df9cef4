//! Storelink - store directory server
//!
//! Serves two surfaces over one axum router:
//! - an operator dashboard behind an email/password session gate, used to
//!   create, edit, delete and list store profiles
//! - public read-only profile pages at `/store/{id}`, the links behind the
//!   QR codes and NFC tags handed out to customers
//!
//! Records live in a Supabase `stores` table; sign-in goes through Supabase auth.

mod app;
mod auth;
mod config;
mod dashboard;
mod http;
mod profile;
mod store;
mod util;

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::AppState;
use crate::config::Config;
use crate::http::build_router;
use crate::http::sessions::SWEEP_PERIOD;
use crate::util::time::init_server_time;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level);

    // Initialize server time tracking
    init_server_time();

    info!("Starting Storelink");
    info!("Server address: {}", config.server_addr);
    info!("Public links: {}/store/{{id}}", config.public_base_url);

    // Create application state
    let state = AppState::new(config.clone());
    let sessions = state.sessions.clone();

    // Spawn expired session sweeper
    tokio::spawn(sessions.clone().run_sweeper(SWEEP_PERIOD));

    // Build router
    let router = build_router(state);

    // Start server
    let addr: SocketAddr = config.server_addr;
    let listener = TcpListener::bind(addr).await?;

    info!("Server listening on {}", addr);
    info!("Health check: http://{}/health", addr);
    info!("Dashboard: http://{}/admin", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Tear down operator sessions and their gate subscriptions
    info!(count = sessions.len(), "Dropping operator sessions");
    sessions.clear();

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        }
    }
}
