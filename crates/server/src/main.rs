//! instadiag server entry point.
//!
//! Boots the HTTP API that serves Instagram profile diagnoses. Logs are
//! emitted as JSON on stderr.

use std::sync::Arc;

use anyhow::{Context, Result};
use instadiag_client::{ApifyClient, ApifyConfig, DifyClient, DifyConfig};
use instadiag_core::{AppConfig, CacheDb};
use tracing_subscriber::EnvFilter;

mod diagnose;
mod error;
mod routes;
mod state;

use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;

    let scraper = ApifyClient::new(ApifyConfig {
        token: config.require_apify_token()?.to_string(),
        base_url: config.apify_base_url.clone(),
        actor: config.apify_actor.clone(),
        timeout: config.request_timeout(),
        user_agent: config.user_agent.clone(),
    })?;

    let (dify_key, dify_url) = config.require_dify()?;
    let generator = DifyClient::new(DifyConfig {
        api_key: dify_key.to_string(),
        api_url: dify_url.to_string(),
        timeout: config.request_timeout(),
        user_agent: config.user_agent.clone(),
    })?;

    let db = CacheDb::open(&config.db_path)
        .await
        .with_context(|| format!("failed to open database at {}", config.db_path.display()))?;

    let state = AppState::new(&config, db, Arc::new(scraper), Arc::new(generator));
    let app = routes::router(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(addr = %config.bind_addr, db = %config.db_path.display(), "starting instadiag server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!(error = %e, "failed to listen for SIGTERM"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("received shutdown signal");
}
