//! Curse Widget - embeddable CurseForge project badges
//!
//! Serves `/widget/{projectID}` as an iframe-ready HTML widget, plus a status
//! page and a JSON health endpoint.

use curse_widget::render::Renderer;
use curse_widget::{start_server, Config, Result, ServerState, SharedState, WidgetService};
use curseforge_api::CurseForgeClient;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let env_filter = EnvFilter::from_default_env().add_directive("curse_widget=info".parse()?);

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    };

    info!("Starting Curse Widget...");

    let config = Config::from_env();
    info!("Port: {}", config.port);
    info!("CurseForge API: {}", config.api_url);
    info!("Download history: {}", config.history_url);
    info!(
        "Project cache TTL: {}s, history cache TTL: {}s",
        config.project_cache.ttl.as_secs(),
        config.history_cache.ttl.as_secs()
    );

    let client = CurseForgeClient::with_endpoints(
        &config.api_url,
        &config.history_url,
        config.upstream_timeout,
    );
    let service = WidgetService::new(Arc::new(client), &config);
    let renderer = Renderer::new()?;

    // Create shared state
    let state: SharedState = Arc::new(ServerState::new(service, renderer));

    // Start HTTP server (blocking)
    start_server(state, config.port).await?;

    Ok(())
}
