use anyhow::Context;
use std::sync::Arc;
use tracing::info;

use talking_avatar_gateway::generator::FalClient;
use talking_avatar_gateway::{create_router, AppConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "talking_avatar_gateway=info,tower_http=info,axum=info".into()
            }),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::from_env()?;
    let addr = config.bind_addr()?;

    info!(
        storage_dir = %config.storage_dir.display(),
        frontend_dist = %config.frontend_dist.display(),
        fal_run_url = %config.fal_run_url,
        "Initializing Talking Avatar gateway"
    );

    // No timeout: provider jobs block until they finish.
    let http_client = reqwest::Client::builder()
        .build()
        .context("Failed to create HTTP client")?;

    let provider = Arc::new(FalClient::from_config(http_client.clone(), &config));
    let state = Arc::new(AppState::new(config, provider, http_client));
    state.store.ensure_layout().await?;

    let app = create_router(state);

    info!(addr = %addr, "Starting Talking Avatar gateway");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}
