use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pathwise_api::{app, AppState};
use pathwise_common::Config;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("pathwise=info".parse()?))
        .init();

    let config = Config::from_env()?;
    config.log_redacted();

    let state = Arc::new(AppState::from_config(&config)?);
    info!(
        colleges = state.index.len(),
        models = ?state.advisor.dispatcher().models(),
        scrape_enabled = state.pipeline.is_some(),
        "Application state ready"
    );

    let addr = format!("{}:{}", config.web_host, config.web_port);
    info!("Pathwise API starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}
