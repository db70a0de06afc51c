//! AgriSense API server
//!
//! Run with: cargo run -p agrisense-web

use agrisense_config::Config;
use agrisense_web::{router::build_router, state::AppState};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting AgriSense API...");

    let config = Config::load()?;
    let addr = config.bind_addr();

    let state = AppState::initialise(config).await?;
    info!(
        "Crop model {}",
        if state.ranker.is_trained() { "loaded" } else { "not trained yet" }
    );

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
