//! voicecast Gateway: CSV timeline upload, per-speaker voice casting and CSV export.
//! Configuration comes from `config/gateway.toml`, `VOICECAST__*` env vars and `.env`.

mod routes;
mod settings;
mod uploads;

use std::sync::Arc;

use routes::{router, AppState};
use settings::GatewayConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[voicecast-gateway] .env not loaded: {} (using system environment)", e);
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = GatewayConfig::load()?;
    if config.voice_api_key.is_none() {
        tracing::warn!("No voice API key configured (ELEVENLABS_API_KEY); voice list will be empty");
    }

    let state = Arc::new(AppState::from_config(&config)?);
    let app = router(state);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(
        addr = %addr,
        upload_dir = %config.upload_dir,
        frame_rate = config.frame_rate,
        "voicecast gateway listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
