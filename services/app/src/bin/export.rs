//! services/app/src/bin/export.rs
//!
//! This binary writes a JSON snapshot of every collection and its outfits
//! (without image bytes) to the configured `EXPORT_PATH`.

use clothesline_lib::{
    app::{take_snapshot, AppState},
    config::Config,
    error::AppError,
};
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Writes the already serialized snapshot JSON to `path`.
fn write_snapshot(json: &str, path: &Path) -> Result<(), AppError> {
    std::fs::write(path, json)?;
    info!("Library snapshot written to {}", path.display());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let state = AppState::bootstrap(config.clone()).await?;
    let snapshot = take_snapshot(&state).await?;
    let json = serde_json::to_string_pretty(&snapshot)?;

    write_snapshot(&json, &config.export_path)?;
    Ok(())
}
