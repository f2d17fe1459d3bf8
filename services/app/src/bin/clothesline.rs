//! services/app/src/bin/clothesline.rs

use clothesline_core::ports::OutfitStore;
use clothesline_lib::{app::AppState, config::Config, error::AppError};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Opening the outfit store...");

    // --- 2. Open the Store & Run Migrations ---
    let state = AppState::bootstrap(config.clone()).await?;

    // --- 3. First-Launch Bootstrap ---
    let default = state.ensure_default_collection().await?;
    info!(id = %default.id, name = %default.name, "Default collection ready");

    // --- 4. Summarize the Library ---
    let collections = state.browser().list_collections().await?;
    for collection in &collections {
        let count = state.store.count_outfits(collection.id).await?;
        info!(
            id = %collection.id,
            outfits = count,
            "Collection '{}': {}",
            collection.name,
            collection.description
        );
    }
    info!("{} collection(s) available", collections.len());
    Ok(())
}
