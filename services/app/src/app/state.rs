//! services/app/src/app/state.rs
//!
//! Defines the application's shared state and the process bootstrap.

use std::sync::Arc;

use clothesline_core::domain::Collection;
use clothesline_core::ports::{OutfitStore, PortResult};
use clothesline_core::{CollectionBrowser, OutfitEntry, OutfitFeed};
use tracing::info;
use uuid::Uuid;

use crate::adapters::db::{connect_pool, SqliteStore};
use crate::adapters::BlobStore;
use crate::config::Config;
use crate::error::AppError;

//=========================================================================================
// AppState (Shared by every view-model)
//=========================================================================================

/// The shared application state, created once at startup.
///
/// The store is the only process-wide state; view-models are created on demand
/// and borrow it through the `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn OutfitStore>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Opens the store described by `config` and brings its schema up to date.
    pub async fn bootstrap(config: Arc<Config>) -> Result<Self, AppError> {
        info!("Connecting to database...");
        let pool = connect_pool(&config.database_url).await?;

        let blobs = BlobStore::new(&config.blob_dir);
        blobs.ensure_dir().await?;

        let store = SqliteStore::new(pool, blobs, config.blob_inline_limit);
        info!("Running database migrations...");
        store.run_migrations().await?;
        info!("Database migrations complete.");

        Ok(Self {
            store: Arc::new(store),
            config,
        })
    }

    pub fn browser(&self) -> CollectionBrowser {
        CollectionBrowser::new(self.store.clone())
    }

    pub fn feed(&self, collection_id: Uuid) -> OutfitFeed {
        OutfitFeed::new(self.store.clone(), collection_id)
    }

    pub fn entry(&self, collection_id: Uuid) -> OutfitEntry {
        OutfitEntry::new(self.store.clone(), collection_id)
    }

    /// Creates the configured default collection on first launch.
    pub async fn ensure_default_collection(&self) -> PortResult<Collection> {
        self.browser()
            .ensure_named_default(&self.config.default_collection_name)
            .await
    }
}
