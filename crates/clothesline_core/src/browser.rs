//! crates/clothesline_core/src/browser.rs
//!
//! The collection browser: lists, creates and deletes clotheslines.

use std::sync::Arc;

use futures::stream::{self, Stream};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::domain::{Collection, DEFAULT_COLLECTION_DESCRIPTION, DEFAULT_COLLECTION_NAME};
use crate::ports::{OutfitStore, PortError, PortResult};

/// Returns true when `name` may be used for a new collection.
pub fn is_name_submittable(name: &str) -> bool {
    !name.is_empty()
}

/// Orders collections by name, then by id so equal names stay deterministic.
pub fn sort_by_name(collections: &mut [Collection]) {
    collections.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
}

pub struct CollectionBrowser {
    store: Arc<dyn OutfitStore>,
    last_failure: Option<String>,
}

impl CollectionBrowser {
    pub fn new(store: Arc<dyn OutfitStore>) -> Self {
        Self {
            store,
            last_failure: None,
        }
    }

    /// The message of the last failed create or delete, cleared by the next success.
    pub fn last_failure(&self) -> Option<&str> {
        self.last_failure.as_deref()
    }

    pub async fn list_collections(&self) -> PortResult<Vec<Collection>> {
        let mut collections = self.store.list_collections().await?;
        sort_by_name(&mut collections);
        Ok(collections)
    }

    /// A live view of [`CollectionBrowser::list_collections`].
    ///
    /// Yields the current list right away and a fresh one after every
    /// committed store mutation.
    pub fn subscribe(&self) -> impl Stream<Item = PortResult<Vec<Collection>>> + Send + 'static {
        let store = self.store.clone();
        let changes = store.subscribe_changes();

        stream::unfold((store, changes, true), |(store, mut changes, first)| async move {
            if !first && changes.changed().await.is_err() {
                return None;
            }

            let mut result = store.list_collections().await;
            if let Ok(collections) = result.as_mut() {
                sort_by_name(collections);
            }
            Some((result, (store, changes, false)))
        })
    }

    pub async fn create_collection(
        &mut self,
        name: &str,
        description: &str,
    ) -> PortResult<Collection> {
        if !is_name_submittable(name) {
            return Err(PortError::Validation(
                "collection name must not be empty".to_string(),
            ));
        }

        match self.store.create_collection(name, description).await {
            Ok(collection) => {
                info!(id = %collection.id, name = %collection.name, "Created collection");
                self.last_failure = None;
                Ok(collection)
            }
            Err(e) => {
                error!(name = %name, "Failed to create collection: {:?}", e);
                self.last_failure = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Deletes the collection and every outfit it owns. No confirmation step.
    pub async fn delete_collection(&mut self, collection_id: Uuid) -> PortResult<()> {
        match self.store.delete_collection(collection_id).await {
            Ok(()) => {
                info!(id = %collection_id, "Deleted collection");
                self.last_failure = None;
                Ok(())
            }
            Err(e) => {
                error!(id = %collection_id, "Failed to delete collection: {:?}", e);
                self.last_failure = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Makes sure at least one collection exists, creating "Main" if needed.
    ///
    /// Safe to call on every launch: when collections already exist the
    /// first one by name is returned and nothing is written.
    pub async fn ensure_default_collection(&mut self) -> PortResult<Collection> {
        self.ensure_named_default(DEFAULT_COLLECTION_NAME).await
    }

    /// Like [`CollectionBrowser::ensure_default_collection`] with a configurable name.
    pub async fn ensure_named_default(&mut self, name: &str) -> PortResult<Collection> {
        if let Some(first) = self.list_collections().await?.into_iter().next() {
            debug!(id = %first.id, "Default collection already present");
            return Ok(first);
        }

        info!("No collections found, creating the default one");
        self.create_collection(name, DEFAULT_COLLECTION_DESCRIPTION)
            .await
    }
}
