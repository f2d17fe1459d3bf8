//! crates/clothesline_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific implementations like SQLite or the photo library.

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::watch;
use uuid::Uuid;

use crate::domain::{Collection, NewOutfit, Outfit};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (database, filesystem).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Image could not be loaded: {0}")]
    ImageLoad(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The entity store holding collections and their outfits.
///
/// Every mutating call is a single transaction and bumps the change counter
/// returned by [`OutfitStore::subscribe_changes`].
#[async_trait]
pub trait OutfitStore: Send + Sync {
    // --- Collections ---
    async fn list_collections(&self) -> PortResult<Vec<Collection>>;

    async fn get_collection(&self, collection_id: Uuid) -> PortResult<Collection>;

    async fn find_collection_by_name(&self, name: &str) -> PortResult<Option<Collection>>;

    async fn create_collection(&self, name: &str, description: &str) -> PortResult<Collection>;

    /// Deletes the collection together with every outfit it owns.
    async fn delete_collection(&self, collection_id: Uuid) -> PortResult<()>;

    async fn count_collections(&self) -> PortResult<usize>;

    // --- Outfits ---
    /// Appends a new outfit to the end of the collection's outfit list.
    async fn append_outfit(&self, collection_id: Uuid, outfit: NewOutfit) -> PortResult<Outfit>;

    async fn get_outfit(&self, outfit_id: Uuid) -> PortResult<Outfit>;

    /// Returns the collection's outfits in insertion order.
    async fn get_outfits_for_collection(&self, collection_id: Uuid) -> PortResult<Vec<Outfit>>;

    async fn count_outfits(&self, collection_id: Uuid) -> PortResult<usize>;

    /// Deletes the outfit and drops it from the owning collection's list.
    ///
    /// Fails with `NotFound` if the outfit does not belong to `collection_id`.
    async fn remove_outfit_from_collection(
        &self,
        outfit_id: Uuid,
        collection_id: Uuid,
    ) -> PortResult<()>;

    // --- Change notification ---
    /// A receiver whose value changes after every committed mutation.
    fn subscribe_changes(&self) -> watch::Receiver<u64>;
}

#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Produces the raw bytes of one picked or captured photo.
    async fn produce_image_bytes(&self) -> PortResult<Bytes>;
}
