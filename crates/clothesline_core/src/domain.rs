//! crates/clothesline_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Name given to the collection created on first launch.
pub const DEFAULT_COLLECTION_NAME: &str = "Main";
/// Description given to the collection created on first launch.
pub const DEFAULT_COLLECTION_DESCRIPTION: &str = "This is your main clothesline";
/// Notes an outfit carries when the user never typed any.
pub const DEFAULT_NOTES: &str = "No notes!";

/// A single photographed look.
///
/// Ratings are stored as two independent flags. Only the entry workflow keeps
/// them exclusive; a stored outfit may carry both.
#[derive(Debug, Clone, Serialize)]
pub struct Outfit {
    pub id: Uuid,
    /// The owning collection. Only used to re-fetch the parent.
    pub collection_id: Uuid,
    #[serde(skip)]
    pub image: Bytes,
    pub date: DateTime<Utc>,
    pub liked: bool,
    pub disliked: bool,
    pub notes: String,
}

/// The payload for inserting an outfit. Identity is assigned by the store.
#[derive(Debug, Clone)]
pub struct NewOutfit {
    pub image: Bytes,
    pub date: DateTime<Utc>,
    pub liked: bool,
    pub disliked: bool,
    pub notes: String,
}

/// A named grouping of outfits ("clothesline").
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Collection {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    /// Owned outfits, in insertion order.
    pub outfit_ids: Vec<Uuid>,
}

impl Collection {
    pub fn contains(&self, outfit_id: Uuid) -> bool {
        self.outfit_ids.contains(&outfit_id)
    }
}

/// Where a photo comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ImageOrigin {
    Library,
    Camera,
}

/// What the photo slot of the entry form is currently showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageState {
    Empty,
    Loading { origin: ImageOrigin, request_id: u64 },
    Loaded(Bytes),
    Failed(String),
}

impl ImageState {
    pub fn is_loading(&self) -> bool {
        matches!(self, ImageState::Loading { .. })
    }
}
