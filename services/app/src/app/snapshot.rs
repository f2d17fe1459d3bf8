//! services/app/src/app/snapshot.rs
//!
//! A serializable picture of the whole library: every collection with its
//! outfits in feed order. Image bytes are left out.

use chrono::{DateTime, Utc};
use clothesline_core::domain::{Collection, Outfit};
use clothesline_core::ports::PortResult;
use serde::Serialize;

use crate::app::state::AppState;

#[derive(Debug, Serialize)]
pub struct LibrarySnapshot {
    pub exported_at: DateTime<Utc>,
    pub collections: Vec<CollectionSnapshot>,
}

#[derive(Debug, Serialize)]
pub struct CollectionSnapshot {
    #[serde(flatten)]
    pub collection: Collection,
    /// Newest first, as the feed shows them.
    pub outfits: Vec<Outfit>,
}

pub async fn take_snapshot(state: &AppState) -> PortResult<LibrarySnapshot> {
    let mut collections = Vec::new();

    for collection in state.browser().list_collections().await? {
        let mut feed = state.feed(collection.id);
        let outfits = feed.load_and_sort().await?.to_vec();
        collections.push(CollectionSnapshot {
            collection,
            outfits,
        });
    }

    Ok(LibrarySnapshot {
        exported_at: Utc::now(),
        collections,
    })
}
