//! crates/clothesline_core/src/feed.rs
//!
//! The outfit feed: a collection's outfits, newest first, with confirmed deletes.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::domain::{Collection, Outfit};
use crate::ports::{OutfitStore, PortResult};

/// Sorts outfits by date, most recent first. Equal dates keep their order.
pub fn sort_newest_first(outfits: &mut [Outfit]) {
    outfits.sort_by(|a, b| b.date.cmp(&a.date));
}

/// Medium date style, e.g. `Apr 7, 2024`.
pub fn format_date(date: DateTime<Utc>) -> String {
    date.format("%b %-d, %Y").to_string()
}

pub struct OutfitFeed {
    store: Arc<dyn OutfitStore>,
    collection_id: Uuid,
    collection: Option<Collection>,
    outfits: Vec<Outfit>,
    pending_delete: Option<Uuid>,
    last_failure: Option<String>,
    scroll_position: Option<usize>,
}

impl OutfitFeed {
    pub fn new(store: Arc<dyn OutfitStore>, collection_id: Uuid) -> Self {
        Self {
            store,
            collection_id,
            collection: None,
            outfits: Vec::new(),
            pending_delete: None,
            last_failure: None,
            scroll_position: None,
        }
    }

    pub fn collection_id(&self) -> Uuid {
        self.collection_id
    }

    /// The collection as of the last load.
    pub fn collection(&self) -> Option<&Collection> {
        self.collection.as_ref()
    }

    /// The outfits as of the last load, newest first.
    pub fn outfits(&self) -> &[Outfit] {
        &self.outfits
    }

    /// Re-fetches the collection and its outfits and sorts them newest first.
    pub async fn load_and_sort(&mut self) -> PortResult<&[Outfit]> {
        let collection = self.store.get_collection(self.collection_id).await?;
        let mut outfits = self.store.get_outfits_for_collection(collection.id).await?;
        sort_newest_first(&mut outfits);

        debug!(collection = %collection.id, count = outfits.len(), "Feed reloaded");
        self.collection = Some(collection);
        self.outfits = outfits;
        Ok(&self.outfits)
    }

    // --- Deletion ---

    /// Asks for confirmation before deleting `outfit_id`.
    pub fn request_delete(&mut self, outfit_id: Uuid) {
        self.pending_delete = Some(outfit_id);
    }

    pub fn pending_delete(&self) -> Option<Uuid> {
        self.pending_delete
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    /// The message of the last failed delete, cleared by the next success.
    pub fn last_failure(&self) -> Option<&str> {
        self.last_failure.as_deref()
    }

    /// Deletes the outfit awaiting confirmation and reloads the feed.
    ///
    /// Returns the deleted id, or `None` when nothing was pending. When the
    /// store fails the delete stays pending so it can be confirmed again.
    pub async fn confirm_delete(&mut self) -> PortResult<Option<Uuid>> {
        let Some(outfit_id) = self.pending_delete.take() else {
            return Ok(None);
        };

        if let Err(e) = self.remove(outfit_id).await {
            error!(
                id = %outfit_id,
                collection = %self.collection_id,
                "Failed to delete outfit: {:?}",
                e
            );
            self.last_failure = Some(e.to_string());
            self.pending_delete = Some(outfit_id);
            return Err(e);
        }
        self.last_failure = None;

        self.load_and_sort().await?;
        Ok(Some(outfit_id))
    }

    async fn remove(&self, outfit_id: Uuid) -> PortResult<()> {
        let outfit = self.store.get_outfit(outfit_id).await?;
        self.store
            .remove_outfit_from_collection(outfit.id, outfit.collection_id)
            .await?;
        info!(id = %outfit.id, collection = %outfit.collection_id, "Outfit deleted");
        Ok(())
    }

    // --- Scrolling ---

    pub fn scroll_position(&self) -> Option<usize> {
        self.scroll_position
    }

    pub fn jump_to_top(&mut self) {
        self.scroll_position = (!self.outfits.is_empty()).then_some(0);
    }

    pub fn jump_to_bottom(&mut self) {
        self.scroll_position = self.outfits.len().checked_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::CollectionBrowser;
    use crate::testing::{day, new_outfit, FixedImage, MemoryStore};
    use crate::workflow::OutfitEntry;

    async fn feed_with(dates: &[u32]) -> (Arc<MemoryStore>, OutfitFeed, Vec<Outfit>) {
        let store = Arc::new(MemoryStore::new());
        let collection = store.create_collection("Trial", "").await.unwrap();
        let mut stored = Vec::new();
        for d in dates {
            stored.push(
                store
                    .append_outfit(collection.id, new_outfit(day(*d), true))
                    .await
                    .unwrap(),
            );
        }
        let feed = OutfitFeed::new(store.clone(), collection.id);
        (store, feed, stored)
    }

    fn ids(outfits: &[Outfit]) -> Vec<Uuid> {
        outfits.iter().map(|o| o.id).collect()
    }

    #[tokio::test]
    async fn loads_newest_first() {
        let (_, mut feed, stored) = feed_with(&[3, 9, 1]).await;

        let loaded = ids(feed.load_and_sort().await.unwrap());

        assert_eq!(loaded, vec![stored[1].id, stored[0].id, stored[2].id]);
    }

    #[test]
    fn swapping_dates_swaps_order() {
        let a = Outfit {
            id: Uuid::new_v4(),
            collection_id: Uuid::nil(),
            image: bytes::Bytes::new(),
            date: day(1),
            liked: true,
            disliked: false,
            notes: String::new(),
        };
        let b = Outfit { id: Uuid::new_v4(), date: day(2), ..a.clone() };

        let mut outfits = vec![a.clone(), b.clone()];
        sort_newest_first(&mut outfits);
        assert_eq!(ids(&outfits), vec![b.id, a.id]);

        let a = Outfit { date: day(2), ..a };
        let b = Outfit { date: day(1), ..b };
        let mut outfits = vec![a.clone(), b.clone()];
        sort_newest_first(&mut outfits);
        assert_eq!(ids(&outfits), vec![a.id, b.id]);
    }

    #[tokio::test]
    async fn equal_dates_keep_insertion_order() {
        let (_, mut feed, stored) = feed_with(&[5, 5, 5]).await;
        let loaded = ids(feed.load_and_sort().await.unwrap());
        assert_eq!(loaded, ids(&stored));
    }

    #[tokio::test]
    async fn confirmed_delete_removes_from_store_and_collection() {
        let (store, mut feed, stored) = feed_with(&[1, 2]).await;
        feed.load_and_sort().await.unwrap();
        let victim = stored[0].id;

        feed.request_delete(victim);
        assert_eq!(feed.pending_delete(), Some(victim));
        assert_eq!(feed.confirm_delete().await.unwrap(), Some(victim));

        assert!(!feed.collection().unwrap().contains(victim));
        assert!(!ids(feed.outfits()).contains(&victim));
        assert!(!store.get_collection(feed.collection_id()).await.unwrap().contains(victim));
        assert!(store.get_outfit(victim).await.is_err());

        let reloaded = ids(feed.load_and_sort().await.unwrap());
        assert_eq!(reloaded, vec![stored[1].id]);
    }

    #[tokio::test]
    async fn cancelled_delete_changes_nothing() {
        let (store, mut feed, stored) = feed_with(&[1, 2]).await;

        feed.request_delete(stored[0].id);
        feed.cancel_delete();
        assert_eq!(feed.confirm_delete().await.unwrap(), None);

        assert_eq!(store.outfit_rows(), 2);
        assert_eq!(feed.load_and_sort().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn failed_delete_stays_pending_for_retry() {
        let (store, mut feed, stored) = feed_with(&[1, 2]).await;
        let victim = stored[1].id;
        feed.request_delete(victim);

        store.fail_writes(true);
        assert!(feed.confirm_delete().await.is_err());
        assert_eq!(feed.pending_delete(), Some(victim));
        assert!(feed.last_failure().is_some());
        assert_eq!(store.outfit_rows(), 2);

        store.fail_writes(false);
        assert_eq!(feed.confirm_delete().await.unwrap(), Some(victim));
        assert!(feed.last_failure().is_none());
        assert_eq!(ids(feed.outfits()), vec![stored[0].id]);
    }

    #[tokio::test]
    async fn load_fails_once_collection_is_gone() {
        let (store, mut feed, _) = feed_with(&[1]).await;
        store.delete_collection(feed.collection_id()).await.unwrap();
        assert!(feed.load_and_sort().await.is_err());
    }

    #[tokio::test]
    async fn jumps_track_feed_length() {
        let (_, mut feed, _) = feed_with(&[]).await;
        feed.load_and_sort().await.unwrap();
        feed.jump_to_bottom();
        assert_eq!(feed.scroll_position(), None);

        let (_, mut feed, _) = feed_with(&[1, 2, 3]).await;
        feed.load_and_sort().await.unwrap();
        feed.jump_to_bottom();
        assert_eq!(feed.scroll_position(), Some(2));
        feed.jump_to_top();
        assert_eq!(feed.scroll_position(), Some(0));
    }

    #[test]
    fn formats_medium_dates() {
        assert_eq!(format_date(day(7)), "Apr 7, 2024");
    }

    #[tokio::test]
    async fn trial_end_to_end() {
        let store = Arc::new(MemoryStore::new());
        let mut browser = CollectionBrowser::new(store.clone());
        let trial = browser.create_collection("Trial", "").await.unwrap();

        let mut first = OutfitEntry::new(store.clone(), trial.id);
        first.pick_from_library(&FixedImage::ok(b"one")).await;
        first.toggle_liked();
        first.set_date(day(1));
        let outfit1 = first.submit().await.unwrap();

        let mut second = OutfitEntry::new(store.clone(), trial.id);
        second.capture_from_camera(&FixedImage::ok(b"two")).await;
        second.toggle_disliked();
        second.set_date(day(2));
        let outfit2 = second.submit().await.unwrap();

        let mut feed = OutfitFeed::new(store, trial.id);
        let loaded = ids(feed.load_and_sort().await.unwrap());
        assert_eq!(loaded, vec![outfit2.id, outfit1.id]);
    }
}
