//! In-memory `OutfitStore` used by the view-model tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};
use tokio::sync::watch;
use uuid::Uuid;

use crate::domain::{Collection, NewOutfit, Outfit};
use crate::ports::{ImageSource, OutfitStore, PortError, PortResult};

#[derive(Default)]
struct Inner {
    collections: Vec<Collection>,
    outfits: HashMap<Uuid, Outfit>,
}

pub struct MemoryStore {
    inner: Mutex<Inner>,
    changes: watch::Sender<u64>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            inner: Mutex::new(Inner::default()),
            changes,
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Makes every following write fail with `Unexpected`.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn outfit_rows(&self) -> usize {
        self.inner.lock().unwrap().outfits.len()
    }

    fn check_writable(&self) -> PortResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("disk full".to_string()));
        }
        Ok(())
    }

    fn bump(&self) {
        self.changes.send_modify(|rev| *rev += 1);
    }
}

#[async_trait]
impl OutfitStore for MemoryStore {
    async fn list_collections(&self) -> PortResult<Vec<Collection>> {
        Ok(self.inner.lock().unwrap().collections.clone())
    }

    async fn get_collection(&self, collection_id: Uuid) -> PortResult<Collection> {
        self.inner
            .lock()
            .unwrap()
            .collections
            .iter()
            .find(|c| c.id == collection_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Collection {} not found", collection_id)))
    }

    async fn find_collection_by_name(&self, name: &str) -> PortResult<Option<Collection>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .collections
            .iter()
            .find(|c| c.name == name)
            .cloned())
    }

    async fn create_collection(&self, name: &str, description: &str) -> PortResult<Collection> {
        self.check_writable()?;
        let collection = Collection {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: description.to_string(),
            outfit_ids: Vec::new(),
        };
        self.inner.lock().unwrap().collections.push(collection.clone());
        self.bump();
        Ok(collection)
    }

    async fn delete_collection(&self, collection_id: Uuid) -> PortResult<()> {
        self.check_writable()?;
        {
            let mut inner = self.inner.lock().unwrap();
            let index = inner
                .collections
                .iter()
                .position(|c| c.id == collection_id)
                .ok_or_else(|| PortError::NotFound(format!("Collection {} not found", collection_id)))?;
            let removed = inner.collections.remove(index);
            for id in removed.outfit_ids {
                inner.outfits.remove(&id);
            }
        }
        self.bump();
        Ok(())
    }

    async fn count_collections(&self) -> PortResult<usize> {
        Ok(self.inner.lock().unwrap().collections.len())
    }

    async fn append_outfit(&self, collection_id: Uuid, outfit: NewOutfit) -> PortResult<Outfit> {
        self.check_writable()?;
        let stored = {
            let mut inner = self.inner.lock().unwrap();
            let stored = Outfit {
                id: Uuid::new_v4(),
                collection_id,
                image: outfit.image,
                date: outfit.date,
                liked: outfit.liked,
                disliked: outfit.disliked,
                notes: outfit.notes,
            };
            let collection = inner
                .collections
                .iter_mut()
                .find(|c| c.id == collection_id)
                .ok_or_else(|| PortError::NotFound(format!("Collection {} not found", collection_id)))?;
            collection.outfit_ids.push(stored.id);
            inner.outfits.insert(stored.id, stored.clone());
            stored
        };
        self.bump();
        Ok(stored)
    }

    async fn get_outfit(&self, outfit_id: Uuid) -> PortResult<Outfit> {
        self.inner
            .lock()
            .unwrap()
            .outfits
            .get(&outfit_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Outfit {} not found", outfit_id)))
    }

    async fn get_outfits_for_collection(&self, collection_id: Uuid) -> PortResult<Vec<Outfit>> {
        let inner = self.inner.lock().unwrap();
        let collection = inner
            .collections
            .iter()
            .find(|c| c.id == collection_id)
            .ok_or_else(|| PortError::NotFound(format!("Collection {} not found", collection_id)))?;
        Ok(collection
            .outfit_ids
            .iter()
            .filter_map(|id| inner.outfits.get(id).cloned())
            .collect())
    }

    async fn count_outfits(&self, collection_id: Uuid) -> PortResult<usize> {
        Ok(self.get_outfits_for_collection(collection_id).await?.len())
    }

    async fn remove_outfit_from_collection(
        &self,
        outfit_id: Uuid,
        collection_id: Uuid,
    ) -> PortResult<()> {
        self.check_writable()?;
        {
            let mut inner = self.inner.lock().unwrap();
            let collection = inner
                .collections
                .iter_mut()
                .find(|c| c.id == collection_id)
                .ok_or_else(|| PortError::NotFound(format!("Collection {} not found", collection_id)))?;
            if !collection.contains(outfit_id) {
                return Err(PortError::NotFound(format!("Outfit {} not found", outfit_id)));
            }
            collection.outfit_ids.retain(|id| *id != outfit_id);
            inner.outfits.remove(&outfit_id);
        }
        self.bump();
        Ok(())
    }

    fn subscribe_changes(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }
}

/// An image source that answers with a fixed result.
pub struct FixedImage(Result<Bytes, String>);

impl FixedImage {
    pub fn ok(bytes: &'static [u8]) -> Self {
        Self(Ok(Bytes::from_static(bytes)))
    }

    pub fn failing(reason: &str) -> Self {
        Self(Err(reason.to_string()))
    }
}

#[async_trait]
impl ImageSource for FixedImage {
    async fn produce_image_bytes(&self) -> PortResult<Bytes> {
        match &self.0 {
            Ok(bytes) => Ok(bytes.clone()),
            Err(reason) => Err(PortError::ImageLoad(reason.clone())),
        }
    }
}

/// An image source that never completes.
pub struct NeverImage;

#[async_trait]
impl ImageSource for NeverImage {
    async fn produce_image_bytes(&self) -> PortResult<Bytes> {
        futures::future::pending().await
    }
}

pub fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 4, d, 12, 0, 0).unwrap()
}

pub fn new_outfit(date: DateTime<Utc>, liked: bool) -> NewOutfit {
    NewOutfit {
        image: Bytes::from_static(b"\x89PNG fake"),
        date,
        liked,
        disliked: !liked,
        notes: String::new(),
    }
}
