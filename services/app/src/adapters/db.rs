//! services/app/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `OutfitStore` port from the core crate. It handles all interactions
//! with the SQLite database using `sqlx`, and hands image payloads above the
//! inline limit to the `BlobStore`.

use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use clothesline_core::domain::{Collection, NewOutfit, Outfit};
use clothesline_core::ports::{OutfitStore, PortError, PortResult};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use tokio::sync::watch;
use tracing::debug;
use uuid::Uuid;

use crate::adapters::blob::BlobStore;

/// Opens a connection pool for `database_url`, creating the file if needed.
///
/// An in-memory database only lives as long as its connection, so it gets a
/// single connection that is never recycled.
pub async fn connect_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");
    let pool_options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    };

    pool_options.connect_with(options).await
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A SQLite adapter that implements the `OutfitStore` port.
pub struct SqliteStore {
    pool: SqlitePool,
    blobs: BlobStore,
    inline_limit: usize,
    changes: watch::Sender<u64>,
}

impl SqliteStore {
    /// Creates a new `SqliteStore`. Images longer than `inline_limit` bytes go to `blobs`.
    pub fn new(pool: SqlitePool, blobs: BlobStore, inline_limit: usize) -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            pool,
            blobs,
            inline_limit,
            changes,
        }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    fn notify(&self) {
        self.changes.send_modify(|revision| *revision += 1);
    }

    async fn outfit_ids_for(&self, collection_id: Uuid) -> PortResult<Vec<Uuid>> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM outfits WHERE collection_id = ?1 ORDER BY position ASC",
        )
        .bind(collection_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)
    }

    async fn load_image(&self, record: &OutfitRecord) -> PortResult<Bytes> {
        match (&record.image_inline, &record.image_path) {
            (Some(data), _) => Ok(Bytes::copy_from_slice(data)),
            (None, Some(name)) => self.blobs.read(name).await,
            (None, None) => Err(PortError::Unexpected(format!(
                "Outfit {} has no image",
                record.id
            ))),
        }
    }

    async fn to_outfit(&self, record: OutfitRecord) -> PortResult<Outfit> {
        let image = self.load_image(&record).await?;
        Ok(record.to_domain(image))
    }

    async fn insert_outfit_row(
        &self,
        outfit_id: Uuid,
        collection_id: Uuid,
        outfit: &NewOutfit,
        image_inline: Option<&[u8]>,
        image_path: Option<&str>,
    ) -> PortResult<()> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        let exists = sqlx::query_scalar::<_, Uuid>("SELECT id FROM collections WHERE id = ?1")
            .bind(collection_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(unexpected)?;
        if exists.is_none() {
            return Err(PortError::NotFound(format!(
                "Collection {} not found",
                collection_id
            )));
        }

        let position: i64 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(position) + 1, 0) FROM outfits WHERE collection_id = ?1",
        )
        .bind(collection_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(unexpected)?;

        sqlx::query(
            "INSERT INTO outfits (id, collection_id, position, date, liked, disliked, notes, image_inline, image_path)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(outfit_id)
        .bind(collection_id)
        .bind(position)
        .bind(outfit.date)
        .bind(outfit.liked)
        .bind(outfit.disliked)
        .bind(&outfit.notes)
        .bind(image_inline)
        .bind(image_path)
        .execute(&mut *tx)
        .await
        .map_err(unexpected)?;

        tx.commit().await.map_err(unexpected)
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct CollectionRecord {
    id: Uuid,
    name: String,
    description: String,
}
impl CollectionRecord {
    fn to_domain(self, outfit_ids: Vec<Uuid>) -> Collection {
        Collection {
            id: self.id,
            name: self.name,
            description: self.description,
            outfit_ids,
        }
    }
}

#[derive(FromRow)]
struct OutfitRecord {
    id: Uuid,
    collection_id: Uuid,
    date: DateTime<Utc>,
    liked: bool,
    disliked: bool,
    notes: String,
    image_inline: Option<Vec<u8>>,
    image_path: Option<String>,
}
impl OutfitRecord {
    fn to_domain(self, image: Bytes) -> Outfit {
        Outfit {
            id: self.id,
            collection_id: self.collection_id,
            image,
            date: self.date,
            liked: self.liked,
            disliked: self.disliked,
            notes: self.notes,
        }
    }
}

const OUTFIT_COLUMNS: &str =
    "id, collection_id, date, liked, disliked, notes, image_inline, image_path";

//=========================================================================================
// `OutfitStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl OutfitStore for SqliteStore {
    async fn list_collections(&self) -> PortResult<Vec<Collection>> {
        // Both reads see the same snapshot.
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        let records = sqlx::query_as::<_, CollectionRecord>(
            "SELECT id, name, description FROM collections ORDER BY name ASC",
        )
        .fetch_all(&mut *tx)
        .await
        .map_err(unexpected)?;

        let memberships = sqlx::query_as::<_, (Uuid, Uuid)>(
            "SELECT collection_id, id FROM outfits ORDER BY collection_id, position ASC",
        )
        .fetch_all(&mut *tx)
        .await
        .map_err(unexpected)?;

        tx.commit().await.map_err(unexpected)?;

        let mut outfit_ids: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for (collection_id, outfit_id) in memberships {
            outfit_ids.entry(collection_id).or_default().push(outfit_id);
        }

        Ok(records
            .into_iter()
            .map(|r| {
                let ids = outfit_ids.remove(&r.id).unwrap_or_default();
                r.to_domain(ids)
            })
            .collect())
    }

    async fn get_collection(&self, collection_id: Uuid) -> PortResult<Collection> {
        let record = sqlx::query_as::<_, CollectionRecord>(
            "SELECT id, name, description FROM collections WHERE id = ?1",
        )
        .bind(collection_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("Collection {} not found", collection_id))
            }
            _ => unexpected(e),
        })?;

        let outfit_ids = self.outfit_ids_for(record.id).await?;
        Ok(record.to_domain(outfit_ids))
    }

    async fn find_collection_by_name(&self, name: &str) -> PortResult<Option<Collection>> {
        let record = sqlx::query_as::<_, CollectionRecord>(
            "SELECT id, name, description FROM collections WHERE name = ?1 ORDER BY id LIMIT 1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        match record {
            Some(record) => {
                let outfit_ids = self.outfit_ids_for(record.id).await?;
                Ok(Some(record.to_domain(outfit_ids)))
            }
            None => Ok(None),
        }
    }

    async fn create_collection(&self, name: &str, description: &str) -> PortResult<Collection> {
        let record = sqlx::query_as::<_, CollectionRecord>(
            "INSERT INTO collections (id, name, description, created_at) VALUES (?1, ?2, ?3, ?4)
             RETURNING id, name, description",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(description)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;

        debug!(id = %record.id, "Collection row inserted");
        self.notify();
        Ok(record.to_domain(Vec::new()))
    }

    async fn delete_collection(&self, collection_id: Uuid) -> PortResult<()> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        let blob_names = sqlx::query_scalar::<_, String>(
            "SELECT image_path FROM outfits WHERE collection_id = ?1 AND image_path IS NOT NULL",
        )
        .bind(collection_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(unexpected)?;

        let outfits = sqlx::query("DELETE FROM outfits WHERE collection_id = ?1")
            .bind(collection_id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;

        let deleted = sqlx::query("DELETE FROM collections WHERE id = ?1")
            .bind(collection_id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        if deleted.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Collection {} not found",
                collection_id
            )));
        }

        tx.commit().await.map_err(unexpected)?;
        debug!(
            id = %collection_id,
            outfits = outfits.rows_affected(),
            "Collection rows deleted"
        );

        for name in blob_names {
            self.blobs.remove(&name).await;
        }
        self.notify();
        Ok(())
    }

    async fn count_collections(&self) -> PortResult<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM collections")
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(count as usize)
    }

    async fn append_outfit(&self, collection_id: Uuid, outfit: NewOutfit) -> PortResult<Outfit> {
        let outfit_id = Uuid::new_v4();

        let blob_name = if outfit.image.len() > self.inline_limit {
            Some(self.blobs.write(outfit_id, &outfit.image).await?)
        } else {
            None
        };
        let image_inline = blob_name.is_none().then(|| &outfit.image[..]);

        let inserted = self
            .insert_outfit_row(
                outfit_id,
                collection_id,
                &outfit,
                image_inline,
                blob_name.as_deref(),
            )
            .await;
        if let Err(e) = inserted {
            if let Some(name) = &blob_name {
                self.blobs.remove(name).await;
            }
            return Err(e);
        }

        debug!(id = %outfit_id, collection = %collection_id, external = blob_name.is_some(), "Outfit row inserted");
        self.notify();
        Ok(Outfit {
            id: outfit_id,
            collection_id,
            image: outfit.image,
            date: outfit.date,
            liked: outfit.liked,
            disliked: outfit.disliked,
            notes: outfit.notes,
        })
    }

    async fn get_outfit(&self, outfit_id: Uuid) -> PortResult<Outfit> {
        let record = sqlx::query_as::<_, OutfitRecord>(&format!(
            "SELECT {} FROM outfits WHERE id = ?1",
            OUTFIT_COLUMNS
        ))
        .bind(outfit_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("Outfit {} not found", outfit_id))
            }
            _ => unexpected(e),
        })?;

        self.to_outfit(record).await
    }

    async fn get_outfits_for_collection(&self, collection_id: Uuid) -> PortResult<Vec<Outfit>> {
        let collection = self.get_collection(collection_id).await?;

        let records = sqlx::query_as::<_, OutfitRecord>(&format!(
            "SELECT {} FROM outfits WHERE collection_id = ?1 ORDER BY position ASC",
            OUTFIT_COLUMNS
        ))
        .bind(collection.id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        let mut outfits = Vec::with_capacity(records.len());
        for record in records {
            outfits.push(self.to_outfit(record).await?);
        }
        Ok(outfits)
    }

    async fn count_outfits(&self, collection_id: Uuid) -> PortResult<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM outfits WHERE collection_id = ?1")
            .bind(collection_id)
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(count as usize)
    }

    async fn remove_outfit_from_collection(
        &self,
        outfit_id: Uuid,
        collection_id: Uuid,
    ) -> PortResult<()> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        let row = sqlx::query_as::<_, (Option<String>,)>(
            "SELECT image_path FROM outfits WHERE id = ?1 AND collection_id = ?2",
        )
        .bind(outfit_id)
        .bind(collection_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(unexpected)?;
        let Some((blob_name,)) = row else {
            return Err(PortError::NotFound(format!(
                "Outfit {} not found in collection {}",
                outfit_id, collection_id
            )));
        };

        sqlx::query("DELETE FROM outfits WHERE id = ?1")
            .bind(outfit_id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;

        tx.commit().await.map_err(unexpected)?;

        if let Some(name) = blob_name {
            self.blobs.remove(&name).await;
        }
        self.notify();
        Ok(())
    }

    fn subscribe_changes(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }
}
