//! crates/clothesline_core/src/workflow.rs
//!
//! The outfit entry workflow: one photo plus a rating, a date and notes,
//! committed as a new outfit into a collection.
//!
//! Image loads may finish on another task. Each load carries a request id and
//! only the most recent request is allowed to land, so a slow pick can never
//! overwrite a newer one.

use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::{ImageOrigin, ImageState, NewOutfit, Outfit, DEFAULT_NOTES};
use crate::ports::{ImageSource, OutfitStore, PortError, PortResult};

//=========================================================================================
// Image loading
//=========================================================================================

/// A started image load. Run it with [`ImageRequest::fetch`], then hand the
/// outcome back to [`OutfitEntry::apply_image_load`].
#[derive(Debug)]
pub struct ImageRequest {
    request_id: u64,
    origin: ImageOrigin,
    cancel: CancellationToken,
}

impl ImageRequest {
    pub fn request_id(&self) -> u64 {
        self.request_id
    }

    pub fn origin(&self) -> ImageOrigin {
        self.origin
    }

    /// Asks `source` for the photo, giving up as soon as the request is superseded.
    pub async fn fetch(self, source: &dyn ImageSource) -> ImageLoadOutcome {
        let result = tokio::select! {
            _ = self.cancel.cancelled() => None,
            res = source.produce_image_bytes() => Some(res),
        };

        ImageLoadOutcome {
            request_id: self.request_id,
            origin: self.origin,
            result,
        }
    }
}

/// The result of one image load. `result` is `None` when the load was cancelled.
#[derive(Debug)]
pub struct ImageLoadOutcome {
    pub request_id: u64,
    pub origin: ImageOrigin,
    pub result: Option<PortResult<Bytes>>,
}

impl ImageLoadOutcome {
    pub fn is_cancelled(&self) -> bool {
        self.result.is_none()
    }
}

//=========================================================================================
// The entry form
//=========================================================================================

pub struct OutfitEntry {
    store: Arc<dyn OutfitStore>,
    collection_id: Uuid,

    image_state: ImageState,
    pending_load: Option<CancellationToken>,
    last_request_id: u64,

    date: DateTime<Utc>,
    liked: bool,
    disliked: bool,
    notes: String,
    notes_focused: bool,
    last_failure: Option<String>,
}

impl OutfitEntry {
    /// Starts a blank form that will commit into `collection_id`.
    pub fn new(store: Arc<dyn OutfitStore>, collection_id: Uuid) -> Self {
        Self {
            store,
            collection_id,
            image_state: ImageState::Empty,
            pending_load: None,
            last_request_id: 0,
            date: Utc::now(),
            liked: false,
            disliked: false,
            notes: DEFAULT_NOTES.to_string(),
            notes_focused: false,
            last_failure: None,
        }
    }

    pub fn collection_id(&self) -> Uuid {
        self.collection_id
    }

    pub fn image_state(&self) -> &ImageState {
        &self.image_state
    }

    /// The selected photo, once a load has succeeded.
    pub fn image(&self) -> Option<&Bytes> {
        match &self.image_state {
            ImageState::Loaded(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    pub fn set_date(&mut self, date: DateTime<Utc>) {
        self.date = date;
    }

    pub fn liked(&self) -> bool {
        self.liked
    }

    pub fn disliked(&self) -> bool {
        self.disliked
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.notes = notes.into();
    }

    pub fn notes_focused(&self) -> bool {
        self.notes_focused
    }

    pub fn focus_notes(&mut self) {
        self.notes_focused = true;
    }

    /// The message of the last failed submit, cleared by a successful one.
    pub fn last_failure(&self) -> Option<&str> {
        self.last_failure.as_deref()
    }

    // --- Image selection ---

    /// Starts loading a photo from `origin`, superseding any load in flight.
    ///
    /// Library picks and camera captures share one slot: starting either
    /// cancels the other and drops the currently shown photo.
    pub fn begin_image_load(&mut self, origin: ImageOrigin) -> ImageRequest {
        self.cancel_pending_load();

        self.last_request_id += 1;
        let cancel = CancellationToken::new();
        self.pending_load = Some(cancel.clone());
        self.image_state = ImageState::Loading {
            origin,
            request_id: self.last_request_id,
        };

        ImageRequest {
            request_id: self.last_request_id,
            origin,
            cancel,
        }
    }

    /// Applies a finished load. Returns false when the outcome was discarded
    /// because it was cancelled or a newer request has been started since.
    pub fn apply_image_load(&mut self, outcome: ImageLoadOutcome) -> bool {
        let is_current = matches!(
            self.image_state,
            ImageState::Loading { request_id, .. } if request_id == outcome.request_id
        );
        if !is_current {
            return false;
        }
        let Some(result) = outcome.result else {
            return false;
        };

        self.pending_load = None;
        self.image_state = match result {
            Ok(bytes) if bytes.is_empty() => {
                warn!(origin = ?outcome.origin, "Image source returned no data");
                ImageState::Failed("the image is empty".to_string())
            }
            Ok(bytes) => ImageState::Loaded(bytes),
            Err(e) => {
                warn!(origin = ?outcome.origin, "Image load failed: {}", e);
                ImageState::Failed(e.to_string())
            }
        };
        true
    }

    pub async fn pick_from_library(&mut self, source: &dyn ImageSource) -> bool {
        self.load_from(ImageOrigin::Library, source).await
    }

    pub async fn capture_from_camera(&mut self, source: &dyn ImageSource) -> bool {
        self.load_from(ImageOrigin::Camera, source).await
    }

    async fn load_from(&mut self, origin: ImageOrigin, source: &dyn ImageSource) -> bool {
        let request = self.begin_image_load(origin);
        let outcome = request.fetch(source).await;
        self.apply_image_load(outcome)
    }

    /// Drops the current photo and cancels any load in flight.
    pub fn clear_image(&mut self) {
        self.cancel_pending_load();
        self.image_state = ImageState::Empty;
    }

    fn cancel_pending_load(&mut self) {
        if let Some(token) = self.pending_load.take() {
            token.cancel();
        }
    }

    // --- Rating ---

    pub fn toggle_liked(&mut self) {
        self.liked = !self.liked;
        if self.liked {
            self.disliked = false;
        }
    }

    pub fn toggle_disliked(&mut self) {
        self.disliked = !self.disliked;
        if self.disliked {
            self.liked = false;
        }
    }

    // --- Submission ---

    /// A photo is present and the outfit has been rated.
    pub fn is_submittable(&self) -> bool {
        self.image().is_some() && (self.liked || self.disliked)
    }

    /// A previous submit failed and the form can be sent again as is.
    pub fn can_retry(&self) -> bool {
        self.last_failure.is_some() && self.is_submittable()
    }

    /// Commits the form as a new outfit at the end of the collection.
    ///
    /// On a store failure the form is left untouched so it can be retried.
    pub async fn submit(&mut self) -> PortResult<Outfit> {
        self.notes_focused = false;

        let image = match self.image() {
            Some(image) if self.is_submittable() => image.clone(),
            _ => {
                return Err(PortError::Validation(
                    "an outfit needs a photo and a rating".to_string(),
                ))
            }
        };

        let outfit = NewOutfit {
            image,
            date: self.date,
            liked: self.liked,
            disliked: self.disliked,
            notes: self.notes.clone(),
        };

        match self.store.append_outfit(self.collection_id, outfit).await {
            Ok(stored) => {
                info!(id = %stored.id, collection = %self.collection_id, "Outfit saved");
                self.last_failure = None;
                Ok(stored)
            }
            Err(e) => {
                error!(collection = %self.collection_id, "Failed to save outfit: {:?}", e);
                self.last_failure = Some(e.to_string());
                Err(e)
            }
        }
    }
}

impl Drop for OutfitEntry {
    fn drop(&mut self) {
        self.cancel_pending_load();
    }
}
