//! Image synchronizer: ensure every manifest entry is present locally.
//!
//! Entries are processed strictly in declared order, one pull at a time.
//! Sequential pulls bound peak bandwidth and disk use and keep the
//! completed count strictly monotonic, at the cost of wall-clock time.

use crate::error::Result;
use crate::events::{EventSender, SyncEvent};
use crate::engine::ImageStore;
use crate::types::ImageReference;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

/// Immutable description of one synchronization pass.
#[derive(Debug, Clone)]
pub struct SyncRequest {
    /// Required images in pull order. Immutable during the pass.
    pub manifest: Vec<ImageReference>,
    /// Treat every entry as absent regardless of local cache state.
    pub force_refresh: bool,
}

/// Outcome of a synchronization pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// Entries resolved (skipped or downloaded). Equals `total` unless the
    /// pass was cancelled.
    pub completed: usize,
    /// Manifest length.
    pub total: usize,
    /// The pass stopped at a cooperative cancellation point.
    pub cancelled: bool,
}

/// Drives a manifest through an [`ImageStore`].
pub struct ImageSynchronizer<'a, S> {
    store: &'a S,
}

impl<'a, S: ImageStore> ImageSynchronizer<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Ensure each manifest image is present, emitting progress events.
    ///
    /// Cancellation is cooperative and checked before each entry's work
    /// begins; a pull already in flight is never interrupted, and partial
    /// pulls are left to the engine's own consistency.
    ///
    /// A pull failure is fatal to the whole pass: later entries are never
    /// started, and the error carries the single terminal failure rather
    /// than a per-image tally.
    #[instrument(skip(self, request, cancel, events), fields(images = request.manifest.len(), force = request.force_refresh))]
    pub async fn sync(
        &self,
        request: &SyncRequest,
        cancel: &CancellationToken,
        events: &EventSender,
    ) -> Result<SyncReport> {
        let total = request.manifest.len();
        let mut completed = 0usize;

        for image in &request.manifest {
            if cancel.is_cancelled() {
                info!(completed, total, "synchronization cancelled before next image");
                return Ok(SyncReport { completed, total, cancelled: true });
            }

            let present =
                if request.force_refresh { false } else { self.store.image_present(image).await? };

            if present {
                debug!(image = %image, "image already present, skipping pull");
            } else {
                info!(image = %image, "pulling image");
                self.store.pull(image, events).await?;
            }

            // Exactly one increment per entry, skip or download alike.
            completed += 1;
            let _ = events.send(SyncEvent::ImageCompleted {
                image: image.clone(),
                completed,
                total,
            });
        }

        info!(completed, "manifest synchronized");
        Ok(SyncReport { completed, total, cancelled: false })
    }
}
