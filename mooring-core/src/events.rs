//! Progress events emitted during image synchronization.
//!
//! Events are ephemeral and flow over an unbounded channel from the
//! synchronizer to whoever renders progress. Volume is bounded by manifest
//! size and engine chatter, so unbounded buffering is acceptable.

use crate::types::ImageReference;
use tokio::sync::mpsc;

/// Sender half of the synchronization event stream.
pub type EventSender = mpsc::UnboundedSender<SyncEvent>;
/// Receiver half of the synchronization event stream.
pub type EventReceiver = mpsc::UnboundedReceiver<SyncEvent>;

/// Create a synchronization event channel.
pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// An event observed while synchronizing the image manifest.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// A per-layer notification forwarded from the engine's pull stream.
    ///
    /// Status-only notifications carry no byte counts; the aggregator drops
    /// them rather than forwarding empty fractions.
    DownloadProgress {
        layer_id: String,
        status: String,
        bytes_done: Option<u64>,
        bytes_total: Option<u64>,
    },
    /// A manifest entry resolved, whether skipped or actually downloaded.
    ///
    /// `completed` increments exactly once per entry and is bounded by
    /// `total`, the manifest length.
    ImageCompleted {
        image: ImageReference,
        completed: usize,
        total: usize,
    },
}
