//! Progress aggregation: per-layer events reduced to an overall fraction.
//!
//! The reducer is pure: each event produces a new state value, so there is
//! no hidden cross-call mutation and the UI can fold the event stream at
//! its own pace.

use crate::events::SyncEvent;
use std::collections::HashMap;

/// Derived progress snapshot consumed by a UI.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressState {
    /// Most recent engine status line.
    pub message: String,
    /// Manifest entries resolved so far (skipped or downloaded).
    pub completed: usize,
    /// Manifest length.
    pub total: usize,
    /// Active layer fractions for the image currently being pulled. UI
    /// smoothing only; never summed into `overall`.
    pub layer_fractions: HashMap<String, f64>,
    /// `completed / total`: granularity is per-image, not per-byte.
    pub overall: f64,
}

impl ProgressState {
    /// Fold one event into the state.
    pub fn reduce(mut self, event: &SyncEvent) -> ProgressState {
        match event {
            SyncEvent::DownloadProgress { layer_id, status, bytes_done, bytes_total } => {
                // Status-only notifications carry no byte counts: drop them.
                let (done, total) = match (bytes_done, bytes_total) {
                    (Some(done), Some(total)) => (*done, *total),
                    _ => return self,
                };
                // Some engines report zero-total placeholders before sizes
                // are known.
                let fraction = if total == 0 { 0.0 } else { done as f64 / total as f64 };
                self.layer_fractions.insert(layer_id.clone(), fraction);
                self.message = status.clone();
                self
            }
            SyncEvent::ImageCompleted { image, completed, total } => {
                // Cleared, not merged: stale layer ids from this image must
                // not leak into the next image's aggregate.
                self.layer_fractions.clear();
                self.completed = *completed;
                self.total = *total;
                self.overall =
                    if *total == 0 { 0.0 } else { *completed as f64 / *total as f64 };
                self.message = format!("{} ready", image);
                self
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ImageReference;

    fn progress(layer: &str, done: u64, total: u64) -> SyncEvent {
        SyncEvent::DownloadProgress {
            layer_id: layer.to_string(),
            status: "Downloading".to_string(),
            bytes_done: Some(done),
            bytes_total: Some(total),
        }
    }

    fn completed(n: usize, total: usize) -> SyncEvent {
        SyncEvent::ImageCompleted { image: ImageReference::parse("redis:alpine"), completed: n, total }
    }

    #[test]
    fn test_layer_fraction_tracked() {
        let state = ProgressState::default().reduce(&progress("aa", 50, 200));
        assert_eq!(state.layer_fractions["aa"], 0.25);
    }

    #[test]
    fn test_zero_total_yields_zero_fraction() {
        let state = ProgressState::default().reduce(&progress("aa", 0, 0));
        assert_eq!(state.layer_fractions["aa"], 0.0);
    }

    #[test]
    fn test_status_only_event_is_dropped() {
        let before = ProgressState::default().reduce(&progress("aa", 10, 100));
        let after = before.clone().reduce(&SyncEvent::DownloadProgress {
            layer_id: "aa".to_string(),
            status: "Waiting".to_string(),
            bytes_done: None,
            bytes_total: None,
        });
        assert_eq!(before, after);
    }

    #[test]
    fn test_completion_clears_layer_map() {
        let state = ProgressState::default()
            .reduce(&progress("aa", 10, 100))
            .reduce(&progress("bb", 5, 100))
            .reduce(&completed(1, 3));
        assert!(state.layer_fractions.is_empty());
        assert_eq!(state.completed, 1);
        assert_eq!(state.total, 3);
    }

    #[test]
    fn test_overall_is_per_image_not_per_byte() {
        // A nearly finished layer must not move the overall fraction.
        let state = ProgressState::default()
            .reduce(&completed(1, 4))
            .reduce(&progress("aa", 99, 100));
        assert_eq!(state.overall, 0.25);
    }

    #[test]
    fn test_overall_reaches_one() {
        let state = ProgressState::default().reduce(&completed(4, 4));
        assert_eq!(state.overall, 1.0);
    }
}
