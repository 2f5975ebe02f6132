//! Container engine access: image existence checks and pulls.
//!
//! `ImageStore` is the seam the synchronizer works against;
//! `DockerImageStore` implements it over the engine API via bollard.

use crate::error::{MooringError, Result};
use crate::events::{EventSender, SyncEvent};
use crate::types::{ImageReference, Platform};
use async_trait::async_trait;
use bollard::image::CreateImageOptions;
use bollard::Docker;
use futures_util::StreamExt;
use tracing::{debug, instrument};

/// Image operations the synchronizer depends on.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Check whether an image is present locally.
    ///
    /// `Ok(false)` means exactly "not found"; every other inspect failure
    /// (auth, transport, daemon) is an error and must not be conflated with
    /// absence.
    async fn image_present(&self, image: &ImageReference) -> Result<bool>;

    /// Pull an image, forwarding every engine progress notification over
    /// `events`. Returns once the pull has fully completed.
    async fn pull(&self, image: &ImageReference, events: &EventSender) -> Result<()>;
}

/// Engine connection table keyed by platform. Platforms without an entry
/// are unsupported rather than silently defaulted.
fn connect_for(platform: &Platform) -> Result<Docker> {
    match platform {
        // Local defaults resolve to the unix socket on Linux/macOS and the
        // named pipe on Windows.
        Platform::Linux | Platform::MacOs | Platform::Windows => {
            Docker::connect_with_local_defaults()
                .map_err(|e| MooringError::EngineUnavailable { reason: e.to_string() })
        }
        Platform::Other(name) => {
            Err(MooringError::PlatformUnsupported { platform: name.clone() })
        }
    }
}

/// Map an inspect failure, keeping "not found" distinct from real errors.
fn classify_inspect_error(image: &ImageReference, err: bollard::errors::Error) -> MooringError {
    match err {
        bollard::errors::Error::DockerResponseServerError { status_code: 404, .. } => {
            MooringError::ImageNotFound { image: image.reference() }
        }
        other => MooringError::InspectFailed {
            image: image.reference(),
            reason: other.to_string(),
        },
    }
}

/// `ImageStore` backed by the local engine daemon.
pub struct DockerImageStore {
    docker: Docker,
}

impl DockerImageStore {
    /// Connect using the capability table entry for `platform`.
    ///
    /// Connecting is lazy at the transport level; the daemon is only
    /// contacted when an operation runs.
    pub fn connect(platform: &Platform) -> Result<Self> {
        Ok(Self { docker: connect_for(platform)? })
    }
}

#[async_trait]
impl ImageStore for DockerImageStore {
    async fn image_present(&self, image: &ImageReference) -> Result<bool> {
        match self.docker.inspect_image(&image.reference()).await {
            Ok(_) => Ok(true),
            Err(err) => match classify_inspect_error(image, err) {
                MooringError::ImageNotFound { .. } => Ok(false),
                other => Err(other),
            },
        }
    }

    #[instrument(skip(self, events), fields(image = %image))]
    async fn pull(&self, image: &ImageReference, events: &EventSender) -> Result<()> {
        let options = CreateImageOptions {
            from_image: image.repository.clone(),
            tag: image.tag.clone(),
            ..Default::default()
        };

        let mut stream = self.docker.create_image(Some(options), None, None);

        while let Some(item) = stream.next().await {
            let info = item.map_err(|e| MooringError::PullFailed {
                image: image.reference(),
                reason: e.to_string(),
            })?;

            if let Some(message) = info.error {
                return Err(MooringError::PullFailed { image: image.reference(), reason: message });
            }

            // Notifications without a layer id are engine chatter about the
            // image as a whole; nothing to attribute them to.
            let Some(layer_id) = info.id else { continue };

            let (bytes_done, bytes_total) = match info.progress_detail {
                Some(detail) => (
                    detail.current.map(|c| c.max(0) as u64),
                    detail.total.map(|t| t.max(0) as u64),
                ),
                None => (None, None),
            };

            let _ = events.send(SyncEvent::DownloadProgress {
                layer_id,
                status: info.status.unwrap_or_default(),
                bytes_done,
                bytes_total,
            });
        }

        debug!("pull complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image() -> ImageReference {
        ImageReference::parse("redis:alpine")
    }

    #[test]
    fn test_inspect_404_maps_to_not_found() {
        let err = bollard::errors::Error::DockerResponseServerError {
            status_code: 404,
            message: "no such image".to_string(),
        };
        assert!(matches!(
            classify_inspect_error(&image(), err),
            MooringError::ImageNotFound { .. }
        ));
    }

    #[test]
    fn test_inspect_auth_failure_is_not_absence() {
        let err = bollard::errors::Error::DockerResponseServerError {
            status_code: 401,
            message: "unauthorized".to_string(),
        };
        assert!(matches!(
            classify_inspect_error(&image(), err),
            MooringError::InspectFailed { .. }
        ));
    }

    #[test]
    fn test_unknown_platform_has_no_connection_entry() {
        let result = connect_for(&Platform::Other("plan9".to_string()));
        assert!(matches!(result, Err(MooringError::PlatformUnsupported { .. })));
    }
}
