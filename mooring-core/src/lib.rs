//! mooring core library
//!
//! Lifecycle controller for a local multi-container application stack:
//! probes the container runtime, synchronizes the image manifest with
//! progress reporting, and supervises the compose-driven stack with a
//! bounded health poll.

pub mod config;
pub mod context;
pub mod controller;
pub mod engine;
pub mod error;
pub mod events;
pub mod probe;
pub mod progress;
pub mod supervisor;
pub mod sync;
pub mod types;

// Re-export commonly used items
pub use config::Config;
pub use controller::{DockerLifecycleController, LifecycleController};
pub use error::{MooringError, Result};
pub use events::{EventReceiver, EventSender, SyncEvent};
pub use probe::RuntimeProbe;
pub use progress::ProgressState;
pub use supervisor::{StackSupervisor, start_verdict};
pub use sync::{SyncReport, SyncRequest};
pub use types::{ImageReference, Platform, ReadinessState, StackHandle};
