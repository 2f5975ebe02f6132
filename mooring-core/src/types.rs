//! Shared types for the mooring lifecycle controller.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The controller's current assessment of the local environment.
///
/// Exactly one value is held at a time. Transitions are one-directional
/// within a single probe/sync/start cycle; `PlatformUnsupported` is terminal
/// for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessState {
    /// The host platform has no engine connection entry.
    PlatformUnsupported,
    /// The engine or compose CLI binary is not invocable.
    RuntimeAbsent,
    /// The engine CLI exists but its daemon did not answer.
    RuntimeNotRunning,
    /// The daemon answered; image presence has not been established yet.
    ImagesMissing,
    /// Every manifest image is present locally.
    Ready,
    /// The stack has been started and reported a successful launch.
    Running,
}

impl fmt::Display for ReadinessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ReadinessState::PlatformUnsupported => "platform unsupported",
            ReadinessState::RuntimeAbsent => "container engine not installed",
            ReadinessState::RuntimeNotRunning => "container engine not running",
            ReadinessState::ImagesMissing => "images not synchronized",
            ReadinessState::Ready => "ready",
            ReadinessState::Running => "running",
        };
        f.write_str(label)
    }
}

/// Host platform, the key of the engine capability table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Platform {
    Linux,
    MacOs,
    Windows,
    Other(String),
}

impl Platform {
    /// Detect the platform the process is running on.
    pub fn current() -> Self {
        match std::env::consts::OS {
            "linux" => Platform::Linux,
            "macos" => Platform::MacOs,
            "windows" => Platform::Windows,
            other => Platform::Other(other.to_string()),
        }
    }

    /// Whether the capability table has an engine connection entry for this
    /// platform. Platforms without an entry short-circuit every lifecycle
    /// operation to `PlatformUnsupported`.
    pub fn supported(&self) -> bool {
        matches!(self, Platform::Linux | Platform::MacOs | Platform::Windows)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Linux => f.write_str("linux"),
            Platform::MacOs => f.write_str("macos"),
            Platform::Windows => f.write_str("windows"),
            Platform::Other(name) => f.write_str(name),
        }
    }
}

fn default_tag() -> String {
    "latest".to_string()
}

/// A single entry of the image manifest: repository plus tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageReference {
    pub repository: String,
    #[serde(default = "default_tag")]
    pub tag: String,
}

impl ImageReference {
    /// Create a reference with an explicit tag.
    pub fn new(repository: impl Into<String>, tag: impl Into<String>) -> Self {
        Self { repository: repository.into(), tag: tag.into() }
    }

    /// Parse a `repo[:tag]` string; the tag defaults to `latest`.
    ///
    /// A `:` whose suffix contains a `/` is the port of a
    /// `registry:port/image` reference, not a tag separator.
    pub fn parse(reference: &str) -> Self {
        if let Some((name, tag)) = reference.rsplit_once(':') {
            if !tag.contains('/') {
                return Self::new(name, tag);
            }
        }
        Self::new(reference, "latest")
    }

    /// The full `repository:tag` form used for inspect and pull.
    pub fn reference(&self) -> String {
        format!("{}:{}", self.repository, self.tag)
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.repository, self.tag)
    }
}

/// One invocation of the external orchestrator process.
///
/// A fresh handle is created per start; the exit code is fixed at process
/// exit and the handle is discarded on stop/restart, never reused.
#[derive(Debug, Clone, Default)]
pub struct StackHandle {
    /// OS process id, when the child reported one.
    pub pid: Option<u32>,
    /// Set once the process has exited. `None` means killed by signal.
    pub exit_code: Option<i32>,
    /// Combined stdout/stderr lines in arrival order. Interleaving between
    /// the two streams is best-effort, not strictly ordered.
    pub output_lines: Vec<String>,
}

impl StackHandle {
    /// True when the orchestrator process exited with status zero.
    pub fn exited_cleanly(&self) -> bool {
        self.exit_code == Some(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_repository() {
        let image = ImageReference::parse("redis");
        assert_eq!(image.repository, "redis");
        assert_eq!(image.tag, "latest");
    }

    #[test]
    fn test_parse_with_tag() {
        let image = ImageReference::parse("redis:alpine");
        assert_eq!(image.repository, "redis");
        assert_eq!(image.tag, "alpine");
    }

    #[test]
    fn test_parse_org_repository() {
        let image = ImageReference::parse("myorg/myapp:v1.2");
        assert_eq!(image.repository, "myorg/myapp");
        assert_eq!(image.tag, "v1.2");
    }

    #[test]
    fn test_parse_numeric_tag_on_namespaced_repository() {
        let image = ImageReference::parse("myorg/app:2");
        assert_eq!(image.repository, "myorg/app");
        assert_eq!(image.tag, "2");
        assert_eq!(image.reference(), "myorg/app:2");
    }

    #[test]
    fn test_parse_registry_port_is_not_a_tag() {
        let image = ImageReference::parse("registry.local:5000/myapp");
        assert_eq!(image.repository, "registry.local:5000/myapp");
        assert_eq!(image.tag, "latest");
    }

    #[test]
    fn test_reference_roundtrip() {
        let image = ImageReference::new("nginx", "alpine");
        assert_eq!(image.reference(), "nginx:alpine");
    }

    #[test]
    fn test_stack_handle_clean_exit() {
        let handle = StackHandle { exit_code: Some(0), ..Default::default() };
        assert!(handle.exited_cleanly());

        let handle = StackHandle { exit_code: Some(1), ..Default::default() };
        assert!(!handle.exited_cleanly());

        // Killed by signal: no exit code, never clean.
        let handle = StackHandle::default();
        assert!(!handle.exited_cleanly());
    }

    #[test]
    fn test_unknown_platform_is_unsupported() {
        assert!(Platform::Linux.supported());
        assert!(!Platform::Other("plan9".to_string()).supported());
    }
}
