//! Process-wide environment facts: local address and host platform.

use crate::error::{MooringError, Result};
use crate::types::Platform;
use once_cell::sync::OnceCell;
use std::net::{Ipv4Addr, SocketAddr, UdpSocket};
use tracing::debug;

static LOCAL_IPV4: OnceCell<Ipv4Addr> = OnceCell::new();

/// The host's local IPv4 address, deterministic for the process lifetime
/// once computed.
///
/// This is the one place where a missing external resource is an error
/// rather than a readiness state: no `ReadinessState` represents "no
/// network", and the stack supervisor cannot proceed without an address for
/// the managed services to advertise on.
pub fn local_ipv4() -> Result<Ipv4Addr> {
    LOCAL_IPV4.get_or_try_init(discover_ipv4).copied()
}

/// Resolve the outbound IPv4 address by asking the OS which source address
/// it would route a public datagram from. Connecting a UDP socket sends no
/// packets.
fn discover_ipv4() -> Result<Ipv4Addr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
        .map_err(|_| MooringError::NoAddressFound)?;
    socket.connect(("8.8.8.8", 80)).map_err(|_| MooringError::NoAddressFound)?;

    match socket.local_addr() {
        Ok(SocketAddr::V4(addr)) if !addr.ip().is_unspecified() => {
            debug!(address = %addr.ip(), "resolved local IPv4 address");
            Ok(*addr.ip())
        }
        _ => Err(MooringError::NoAddressFound),
    }
}

/// Engine download link for the host platform, offered to the user as the
/// remediation action when the runtime is absent.
pub fn engine_download_url(platform: &Platform) -> &'static str {
    match platform {
        Platform::Windows => "https://docs.docker.com/desktop/install/windows-install/",
        Platform::MacOs => "https://docs.docker.com/desktop/install/mac-install/",
        Platform::Linux => "https://docs.docker.com/engine/install/",
        Platform::Other(_) => "https://docs.docker.com/get-docker/",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_url_per_platform() {
        assert!(engine_download_url(&Platform::Linux).contains("engine/install"));
        assert!(engine_download_url(&Platform::MacOs).contains("mac"));
        assert!(engine_download_url(&Platform::Windows).contains("windows"));
    }

    #[test]
    fn test_local_ipv4_is_stable() {
        // Hosts without an IPv4 route report NoAddressFound instead; both
        // outcomes must be consistent across calls.
        match (local_ipv4(), local_ipv4()) {
            (Ok(first), Ok(second)) => assert_eq!(first, second),
            (Err(MooringError::NoAddressFound), Err(MooringError::NoAddressFound)) => {}
            (first, second) => panic!("inconsistent results: {:?} vs {:?}", first, second),
        }
    }
}
