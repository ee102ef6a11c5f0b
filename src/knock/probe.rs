// ABOUTME: The probe seam: one connection attempt at one (host, port) pair.
// ABOUTME: TcpProbe is the production implementation; tests substitute their own.

use super::spec::IpVersion;
use crate::types::Port;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tokio::net::{TcpStream, lookup_host};

/// Why a single probe attempt failed.
///
/// A knock only needs the packet to reach the host, so "nothing is listening
/// there" is not on this list: a TCP RST back from the target still means the
/// knock was delivered.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to resolve {host}: {source}")]
    Resolution {
        host: String,
        source: std::io::Error,
    },

    #[error("no {0} address found for host")]
    NoMatchingAddress(IpVersion),

    #[error("probe timed out after {0:?}")]
    TimedOut(Duration),

    #[error("probe failed: {0}")]
    Io(#[from] std::io::Error),
}

/// A single connection attempt against one (host, port) pair.
///
/// Implementations must make exactly one attempt per call; retry policy
/// belongs to the caller (and for knocking the policy is "never").
#[async_trait]
pub trait Probe: Send + Sync {
    async fn probe(
        &self,
        host: &str,
        port: Port,
        ip_version: IpVersion,
    ) -> Result<(), ProbeError>;
}

/// Probes by opening (and immediately dropping) a TCP connection.
///
/// No bytes are written; the SYN itself is the knock.
#[derive(Debug, Default)]
pub struct TcpProbe;

#[async_trait]
impl Probe for TcpProbe {
    async fn probe(
        &self,
        host: &str,
        port: Port,
        ip_version: IpVersion,
    ) -> Result<(), ProbeError> {
        let mut addrs = lookup_host((host, port.get()))
            .await
            .map_err(|source| ProbeError::Resolution {
                host: host.to_string(),
                source,
            })?;

        let addr = addrs
            .find(|addr| match ip_version {
                IpVersion::Unspecified => true,
                IpVersion::V4 => addr.is_ipv4(),
                IpVersion::V6 => addr.is_ipv6(),
            })
            .ok_or(ProbeError::NoMatchingAddress(ip_version))?;

        match TcpStream::connect(addr).await {
            Ok(_stream) => Ok(()),
            // An RST reply means the packet reached the host; the knock
            // daemon has seen it even though nothing accepted the connection.
            Err(e) if e.kind() == std::io::ErrorKind::ConnectionRefused => Ok(()),
            Err(e) => Err(ProbeError::Io(e)),
        }
    }
}
