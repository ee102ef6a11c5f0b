// ABOUTME: The knock spec value object: target host, IP version preference, port sequence.
// ABOUTME: Validation runs before any network activity so a bad spec never half-knocks.

use super::error::{Error, Result};
use crate::types::Port;
use serde::Deserialize;
use std::fmt;

/// IP version preference for probes.
///
/// `Unspecified` lets address resolution pick whatever the stack returns first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpVersion {
    #[default]
    Unspecified,
    V4,
    V6,
}

impl fmt::Display for IpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpVersion::Unspecified => write!(f, "any"),
            IpVersion::V4 => write!(f, "IPv4"),
            IpVersion::V6 => write!(f, "IPv6"),
        }
    }
}

/// What to knock: one host, an ordered port sequence, an address-family preference.
///
/// Order is significant. The remote knock daemon only recognizes the exact
/// sequence, so the ports are probed one at a time in the order given here.
#[derive(Debug, Clone)]
pub struct KnockSpec {
    pub host: String,
    pub ip_version: IpVersion,
    pub sequence: Vec<Port>,
}

impl KnockSpec {
    pub fn new(host: impl Into<String>, sequence: Vec<Port>) -> Self {
        Self {
            host: host.into(),
            ip_version: IpVersion::Unspecified,
            sequence,
        }
    }

    pub fn ip_version(mut self, version: IpVersion) -> Self {
        self.ip_version = version;
        self
    }

    /// Check the spec without touching the network.
    ///
    /// Port range is already enforced by the `Port` type, so the only thing
    /// left to reject is an empty hostname.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::InvalidSpec {
                reason: "host cannot be empty".to_string(),
            });
        }
        Ok(())
    }
}
