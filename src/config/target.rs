// ABOUTME: Target host configuration: SSH endpoint plus its knock sequence.
// ABOUTME: Parses compact formats like "host", "user@host", "host:port", "user@host:port".

use crate::knock::{DEFAULT_ATTEMPT_TIMEOUT, IpVersion, KnockSpec};
use crate::types::Port;
use serde::{Deserialize, Deserializer};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    pub host: String,

    #[serde(default = "default_ssh_port")]
    pub port: u16,

    #[serde(default)]
    pub user: Option<String>,

    /// Address family for knock probes. Absent means either.
    #[serde(default)]
    pub ip_version: IpVersion,

    /// Ordered port-knock sequence. Absent or empty means no knocking: the
    /// SSH connection proceeds directly.
    #[serde(default, deserialize_with = "deserialize_knock_sequence")]
    pub knock_sequence: Vec<Port>,

    /// Per-attempt probe timeout.
    #[serde(default = "default_knock_timeout", with = "humantime_serde")]
    pub knock_timeout: Duration,

    #[serde(default = "default_trust_first_connection")]
    pub trust_first_connection: bool,
}

fn default_ssh_port() -> u16 {
    22
}

fn default_knock_timeout() -> Duration {
    DEFAULT_ATTEMPT_TIMEOUT
}

fn default_trust_first_connection() -> bool {
    true
}

impl TargetConfig {
    pub fn parse(s: &str) -> Result<Self, String> {
        let s = s.trim();
        if s.is_empty() {
            return Err("target address cannot be empty".to_string());
        }

        // Format: [user@]host[:port]
        let (user, rest) = match s.split_once('@') {
            Some((user, rest)) => (Some(user), rest),
            None => (None, s),
        };

        let (host, port) = match rest.rsplit_once(':') {
            Some((host, port_str)) => {
                let port = port_str
                    .parse::<u16>()
                    .map_err(|_| format!("invalid port: {}", port_str))?;
                (host, port)
            }
            None => (rest, 22),
        };

        if host.is_empty() {
            return Err("hostname cannot be empty".to_string());
        }

        Ok(TargetConfig {
            host: host.to_string(),
            port,
            user: user.map(|u| u.to_string()),
            ip_version: IpVersion::default(),
            knock_sequence: Vec::new(),
            knock_timeout: default_knock_timeout(),
            trust_first_connection: true,
        })
    }

    /// Build the knock spec for this target.
    pub fn knock_spec(&self) -> KnockSpec {
        KnockSpec::new(&self.host, self.knock_sequence.clone()).ip_version(self.ip_version)
    }
}

fn deserialize_knock_sequence<'de, D>(deserializer: D) -> Result<Vec<Port>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<u16> = Vec::deserialize(deserializer)?;
    raw.into_iter()
        .map(|p| Port::new(p).map_err(serde::de::Error::custom))
        .collect()
}
