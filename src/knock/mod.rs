// ABOUTME: Port-knock client module.
// ABOUTME: Probes an ordered port sequence on a host before the SSH connection is attempted.

mod client;
mod error;
mod probe;
mod spec;

pub use client::{CancelToken, DEFAULT_ATTEMPT_TIMEOUT, KnockClient};
pub use error::{Error, Result};
pub use probe::{Probe, ProbeError, TcpProbe};
pub use spec::{IpVersion, KnockSpec};
