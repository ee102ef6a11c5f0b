// ABOUTME: The sequential knock loop: one bounded attempt per port, in order, no retries.
// ABOUTME: The first transport failure aborts the rest of the sequence.

use super::error::{Error, Result};
use super::probe::{Probe, ProbeError, TcpProbe};
use super::spec::KnockSpec;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Per-attempt timeout used when the caller does not configure one.
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_millis(200);

/// Cooperative cancellation for an in-flight knock.
///
/// Cancellation is observed at port boundaries: a probe already in flight
/// runs to its timeout, but no further probe is started once the token is
/// cancelled.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Executes knock sequences against remote hosts.
///
/// Each call owns its transport resources and shares nothing with other
/// calls, so knocking different hosts concurrently is safe. Serializing
/// knock-then-connect toward a single host is the caller's job.
pub struct KnockClient {
    probe: Box<dyn Probe>,
    attempt_timeout: Duration,
}

impl Default for KnockClient {
    fn default() -> Self {
        Self::new()
    }
}

impl KnockClient {
    pub fn new() -> Self {
        Self::with_probe(Box::new(TcpProbe))
    }

    /// Build a client over a custom probe implementation.
    pub fn with_probe(probe: Box<dyn Probe>) -> Self {
        Self {
            probe,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }

    /// Override the per-attempt timeout. Applies to each port independently.
    pub fn attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    /// Knock the full sequence, without external cancellation.
    pub async fn knock(&self, spec: &KnockSpec) -> Result<()> {
        self.knock_with_cancel(spec, &CancelToken::new()).await
    }

    /// Knock the full sequence, checking `cancel` before each port.
    ///
    /// Ports are probed strictly in sequence order, exactly once each.
    /// Retrying a port would desynchronize the sequence as seen by the
    /// remote knock daemon, so a failed probe aborts the whole knock and
    /// reports the failing port. An empty sequence succeeds trivially.
    pub async fn knock_with_cancel(&self, spec: &KnockSpec, cancel: &CancelToken) -> Result<()> {
        spec.validate()?;

        for port in &spec.sequence {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            tracing::debug!(host = %spec.host, port = %port, "knocking");

            let attempt = self.probe.probe(&spec.host, *port, spec.ip_version);
            match tokio::time::timeout(self.attempt_timeout, attempt).await {
                Ok(Ok(())) => {
                    tracing::debug!(host = %spec.host, port = %port, "knock delivered");
                }
                Ok(Err(source)) => {
                    return Err(Error::ProbeFailed {
                        port: port.get(),
                        source,
                    });
                }
                Err(_elapsed) => {
                    return Err(Error::ProbeFailed {
                        port: port.get(),
                        source: ProbeError::TimedOut(self.attempt_timeout),
                    });
                }
            }
        }

        Ok(())
    }
}
