// ABOUTME: Error types for the port-knock client.
// ABOUTME: A failed knock always identifies the port that broke the sequence.

use super::probe::ProbeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid knock spec: {reason}")]
    InvalidSpec { reason: String },

    #[error("knock failed at port {port}: {source}")]
    ProbeFailed {
        port: u16,
        #[source]
        source: ProbeError,
    },

    #[error("knock cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, Error>;
