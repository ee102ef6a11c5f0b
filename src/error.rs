// ABOUTME: Application-wide error types for krouo.
// ABOUTME: Uses thiserror for ergonomic error handling.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("configuration file not found in {0}")]
    ConfigNotFound(PathBuf),

    #[error("unknown target: {0}")]
    UnknownTarget(String),

    #[error("knock failed for {host}: {source}")]
    Knock {
        host: String,
        #[source]
        source: crate::knock::Error,
    },

    #[error("SSH error for {host}: {source}")]
    Ssh {
        host: String,
        #[source]
        source: crate::ssh::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
