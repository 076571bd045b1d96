//! Error types for proxy validation runs.

use crate::proxy::models::ProtocolKind;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CheckError {
    #[error("Invalid target URL: {0}")]
    InvalidTarget(String),

    #[error("Timeout")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected HTTP status: {0}")]
    NonSuccessStatus(u16),

    #[error("Failed to download proxies from {url}: {reason}")]
    SourceUnavailable { url: String, reason: String },

    #[error("Error occurred while saving proxies to {}: {source}", path.display())]
    PersistFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid protocol selection: {0}")]
    UnknownProtocol(String),

    #[error("No proxies were downloaded for {0}")]
    NoCandidates(ProtocolKind),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CheckError {
    /// Whether this error ends a run before any probing
    pub fn is_abort(&self) -> bool {
        matches!(
            self,
            CheckError::UnknownProtocol(_) | CheckError::NoCandidates(_)
        )
    }
}
