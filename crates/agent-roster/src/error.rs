//! Source-boundary error types.
//!
//! These never escape resolution: tiered sources log them and fall through
//! to the next tier.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    /// Fetch failed (I/O, network, permission).
    #[error("source '{name}' unavailable: {message}")]
    Unavailable { name: String, message: String },

    /// Payload fetched but failed shape validation.
    #[error("source '{name}' returned invalid data: {message}")]
    Invalid { name: String, message: String },

    #[error("source '{name}' timed out after {timeout_ms}ms")]
    Timeout { name: String, timeout_ms: u64 },

    #[error("failed to write '{target}': {message}")]
    Write { target: String, message: String },
}

impl SourceError {
    pub fn unavailable(name: &str, err: impl std::fmt::Display) -> Self {
        Self::Unavailable {
            name: name.to_string(),
            message: err.to_string(),
        }
    }

    pub fn invalid(name: &str, err: impl std::fmt::Display) -> Self {
        Self::Invalid {
            name: name.to_string(),
            message: err.to_string(),
        }
    }
}

pub type SourceResult<T> = std::result::Result<T, SourceError>;
