//! Tracer error types

use thiserror::Error;

/// Tracer errors
#[derive(Debug, Error)]
pub enum TracerError {
    /// Configuration could not be parsed
    #[error("invalid tracer config: {0}")]
    Config(#[from] serde_json::Error),
}

/// Result type for tracer operations
pub type TracerResult<T> = Result<T, TracerError>;
