//! Common error types for primitives

use thiserror::Error;

/// Primitive parsing and conversion errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PrimitiveError {
    /// Invalid hex string
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    /// Input had the wrong number of bytes
    #[error("invalid length: expected {expected} bytes, got {got}")]
    InvalidLength {
        /// Expected byte count (upper bound for variable-length inputs)
        expected: usize,
        /// Actual byte count
        got: usize,
    },
}
