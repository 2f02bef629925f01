//! ABI error types

use thiserror::Error;

/// ABI operation error.
///
/// `BadData` covers malformed on-wire bytes (wrong length, out-of-range
/// offset, invalid UTF-8); `InvalidArgument` covers caller mistakes
/// (unknown fragment, wrong arity, out-of-range values).
#[derive(Debug, Error)]
pub enum AbiError {
    /// Malformed encoded data
    #[error("bad data: {0}")]
    BadData(String),

    /// Caller-supplied value fails a precondition
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl AbiError {
    /// Shorthand for a `BadData` error
    pub fn bad_data(msg: impl Into<String>) -> Self {
        AbiError::BadData(msg.into())
    }

    /// Shorthand for an `InvalidArgument` error
    pub fn invalid(msg: impl Into<String>) -> Self {
        AbiError::InvalidArgument(msg.into())
    }
}
