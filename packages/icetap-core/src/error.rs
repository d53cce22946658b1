//! Centralized error types for the ICY demuxer.
//!
//! Transport failures are never wrapped: they stay `std::io::Error` and
//! reach the audio reader unchanged. [`IcyError`] only covers the places
//! where this crate itself rejects input (configuration and frame text).

use thiserror::Error;

/// Library-wide error type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IcyError {
    /// The advertised metadata interval could not be understood.
    #[error("Invalid metadata interval: {0}")]
    InvalidInterval(String),

    /// A character encoding label that the decoder does not support.
    #[error("Unknown character encoding: {0}")]
    UnknownEncoding(String),

    /// A metadata frame whose bytes are not valid in the chosen encoding.
    #[error("Metadata frame is not valid {encoding}: {reason}")]
    Decode {
        encoding: &'static str,
        reason: String,
    },
}

impl IcyError {
    /// Returns a machine-readable error code for diagnostics.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInterval(_) => "invalid_interval",
            Self::UnknownEncoding(_) => "unknown_encoding",
            Self::Decode { .. } => "frame_decode_failed",
        }
    }
}

/// Convenient Result alias for library operations.
pub type IcyResult<T> = Result<T, IcyError>;
