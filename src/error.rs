//! Centralized error types for hdrbridge.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the hdrbridge library.
#[derive(Error, Debug)]
pub enum HeaderError {
    /// The requested address field is absent or empty.
    ///
    /// This is the expected outcome for optional fields such as `Cc`; callers
    /// should not report it as a failure.
    #[error("Header field not present: {0}")]
    FieldNotPresent(String),

    /// A header value could not be decoded (RFC 2047).
    #[error("Header decoding error: {0}")]
    DecodeFailure(String),

    /// An address list could not be parsed, even after bracket recovery.
    #[error("Address list parse error: {0}")]
    AddressParseFailure(String),

    /// I/O error with the associated file path.
    #[error("I/O error reading '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Input handed to the CLI or library was not usable.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Convenience alias for `Result<T, HeaderError>`.
pub type Result<T> = std::result::Result<T, HeaderError>;

impl HeaderError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// `true` for [`HeaderError::FieldNotPresent`].
    pub fn is_not_present(&self) -> bool {
        matches!(self, Self::FieldNotPresent(_))
    }
}
