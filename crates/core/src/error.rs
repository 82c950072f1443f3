//! Core error type for emulation and reading operations
//!
//! Variants follow the failure taxonomy used across the workspace: caller-input errors surface
//! synchronously, transport failures wrap [`TransportError`], and malformed self-describing
//! payloads are reported through [`DecodeError`] so they can be localized to a single record.

use crate::transport::TransportError;

/// Result type alias using the core [`Error`]
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Core error type that encompasses all possible errors in the crate
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    /// Malformed caller input (bad hex, missing identifier or payload)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Required platform capability absent or disabled
    #[error("Unavailable: {0}")]
    Unavailable(String),

    /// Operation superseded or explicitly stopped
    #[error("Operation cancelled")]
    Cancelled,

    /// I/O failure talking to a token or platform service
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Malformed self-describing payload
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Command frame shorter than its fixed header
    #[error("Invalid command length: {0}")]
    InvalidCommandLength(usize),

    /// Command data field longer than a short Lc can carry
    #[error("Command data too long: {0} bytes")]
    DataTooLong(usize),

    /// Context error with message and source error
    #[error("{context}: {source}")]
    Context {
        /// Contextual message
        context: String,
        /// Source error
        source: Box<Self>,
    },
}

impl Error {
    /// Create a new error with context information
    pub fn with_context<S: Into<String>>(self, context: S) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Create a new invalid argument error
    pub fn invalid_argument<S: Into<String>>(message: S) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Create a new unavailable error
    pub fn unavailable<S: Into<String>>(message: S) -> Self {
        Self::Unavailable(message.into())
    }

    /// The innermost error, with any context layers removed
    pub fn root(&self) -> &Self {
        match self {
            Self::Context { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Errors raised while decoding hex input or self-describing records
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum DecodeError {
    /// Hex input had an odd number of digits after separators were removed
    #[error("Odd number of hex digits: {0}")]
    OddLength(usize),

    /// Hex input contained a character that is neither a digit nor a separator
    #[error("Invalid hex character {character:?} at position {index}")]
    InvalidHexCharacter {
        /// Offending character
        character: char,
        /// Position in the input after separators were removed
        index: usize,
    },

    /// Record or message ended before a declared length was satisfied
    #[error("Truncated {0}")]
    Truncated(&'static str),

    /// Record structure not supported by the decoder
    #[error("Unsupported record structure: {0}")]
    Unsupported(&'static str),
}

/// Extension trait for Result with core Errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context<S: Into<String>>(self, context: S) -> Result<T, Error>;
}

impl<T, E: Into<Error>> ResultExt<T> for Result<T, E> {
    fn context<S: Into<String>>(self, context: S) -> Result<T, Error> {
        self.map_err(|e| e.into().with_context(context))
    }
}
