//! Per-capability read errors

use tapkit_core::{DecodeError, TransportError};

/// Failure reading one capability of a token
///
/// These never abort a whole read; the aggregated record keeps the message under the
/// capability's tag.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReadError {
    /// Connect, I/O, or link failure
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Stored data could not be decoded
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// No sector accepted the configured key
    #[error("No sector readable with the default key ({sectors} sectors tried)")]
    NoReadableSectors {
        /// Number of sectors attempted
        sectors: usize,
    },
}
