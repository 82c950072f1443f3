//! Host-facing errors

use tapkit_core::{Error, TransportError};

/// Error returned across the host boundary
///
/// Every variant maps to a stable [`code`](BridgeError::code) the host application matches on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
    /// Missing or malformed caller input
    #[error("{0}")]
    InvalidArgs(String),

    /// NFC adapter absent or disabled
    #[error("NFC is not available or disabled")]
    Unavailable,

    /// Reader session superseded or stopped
    #[error("{0}")]
    Cancelled(String),

    /// Platform or token I/O failure
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Token could not be read at all
    #[error("{0}")]
    Read(String),
}

impl BridgeError {
    /// Stable code for the host channel
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidArgs(_) => "INVALID_ARGS",
            Self::Unavailable => "NFC_UNAVAILABLE",
            Self::Cancelled(_) => "NFC_CANCELLED",
            Self::Transport(_) => "NFC_ERROR",
            Self::Read(_) => "NFC_READ_ERROR",
        }
    }

    /// Create a cancellation error
    pub fn cancelled<S: Into<String>>(message: S) -> Self {
        Self::Cancelled(message.into())
    }
}

impl From<Error> for BridgeError {
    fn from(error: Error) -> Self {
        match error.root() {
            Error::InvalidArgument(message) => Self::InvalidArgs(message.clone()),
            Error::Unavailable(_) => Self::Unavailable,
            Error::Cancelled => Self::cancelled("Operation cancelled"),
            Error::Transport(e) => Self::Transport(e.clone()),
            other => Self::Transport(TransportError::other(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tapkit_core::ResultExt;

    #[test]
    fn test_codes() {
        assert_eq!(BridgeError::InvalidArgs("x".into()).code(), "INVALID_ARGS");
        assert_eq!(BridgeError::Unavailable.code(), "NFC_UNAVAILABLE");
        assert_eq!(BridgeError::cancelled("New scan started").code(), "NFC_CANCELLED");
        assert_eq!(BridgeError::from(TransportError::Timeout).code(), "NFC_ERROR");
        assert_eq!(BridgeError::Read("no tags".into()).code(), "NFC_READ_ERROR");
    }

    #[test]
    fn test_from_core_error_uses_root() {
        let result: Result<(), Error> = Err(Error::invalid_argument("bad hex"));
        let error = result.context("Activating badge").unwrap_err();

        assert_eq!(BridgeError::from(error), BridgeError::InvalidArgs("bad hex".into()));
        assert_eq!(
            BridgeError::from(Error::from(TransportError::TagLost)),
            BridgeError::Transport(TransportError::TagLost)
        );
    }
}
