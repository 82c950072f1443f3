//! Error types specific to tag technology transports

/// Transport error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Failed to connect to the technology
    #[error("Failed to connect to tag")]
    Connection,

    /// Failed to transmit data
    #[error("Failed to transmit data")]
    Transmission,

    /// Token left the field or the handle became invalid
    #[error("Tag was lost")]
    TagLost,

    /// Operation attempted before connecting
    #[error("Technology not connected")]
    NotConnected,

    /// Authentication rejected by the token
    #[error("Authentication failed")]
    Authentication,

    /// Operation timed out
    #[error("Operation timed out")]
    Timeout,

    /// Cancelled operation
    #[error("Operation cancelled")]
    Cancelled,

    /// Other error with message
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Create a general other error
    pub fn other<S: Into<String>>(message: S) -> Self {
        Self::Other(message.into())
    }

    /// Whether the error means the token itself is gone, not just one operation
    pub const fn is_tag_lost(&self) -> bool {
        matches!(self, Self::TagLost)
    }
}
