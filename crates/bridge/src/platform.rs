//! Platform NFC adapter seam

use std::fmt;
use std::time::Duration;

use tapkit_core::TransportError;

/// Operations the bridge needs from the device's NFC adapter
///
/// Discovered tokens are not returned from here; the platform glue hands each one to
/// [`BadgeBridge::on_token_discovered`](crate::BadgeBridge::on_token_discovered) while reader
/// mode is enabled.
pub trait NfcPlatform: Send + Sync + fmt::Debug {
    /// Whether the device has an NFC adapter at all
    fn has_adapter(&self) -> bool;

    /// Whether the adapter is present and switched on
    fn is_enabled(&self) -> Result<bool, TransportError>;

    /// Whether the device can emulate a card
    fn supports_emulation(&self) -> Result<bool, TransportError>;

    /// Route frames for `identifier` to this application
    fn register_identifier(&self, identifier: &str, category: &str) -> Result<(), TransportError>;

    /// Start polling for tokens
    fn enable_reader_mode(&self, presence_check_delay: Duration) -> Result<(), TransportError>;

    /// Stop polling for tokens
    fn disable_reader_mode(&self) -> Result<(), TransportError>;
}
