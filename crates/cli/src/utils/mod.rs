//! Utility functions and types for the tapkit CLI

pub(crate) mod display;

use std::time::Duration;

use tapkit_bridge::NfcPlatform;
use tapkit_core::TransportError;
use tracing::{debug, info};

/// Adapter that is always present and enabled, logging what a device would do
#[derive(Debug, Default)]
pub(crate) struct SimulatorPlatform;

impl NfcPlatform for SimulatorPlatform {
    fn has_adapter(&self) -> bool {
        true
    }

    fn is_enabled(&self) -> Result<bool, TransportError> {
        Ok(true)
    }

    fn supports_emulation(&self) -> Result<bool, TransportError> {
        Ok(true)
    }

    fn register_identifier(&self, identifier: &str, category: &str) -> Result<(), TransportError> {
        info!(identifier, category, "Identifier routed to simulator");
        Ok(())
    }

    fn enable_reader_mode(&self, presence_check_delay: Duration) -> Result<(), TransportError> {
        debug!(?presence_check_delay, "Reader mode enabled");
        Ok(())
    }

    fn disable_reader_mode(&self) -> Result<(), TransportError> {
        debug!("Reader mode disabled");
        Ok(())
    }
}
