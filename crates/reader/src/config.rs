//! Configuration options for tag reading

use std::time::Duration;

/// Factory transport key for MIFARE Classic sectors
pub const DEFAULT_KEY: [u8; 6] = [0xFF; 6];

/// Configuration options for tag reading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Key A tried against every MIFARE Classic sector
    pub default_key: [u8; 6],

    /// Pages read from a MIFARE Ultralight before stopping
    pub ultralight_page_limit: u8,

    /// Pages read from a MIFARE Ultralight C before stopping
    pub ultralight_c_page_limit: u8,

    /// Interval the platform uses to check the token is still in the field
    pub presence_check_delay: Duration,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            default_key: DEFAULT_KEY,
            ultralight_page_limit: 16,
            ultralight_c_page_limit: 44,
            presence_check_delay: Duration::from_millis(250),
        }
    }
}

impl ReaderConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the MIFARE Classic key A
    pub const fn with_default_key(mut self, key: [u8; 6]) -> Self {
        self.default_key = key;
        self
    }

    /// Set the Ultralight and Ultralight C page limits
    pub const fn with_ultralight_page_limits(mut self, ultralight: u8, ultralight_c: u8) -> Self {
        self.ultralight_page_limit = ultralight;
        self.ultralight_c_page_limit = ultralight_c;
        self
    }

    /// Set the presence check delay
    pub const fn with_presence_check_delay(mut self, delay: Duration) -> Self {
        self.presence_check_delay = delay;
        self
    }
}
