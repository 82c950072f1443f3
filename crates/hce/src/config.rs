//! Configuration options for the emulation engine

use std::time::Duration;

/// Default exposure window for an activated credential
pub const DEFAULT_EXPOSURE_WINDOW: Duration = Duration::from_secs(30);

/// Configuration options for the emulation engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmulationConfig {
    /// How long an activated payload stays answerable before it is erased
    pub exposure_window: Duration,
}

impl Default for EmulationConfig {
    fn default() -> Self {
        Self {
            exposure_window: DEFAULT_EXPOSURE_WINDOW,
        }
    }
}

impl EmulationConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the exposure window
    pub const fn with_exposure_window(mut self, window: Duration) -> Self {
        self.exposure_window = window;
        self
    }
}
