//! Configuration options for the badge bridge

use tapkit_hce::EmulationConfig;
use tapkit_reader::ReaderConfig;

/// Routing category the emulated identifier is registered under
pub const DEFAULT_ROUTE_CATEGORY: &str = "other";

/// Configuration options for the badge bridge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Emulation engine options
    pub emulation: EmulationConfig,

    /// Tag reader options
    pub reader: ReaderConfig,

    /// Category passed to the platform when registering the identifier
    pub route_category: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            emulation: EmulationConfig::default(),
            reader: ReaderConfig::default(),
            route_category: DEFAULT_ROUTE_CATEGORY.to_string(),
        }
    }
}

impl BridgeConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the emulation options
    pub fn with_emulation(mut self, emulation: EmulationConfig) -> Self {
        self.emulation = emulation;
        self
    }

    /// Set the reader options
    pub fn with_reader(mut self, reader: ReaderConfig) -> Self {
        self.reader = reader;
        self
    }

    /// Set the routing category
    pub fn with_route_category(mut self, category: impl Into<String>) -> Self {
        self.route_category = category.into();
        self
    }
}
