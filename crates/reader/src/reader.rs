//! Capability dispatch and result aggregation

use tapkit_core::codec::encode_hex;
use tracing::{debug, info, instrument, warn};

use crate::capability::Capability;
use crate::config::ReaderConfig;
use crate::error::ReadError;
use crate::readers;
use crate::record::{Fields, TagRecord};
use crate::technology::TokenHandle;

/// Reads every capability a token advertises into one [`TagRecord`]
#[derive(Debug, Clone, Default)]
pub struct TagReader {
    config: ReaderConfig,
}

impl TagReader {
    /// Create a reader with the given configuration
    pub const fn new(config: ReaderConfig) -> Self {
        Self { config }
    }

    /// Reader configuration
    pub const fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Read a presented token
    ///
    /// Capabilities are visited in the order the platform reported them. A failing capability
    /// leaves its message under its tag in the record's errors and the next one is still read.
    /// Tags with no known capability are listed but not read, and a capability reported twice
    /// is read once.
    #[instrument(skip_all, fields(uid = %encode_hex(handle.uid())))]
    pub fn read_token(&self, handle: &mut dyn TokenHandle) -> TagRecord {
        let tags = handle.capability_tags();
        let mut record = TagRecord {
            uid: encode_hex(handle.uid()),
            capabilities: tags.clone(),
            ..Default::default()
        };

        let mut visited = Vec::with_capacity(tags.len());
        for tag in &tags {
            let Some(capability) = Capability::from_tag(tag) else {
                debug!(tag, "Ignoring unsupported capability");
                continue;
            };
            if visited.contains(&capability) {
                continue;
            }
            visited.push(capability);

            let mut fields = Fields::new();
            let result = self.read_capability(handle, capability, &mut fields);
            record.fields.append(&mut fields);

            if let Err(e) = result {
                warn!(tag, %capability, error = %e, "Capability read failed");
                record.per_capability_errors.insert(tag.clone(), e.to_string());
            }
        }

        info!(
            capabilities = record.capabilities.len(),
            errors = record.per_capability_errors.len(),
            "Token read"
        );
        record
    }

    fn read_capability(
        &self,
        handle: &mut dyn TokenHandle,
        capability: Capability,
        fields: &mut Fields,
    ) -> Result<(), ReadError> {
        match capability {
            Capability::ProximityId => match handle.nfc_a() {
                Some(tech) => readers::read_nfc_a(tech, fields),
                None => Ok(()),
            },
            Capability::TypeB => match handle.nfc_b() {
                Some(tech) => readers::read_nfc_b(tech, fields),
                None => Ok(()),
            },
            Capability::TransportLayer => match handle.iso_dep() {
                Some(tech) => readers::read_iso_dep(tech, fields),
                None => Ok(()),
            },
            Capability::SelfDescribingRecord => match handle.ndef() {
                Some(tech) => readers::read_ndef(tech, fields),
                None => Ok(()),
            },
            Capability::LegacyMemoryCard => match handle.mifare_classic() {
                Some(tech) => readers::read_mifare_classic(tech, &self.config, fields),
                None => Ok(()),
            },
            Capability::UltralightMemoryCard => match handle.mifare_ultralight() {
                Some(tech) => readers::read_ultralight(tech, &self.config, fields),
                None => Ok(()),
            },
        }
    }
}
