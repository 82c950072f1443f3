//! Technology capabilities a discovered token can advertise

use derive_more::Display;

/// A technology the reader knows how to extract data from
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Capability {
    /// ISO/IEC 14443-3A proximity parameters (NfcA)
    #[display("NfcA")]
    ProximityId,
    /// ISO/IEC 14443-3B proximity parameters (NfcB)
    #[display("NfcB")]
    TypeB,
    /// ISO/IEC 14443-4 transport layer (IsoDep)
    #[display("IsoDep")]
    TransportLayer,
    /// NFC Forum stored message (Ndef)
    #[display("Ndef")]
    SelfDescribingRecord,
    /// Sector-based legacy memory card (MifareClassic)
    #[display("MifareClassic")]
    LegacyMemoryCard,
    /// Page-based memory card (MifareUltralight)
    #[display("MifareUltralight")]
    UltralightMemoryCard,
}

impl Capability {
    /// Every capability, in declaration order
    pub const ALL: [Self; 6] = [
        Self::ProximityId,
        Self::TypeB,
        Self::TransportLayer,
        Self::SelfDescribingRecord,
        Self::LegacyMemoryCard,
        Self::UltralightMemoryCard,
    ];

    /// Look up the capability for a tag reported by the platform
    ///
    /// Accepts short names (`"NfcA"`) and fully qualified class names
    /// (`"android.nfc.tech.NfcA"`). Unknown tags map to `None`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let short = tag.rsplit('.').next().unwrap_or(tag);
        match short {
            "NfcA" => Some(Self::ProximityId),
            "NfcB" => Some(Self::TypeB),
            "IsoDep" => Some(Self::TransportLayer),
            "Ndef" => Some(Self::SelfDescribingRecord),
            "MifareClassic" => Some(Self::LegacyMemoryCard),
            "MifareUltralight" => Some(Self::UltralightMemoryCard),
            _ => None,
        }
    }

    /// Short platform name for this capability
    pub fn tag(&self) -> String {
        self.to_string()
    }
}
