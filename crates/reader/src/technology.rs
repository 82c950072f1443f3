//! Technology traits a platform driver implements for a discovered token
//!
//! A [`TokenHandle`] describes one presented token: its identifier, the capability tags the
//! platform discovered, and accessors for each technology object. Every technology extends
//! [`TagTechnology`] so the reader can wrap it in a [`Connection`](tapkit_core::Connection).

use std::fmt;

use bytes::Bytes;
use serde::Deserialize;
use tapkit_core::{TagTechnology, TransportError};

use crate::ndef::NdefMessage;

/// ISO/IEC 14443-3A parameters
pub trait NfcA: TagTechnology {
    /// Answer to request, type A
    fn atqa(&self) -> Bytes;

    /// Select acknowledge
    fn sak(&self) -> u8;
}

/// ISO/IEC 14443-3B parameters
pub trait NfcB: TagTechnology {
    /// Application data from the ATQB
    fn application_data(&self) -> Option<Bytes>;

    /// Protocol info from the ATQB
    fn protocol_info(&self) -> Option<Bytes>;
}

/// ISO/IEC 14443-4 transport layer
pub trait IsoDep: TagTechnology {
    /// Historical bytes from the ATS (type A tokens)
    fn historical_bytes(&self) -> Option<Bytes>;

    /// Higher layer response from ATTRIB (type B tokens)
    fn hi_layer_response(&self) -> Option<Bytes>;

    /// Whether extended length APDUs are accepted
    fn is_extended_length_supported(&self) -> bool;
}

/// NFC Forum stored message access
pub trait Ndef: TagTechnology {
    /// Platform name of the NFC Forum tag type
    fn ndef_type(&self) -> String;

    /// Capacity of the message area in bytes
    fn max_size(&self) -> usize;

    /// Whether the message can be rewritten
    fn is_writable(&self) -> bool;

    /// Message cached by the platform at discovery time
    fn cached_message(&self) -> Option<NdefMessage>;

    /// Read the stored message from the token
    ///
    /// Returns `Ok(None)` when the token holds no message.
    fn read_raw_message(&mut self) -> Result<Option<Bytes>, TransportError>;
}

/// MIFARE Classic product family
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum MifareClassicType {
    /// Classic 1K/4K/Mini
    #[default]
    Classic,
    /// MIFARE Plus in SL1
    Plus,
    /// MIFARE Pro
    Pro,
    /// Unrecognised
    Unknown,
}

impl MifareClassicType {
    /// Name used in the read record
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Classic => "Classic",
            Self::Plus => "Plus",
            Self::Pro => "Pro",
            Self::Unknown => "Unknown",
        }
    }
}

/// MIFARE Classic block size in bytes
pub const MIFARE_BLOCK_SIZE: usize = 16;

/// Sector-based memory card with per-sector keys
pub trait MifareClassic: TagTechnology {
    /// Product family
    fn card_type(&self) -> MifareClassicType;

    /// Total memory size in bytes
    fn size(&self) -> usize;

    /// Number of sectors
    fn sector_count(&self) -> usize;

    /// Number of blocks across all sectors
    fn block_count(&self) -> usize;

    /// Authenticate a sector with key A
    ///
    /// `Ok(false)` means the token rejected the key.
    fn authenticate_sector_with_key_a(
        &mut self,
        sector: usize,
        key: &[u8; 6],
    ) -> Result<bool, TransportError>;

    /// Read one 16-byte block
    fn read_block(&mut self, block: usize) -> Result<Bytes, TransportError>;

    /// Number of blocks in the given sector
    ///
    /// Sectors below 32 hold 4 blocks, the larger sectors of a 4K card hold 16.
    fn block_count_in_sector(&self, sector: usize) -> usize {
        if sector < 32 { 4 } else { 16 }
    }

    /// Index of the first block of the given sector
    fn sector_to_block(&self, sector: usize) -> usize {
        if sector < 32 {
            sector * 4
        } else {
            32 * 4 + (sector - 32) * 16
        }
    }
}

/// MIFARE Ultralight product family
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum UltralightType {
    /// Ultralight
    #[default]
    Ultralight,
    /// Ultralight C
    #[serde(alias = "Ultralight C")]
    UltralightC,
    /// Unrecognised
    Unknown,
}

impl UltralightType {
    /// Name used in the read record
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ultralight => "Ultralight",
            Self::UltralightC => "Ultralight C",
            Self::Unknown => "Unknown",
        }
    }
}

/// Ultralight READ command code
pub const ULTRALIGHT_READ: u8 = 0x30;

/// Page-based memory card
pub trait MifareUltralight: TagTechnology {
    /// Product family
    fn ultralight_type(&self) -> UltralightType;

    /// Read four consecutive 4-byte pages starting at `page`
    ///
    /// Sends the READ command through [`TagTechnology::transceive`]; the card wraps around past
    /// its last page and NAKs reads into a protected region.
    fn read_pages(&mut self, page: u8) -> Result<Bytes, TransportError> {
        self.transceive(&[ULTRALIGHT_READ, page])
    }
}

/// A presented token and its technology objects
///
/// Accessors return `None` when the platform cannot produce the technology even though it
/// reported the tag.
pub trait TokenHandle: fmt::Debug {
    /// Token identifier
    fn uid(&self) -> &[u8];

    /// Capability tags in the order the platform reported them
    fn capability_tags(&self) -> Vec<String>;

    /// NfcA technology
    fn nfc_a(&mut self) -> Option<&mut dyn NfcA> {
        None
    }

    /// NfcB technology
    fn nfc_b(&mut self) -> Option<&mut dyn NfcB> {
        None
    }

    /// IsoDep technology
    fn iso_dep(&mut self) -> Option<&mut dyn IsoDep> {
        None
    }

    /// Ndef technology
    fn ndef(&mut self) -> Option<&mut dyn Ndef> {
        None
    }

    /// MifareClassic technology
    fn mifare_classic(&mut self) -> Option<&mut dyn MifareClassic> {
        None
    }

    /// MifareUltralight technology
    fn mifare_ultralight(&mut self) -> Option<&mut dyn MifareUltralight> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Geometry(usize);

    impl TagTechnology for Geometry {
        fn name(&self) -> &'static str {
            "Geometry"
        }

        fn do_connect(&mut self) -> Result<(), TransportError> {
            Ok(())
        }

        fn do_close(&mut self) -> Result<(), TransportError> {
            Ok(())
        }

        fn is_connected(&self) -> bool {
            false
        }

        fn max_transceive_length(&self) -> usize {
            253
        }
    }

    impl MifareClassic for Geometry {
        fn card_type(&self) -> MifareClassicType {
            MifareClassicType::Classic
        }

        fn size(&self) -> usize {
            self.0 * 1024
        }

        fn sector_count(&self) -> usize {
            if self.0 == 4 { 40 } else { 16 }
        }

        fn block_count(&self) -> usize {
            if self.0 == 4 { 256 } else { 64 }
        }

        fn authenticate_sector_with_key_a(
            &mut self,
            _sector: usize,
            _key: &[u8; 6],
        ) -> Result<bool, TransportError> {
            Ok(false)
        }

        fn read_block(&mut self, _block: usize) -> Result<Bytes, TransportError> {
            Err(TransportError::NotConnected)
        }
    }

    #[test]
    fn test_sector_geometry_1k() {
        let card = Geometry(1);
        assert_eq!(card.sector_to_block(0), 0);
        assert_eq!(card.sector_to_block(15), 60);
        assert_eq!(card.block_count_in_sector(15), 4);
    }

    #[test]
    fn test_sector_geometry_4k() {
        let card = Geometry(4);
        assert_eq!(card.sector_to_block(31), 124);
        assert_eq!(card.sector_to_block(32), 128);
        assert_eq!(card.block_count_in_sector(32), 16);
        assert_eq!(card.sector_to_block(39), 240);

        let last = card.sector_count() - 1;
        assert_eq!(
            card.sector_to_block(last) + card.block_count_in_sector(last),
            card.block_count()
        );
    }

    #[test]
    fn test_type_names() {
        assert_eq!(MifareClassicType::Plus.as_str(), "Plus");
        assert_eq!(UltralightType::UltralightC.as_str(), "Ultralight C");
    }
}
