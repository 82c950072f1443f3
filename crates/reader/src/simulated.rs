//! In-memory token implementing every technology
//!
//! A [`SimulatedToken`] is described in JSON (byte fields as hex) and stands in for a platform
//! driver in tests and in the command-line simulator. Each technology tracks its own link, so a
//! test can check that every connection was closed after a read.
//!
//! ```
//! use tapkit_reader::{SimulatedToken, TagReader};
//!
//! let mut token: SimulatedToken = serde_json::from_str(
//!     r#"{ "uid": "04A1B2C3", "nfcA": { "atqa": "0400", "sak": 8 } }"#,
//! )
//! .unwrap();
//!
//! let record = TagReader::default().read_token(&mut token);
//! assert_eq!(record.uid, "04A1B2C3");
//! assert_eq!(record.capabilities, ["NfcA"]);
//! assert_eq!(token.open_connections(), 0);
//! ```

use bytes::Bytes;
use serde::{Deserialize, Deserializer};
use tapkit_core::codec::decode_hex;
use tapkit_core::{TagTechnology, TransportError};

use crate::capability::Capability;
use crate::config::DEFAULT_KEY;
use crate::ndef::{NdefMessage, RawRecord, Tnf};
use crate::technology::{
    IsoDep, MIFARE_BLOCK_SIZE, MifareClassic, MifareClassicType, MifareUltralight, Ndef, NfcA,
    NfcB, TokenHandle, ULTRALIGHT_READ, UltralightType,
};

/// Bytes per Ultralight page
const PAGE_SIZE: usize = 4;

/// Link state shared by every simulated technology
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Link {
    /// Refuse every connect
    pub fail_connect: bool,
    /// Report the token as gone on every operation
    pub lost: bool,
    /// Frame size reported to the reader
    pub max_transceive_length: usize,
    /// Connect calls that succeeded
    #[serde(skip)]
    pub connects: usize,
    #[serde(skip)]
    connected: bool,
}

impl Default for Link {
    fn default() -> Self {
        Self {
            fail_connect: false,
            lost: false,
            max_transceive_length: 253,
            connects: 0,
            connected: false,
        }
    }
}

impl Link {
    fn connect(&mut self) -> Result<(), TransportError> {
        if self.lost {
            return Err(TransportError::TagLost);
        }
        if self.fail_connect {
            return Err(TransportError::Connection);
        }
        self.connected = true;
        self.connects += 1;
        Ok(())
    }

    fn check(&self) -> Result<(), TransportError> {
        if self.lost {
            Err(TransportError::TagLost)
        } else if !self.connected {
            Err(TransportError::NotConnected)
        } else {
            Ok(())
        }
    }
}

macro_rules! impl_simulated_technology {
    ($($ty:ty => $name:literal),* $(,)?) => {$(
        impl TagTechnology for $ty {
            fn name(&self) -> &'static str {
                $name
            }

            fn do_connect(&mut self) -> Result<(), TransportError> {
                self.link.connect()
            }

            fn do_close(&mut self) -> Result<(), TransportError> {
                self.link.connected = false;
                Ok(())
            }

            fn is_connected(&self) -> bool {
                self.link.connected
            }

            fn max_transceive_length(&self) -> usize {
                self.link.max_transceive_length
            }
        }
    )*};
}

/// Simulated ISO/IEC 14443-3A parameters
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimulatedNfcA {
    /// Link behaviour
    #[serde(flatten)]
    pub link: Link,
    /// Answer to request
    #[serde(deserialize_with = "hex_bytes")]
    pub atqa: Vec<u8>,
    /// Select acknowledge
    pub sak: u8,
}

impl NfcA for SimulatedNfcA {
    fn atqa(&self) -> Bytes {
        Bytes::copy_from_slice(&self.atqa)
    }

    fn sak(&self) -> u8 {
        self.sak
    }
}

/// Simulated ISO/IEC 14443-3B parameters
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimulatedNfcB {
    /// Link behaviour
    #[serde(flatten)]
    pub link: Link,
    /// Application data
    #[serde(deserialize_with = "optional_hex_bytes")]
    pub application_data: Option<Vec<u8>>,
    /// Protocol info
    #[serde(deserialize_with = "optional_hex_bytes")]
    pub protocol_info: Option<Vec<u8>>,
}

impl NfcB for SimulatedNfcB {
    fn application_data(&self) -> Option<Bytes> {
        self.application_data.as_deref().map(Bytes::copy_from_slice)
    }

    fn protocol_info(&self) -> Option<Bytes> {
        self.protocol_info.as_deref().map(Bytes::copy_from_slice)
    }
}

/// Simulated ISO/IEC 14443-4 transport layer
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimulatedIsoDep {
    /// Link behaviour
    #[serde(flatten)]
    pub link: Link,
    /// Historical bytes
    #[serde(deserialize_with = "optional_hex_bytes")]
    pub historical_bytes: Option<Vec<u8>>,
    /// Higher layer response
    #[serde(deserialize_with = "optional_hex_bytes")]
    pub hi_layer_response: Option<Vec<u8>>,
    /// Extended length APDU support
    pub extended_length: bool,
}

impl IsoDep for SimulatedIsoDep {
    fn historical_bytes(&self) -> Option<Bytes> {
        self.historical_bytes.as_deref().map(Bytes::copy_from_slice)
    }

    fn hi_layer_response(&self) -> Option<Bytes> {
        self.hi_layer_response.as_deref().map(Bytes::copy_from_slice)
    }

    fn is_extended_length_supported(&self) -> bool {
        self.extended_length
    }
}

/// A record described in a simulated token
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SimulatedRecord {
    /// Well-known text record
    Text {
        /// Language code
        #[serde(default)]
        language: String,
        /// Body
        text: String,
    },
    /// Well-known URI record
    Uri {
        /// Prefix code
        #[serde(default)]
        prefix: u8,
        /// Remainder after the prefix
        rest: String,
    },
    /// Any other record
    Raw {
        /// Type name format
        tnf: u8,
        /// Record type
        #[serde(rename = "type", deserialize_with = "hex_bytes")]
        record_type: Vec<u8>,
        /// Payload
        #[serde(default, deserialize_with = "hex_bytes")]
        payload: Vec<u8>,
    },
}

impl From<&SimulatedRecord> for RawRecord {
    fn from(record: &SimulatedRecord) -> Self {
        match record {
            SimulatedRecord::Text { language, text } => Self::text(language, text),
            SimulatedRecord::Uri { prefix, rest } => Self::uri(*prefix, rest),
            SimulatedRecord::Raw {
                tnf,
                record_type,
                payload,
            } => Self::new(Tnf::from_bits(*tnf), record_type.clone(), payload.clone()),
        }
    }
}

/// Simulated NFC Forum stored message
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimulatedNdef {
    /// Link behaviour
    #[serde(flatten)]
    pub link: Link,
    /// Platform tag type name
    pub ndef_type: String,
    /// Message area capacity
    pub max_size: usize,
    /// Whether the message is writable
    pub writable: bool,
    /// Whether the platform cached the message at discovery
    pub cached: bool,
    /// Stored records
    pub records: Vec<SimulatedRecord>,
    /// Stored message bytes, used instead of `records` when set
    #[serde(deserialize_with = "optional_hex_bytes")]
    pub raw_message: Option<Vec<u8>>,
}

impl Default for SimulatedNdef {
    fn default() -> Self {
        Self {
            link: Link::default(),
            ndef_type: "org.nfcforum.ndef.type2".to_string(),
            max_size: 137,
            writable: true,
            cached: true,
            records: Vec::new(),
            raw_message: None,
        }
    }
}

impl SimulatedNdef {
    fn message(&self) -> Option<NdefMessage> {
        if self.records.is_empty() {
            return None;
        }
        Some(self.records.iter().map(RawRecord::from).collect::<Vec<_>>().into())
    }
}

impl Ndef for SimulatedNdef {
    fn ndef_type(&self) -> String {
        self.ndef_type.clone()
    }

    fn max_size(&self) -> usize {
        self.max_size
    }

    fn is_writable(&self) -> bool {
        self.writable
    }

    fn cached_message(&self) -> Option<NdefMessage> {
        if !self.cached || self.raw_message.is_some() {
            return None;
        }
        self.message()
    }

    fn read_raw_message(&mut self) -> Result<Option<Bytes>, TransportError> {
        self.link.check()?;
        if let Some(raw) = &self.raw_message {
            return Ok(Some(Bytes::copy_from_slice(raw)));
        }
        Ok(self.message().map(|message| message.to_bytes()))
    }
}

/// One sector of a simulated MIFARE Classic
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimulatedSector {
    /// Key A; the factory key when absent
    #[serde(deserialize_with = "optional_hex_bytes")]
    pub key: Option<Vec<u8>>,
    /// Sector contents, zero filled to the sector size
    #[serde(deserialize_with = "hex_bytes")]
    pub data: Vec<u8>,
    /// Absolute block numbers that fail to read
    pub unreadable_blocks: Vec<usize>,
}

/// Simulated MIFARE Classic
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimulatedMifareClassic {
    /// Link behaviour
    #[serde(flatten)]
    pub link: Link,
    /// Product family
    pub card_type: MifareClassicType,
    /// Sectors in order
    pub sectors: Vec<SimulatedSector>,
    /// The token leaves the field when this sector is authenticated
    pub lost_at_sector: Option<usize>,
    #[serde(skip)]
    authenticated: Option<usize>,
}

impl MifareClassic for SimulatedMifareClassic {
    fn card_type(&self) -> MifareClassicType {
        self.card_type
    }

    fn size(&self) -> usize {
        self.block_count() * MIFARE_BLOCK_SIZE
    }

    fn sector_count(&self) -> usize {
        self.sectors.len()
    }

    fn block_count(&self) -> usize {
        (0..self.sectors.len())
            .map(|sector| self.block_count_in_sector(sector))
            .sum()
    }

    fn authenticate_sector_with_key_a(
        &mut self,
        sector: usize,
        key: &[u8; 6],
    ) -> Result<bool, TransportError> {
        self.link.check()?;
        if self.lost_at_sector == Some(sector) {
            self.link.lost = true;
            return Err(TransportError::TagLost);
        }

        let expected = self
            .sectors
            .get(sector)
            .ok_or_else(|| TransportError::other(format!("No sector {sector}")))?
            .key
            .as_deref()
            .unwrap_or(&DEFAULT_KEY);

        let accepted = expected == key.as_slice();
        self.authenticated = accepted.then_some(sector);
        Ok(accepted)
    }

    fn read_block(&mut self, block: usize) -> Result<Bytes, TransportError> {
        self.link.check()?;
        let sector = self
            .authenticated
            .ok_or(TransportError::Authentication)?;
        let first = self.sector_to_block(sector);
        if block < first || block >= first + self.block_count_in_sector(sector) {
            return Err(TransportError::Authentication);
        }

        let contents = &self.sectors[sector];
        if contents.unreadable_blocks.contains(&block) {
            return Err(TransportError::Transmission);
        }

        let mut data = [0u8; MIFARE_BLOCK_SIZE];
        let offset = (block - first) * MIFARE_BLOCK_SIZE;
        if let Some(stored) = contents.data.get(offset..) {
            let len = stored.len().min(MIFARE_BLOCK_SIZE);
            data[..len].copy_from_slice(&stored[..len]);
        }
        Ok(Bytes::copy_from_slice(&data))
    }
}

/// Simulated MIFARE Ultralight
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimulatedUltralight {
    /// Link behaviour
    #[serde(flatten)]
    pub link: Link,
    /// Product family
    pub ultralight_type: UltralightType,
    /// Memory contents, four bytes per page
    #[serde(deserialize_with = "hex_bytes")]
    pub memory: Vec<u8>,
    /// First page that refuses reads
    pub protected_from: Option<u8>,
}

impl MifareUltralight for SimulatedUltralight {
    fn ultralight_type(&self) -> UltralightType {
        self.ultralight_type
    }
}

impl TagTechnology for SimulatedUltralight {
    fn name(&self) -> &'static str {
        "MifareUltralight"
    }

    fn do_connect(&mut self) -> Result<(), TransportError> {
        self.link.connect()
    }

    fn do_close(&mut self) -> Result<(), TransportError> {
        self.link.connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.link.connected
    }

    fn do_transceive(&mut self, frame: &[u8]) -> Result<Bytes, TransportError> {
        self.link.check()?;
        let &[ULTRALIGHT_READ, page] = frame else {
            return Err(TransportError::other("unsupported command"));
        };

        let pages = self.memory.len() / PAGE_SIZE;
        if self.protected_from.is_some_and(|p| page >= p) || page as usize >= pages {
            return Err(TransportError::Transmission);
        }

        let mut data = [0u8; 4 * PAGE_SIZE];
        let start = page as usize * PAGE_SIZE;
        let stored = &self.memory[start..];
        let len = stored.len().min(data.len());
        data[..len].copy_from_slice(&stored[..len]);
        Ok(Bytes::copy_from_slice(&data))
    }

    fn max_transceive_length(&self) -> usize {
        self.link.max_transceive_length
    }
}

impl_simulated_technology!(
    SimulatedNfcA => "NfcA",
    SimulatedNfcB => "NfcB",
    SimulatedIsoDep => "IsoDep",
    SimulatedNdef => "Ndef",
    SimulatedMifareClassic => "MifareClassic",
);

/// A token assembled from simulated technologies
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimulatedToken {
    /// Token identifier
    #[serde(deserialize_with = "hex_bytes")]
    pub uid: Vec<u8>,
    /// Reported capability tags; derived from the present technologies when empty
    pub tech_list: Vec<String>,
    /// NfcA technology
    pub nfc_a: Option<SimulatedNfcA>,
    /// NfcB technology
    pub nfc_b: Option<SimulatedNfcB>,
    /// IsoDep technology
    pub iso_dep: Option<SimulatedIsoDep>,
    /// Ndef technology
    pub ndef: Option<SimulatedNdef>,
    /// MifareClassic technology
    pub mifare_classic: Option<SimulatedMifareClassic>,
    /// MifareUltralight technology
    pub mifare_ultralight: Option<SimulatedUltralight>,
}

impl SimulatedToken {
    /// Create an empty token with the given identifier
    pub fn new(uid: impl Into<Vec<u8>>) -> Self {
        Self {
            uid: uid.into(),
            ..Default::default()
        }
    }

    fn links(&self) -> impl Iterator<Item = &Link> {
        [
            self.nfc_a.as_ref().map(|t| &t.link),
            self.nfc_b.as_ref().map(|t| &t.link),
            self.iso_dep.as_ref().map(|t| &t.link),
            self.ndef.as_ref().map(|t| &t.link),
            self.mifare_classic.as_ref().map(|t| &t.link),
            self.mifare_ultralight.as_ref().map(|t| &t.link),
        ]
        .into_iter()
        .flatten()
    }

    /// Technologies currently connected
    pub fn open_connections(&self) -> usize {
        self.links().filter(|link| link.connected).count()
    }

    /// Successful connects across all technologies
    pub fn total_connects(&self) -> usize {
        self.links().map(|link| link.connects).sum()
    }

    fn present(&self, capability: Capability) -> bool {
        match capability {
            Capability::ProximityId => self.nfc_a.is_some(),
            Capability::TypeB => self.nfc_b.is_some(),
            Capability::TransportLayer => self.iso_dep.is_some(),
            Capability::SelfDescribingRecord => self.ndef.is_some(),
            Capability::LegacyMemoryCard => self.mifare_classic.is_some(),
            Capability::UltralightMemoryCard => self.mifare_ultralight.is_some(),
        }
    }
}

impl TokenHandle for SimulatedToken {
    fn uid(&self) -> &[u8] {
        &self.uid
    }

    fn capability_tags(&self) -> Vec<String> {
        if !self.tech_list.is_empty() {
            return self.tech_list.clone();
        }
        Capability::ALL
            .into_iter()
            .filter(|capability| self.present(*capability))
            .map(|capability| capability.tag())
            .collect()
    }

    fn nfc_a(&mut self) -> Option<&mut dyn NfcA> {
        self.nfc_a.as_mut().map(|t| t as &mut dyn NfcA)
    }

    fn nfc_b(&mut self) -> Option<&mut dyn NfcB> {
        self.nfc_b.as_mut().map(|t| t as &mut dyn NfcB)
    }

    fn iso_dep(&mut self) -> Option<&mut dyn IsoDep> {
        self.iso_dep.as_mut().map(|t| t as &mut dyn IsoDep)
    }

    fn ndef(&mut self) -> Option<&mut dyn Ndef> {
        self.ndef.as_mut().map(|t| t as &mut dyn Ndef)
    }

    fn mifare_classic(&mut self) -> Option<&mut dyn MifareClassic> {
        self.mifare_classic
            .as_mut()
            .map(|t| t as &mut dyn MifareClassic)
    }

    fn mifare_ultralight(&mut self) -> Option<&mut dyn MifareUltralight> {
        self.mifare_ultralight
            .as_mut()
            .map(|t| t as &mut dyn MifareUltralight)
    }
}

fn hex_bytes<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
    let text = String::deserialize(deserializer)?;
    decode_hex(&text).map_err(serde::de::Error::custom)
}

fn optional_hex_bytes<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Vec<u8>>, D::Error> {
    Option::<String>::deserialize(deserializer)?
        .map(|text| decode_hex(&text).map_err(serde::de::Error::custom))
        .transpose()
}
