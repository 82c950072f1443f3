//! NFC Data Exchange Format records
//!
//! A stored message is an ordered sequence of records, each tagged with a type name format,
//! a type, and a payload. Well-known text (`"T"`) and URI (`"U"`) records are decoded into
//! readable values; every other record is carried through with its raw type and payload.

mod message;

use std::fmt;

use bytes::Bytes;
use serde::ser::{Serialize, SerializeMap, Serializer};
use tapkit_core::codec::encode_hex;

pub use message::NdefMessage;

/// Record type for well-known text records
pub const RTD_TEXT: &[u8] = b"T";

/// Record type for well-known URI records
pub const RTD_URI: &[u8] = b"U";

/// URI identifier codes understood by the decoder, indexed by the first payload byte
pub const URI_PREFIXES: [&str; 7] = [
    "",
    "http://www.",
    "https://www.",
    "http://",
    "https://",
    "tel:",
    "mailto:",
];

/// Type name format of a record (3 bits)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tnf {
    /// Record carries no type or payload
    Empty,
    /// NFC Forum well-known type
    WellKnown,
    /// Media type (RFC 2046)
    MimeMedia,
    /// Absolute URI (RFC 3986)
    AbsoluteUri,
    /// NFC Forum external type
    External,
    /// Unknown payload type
    Unknown,
    /// Continuation chunk of a chunked record
    Unchanged,
    /// Reserved value
    Reserved,
}

impl Tnf {
    /// Decode from the low three bits of a record header
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0x07 {
            0x00 => Self::Empty,
            0x01 => Self::WellKnown,
            0x02 => Self::MimeMedia,
            0x03 => Self::AbsoluteUri,
            0x04 => Self::External,
            0x05 => Self::Unknown,
            0x06 => Self::Unchanged,
            _ => Self::Reserved,
        }
    }

    /// Three-bit wire value
    pub const fn bits(&self) -> u8 {
        match self {
            Self::Empty => 0x00,
            Self::WellKnown => 0x01,
            Self::MimeMedia => 0x02,
            Self::AbsoluteUri => 0x03,
            Self::External => 0x04,
            Self::Unknown => 0x05,
            Self::Unchanged => 0x06,
            Self::Reserved => 0x07,
        }
    }
}

/// A record as stored on the token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// Type name format
    pub tnf: Tnf,
    /// Record type
    pub record_type: Bytes,
    /// Optional record identifier
    pub id: Bytes,
    /// Record payload
    pub payload: Bytes,
}

impl RawRecord {
    /// Create a record without an identifier
    pub fn new(tnf: Tnf, record_type: impl Into<Bytes>, payload: impl Into<Bytes>) -> Self {
        Self {
            tnf,
            record_type: record_type.into(),
            id: Bytes::new(),
            payload: payload.into(),
        }
    }

    /// Well-known text record with a UTF-8 body
    pub fn text(language: &str, text: &str) -> Self {
        let mut payload = Vec::with_capacity(1 + language.len() + text.len());
        payload.push((language.len() & 0x3F) as u8);
        payload.extend_from_slice(language.as_bytes());
        payload.extend_from_slice(text.as_bytes());
        Self::new(Tnf::WellKnown, Bytes::from_static(RTD_TEXT), payload)
    }

    /// Well-known URI record using the given prefix code
    pub fn uri(prefix_code: u8, rest: &str) -> Self {
        let mut payload = Vec::with_capacity(1 + rest.len());
        payload.push(prefix_code);
        payload.extend_from_slice(rest.as_bytes());
        Self::new(Tnf::WellKnown, Bytes::from_static(RTD_URI), payload)
    }
}

/// Semantic value of a well-known record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// Text record body
    Text(String),
    /// Fully expanded URI
    Uri(String),
}

impl fmt::Display for Decoded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => write!(f, "text: {text}"),
            Self::Uri(uri) => write!(f, "uri: {uri}"),
        }
    }
}

/// A record with its raw content and, when understood, its decoded value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedRecord {
    /// The record as stored
    pub raw: RawRecord,
    /// Decoded value for well-known text and URI records
    pub decoded: Option<Decoded>,
}

/// Decode every record of a message
///
/// Records that are not well-known text or URI keep `decoded = None`.
pub fn decode_records(records: &[RawRecord]) -> Vec<DecodedRecord> {
    records
        .iter()
        .map(|raw| DecodedRecord {
            raw: raw.clone(),
            decoded: decode_record(raw),
        })
        .collect()
}

/// Decode a single well-known text or URI record
///
/// Returns `None` for records of any other format or type, and for text records whose
/// language code leaves no room for a body. Invalid UTF-8 is replaced, not rejected.
pub fn decode_record(record: &RawRecord) -> Option<Decoded> {
    if record.tnf != Tnf::WellKnown || record.payload.is_empty() {
        return None;
    }

    match record.record_type.as_ref() {
        RTD_TEXT => decode_text(&record.payload),
        RTD_URI => Some(decode_uri(&record.payload)),
        _ => None,
    }
}

fn decode_text(payload: &[u8]) -> Option<Decoded> {
    let language_len = (payload[0] & 0x3F) as usize;
    let body_start = 1 + language_len;
    if payload.len() <= body_start {
        return None;
    }

    Some(Decoded::Text(
        String::from_utf8_lossy(&payload[body_start..]).into_owned(),
    ))
}

fn decode_uri(payload: &[u8]) -> Decoded {
    let prefix = URI_PREFIXES
        .get(payload[0] as usize)
        .copied()
        .unwrap_or_default();

    Decoded::Uri(format!("{prefix}{}", String::from_utf8_lossy(&payload[1..])))
}

impl Serialize for DecodedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("tnf", &self.raw.tnf.bits())?;
        map.serialize_entry("type", &encode_hex(&self.raw.record_type))?;
        map.serialize_entry(
            "typeString",
            &String::from_utf8_lossy(&self.raw.record_type),
        )?;
        if !self.raw.id.is_empty() {
            map.serialize_entry("id", &encode_hex(&self.raw.id))?;
        }
        map.serialize_entry("payload", &encode_hex(&self.raw.payload))?;
        match &self.decoded {
            Some(Decoded::Text(text)) => map.serialize_entry("text", text)?,
            Some(Decoded::Uri(uri)) => map.serialize_entry("uri", uri)?,
            None => {}
        }
        map.end()
    }
}
