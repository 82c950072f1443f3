//! Aggregated result of reading one token

use std::collections::BTreeMap;

use serde::Serialize;
use tapkit_core::codec::encode_hex;

use crate::ndef::DecodedRecord;

/// Value stored under a field key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Boolean flag
    Bool(bool),
    /// Unsigned number
    Number(u64),
    /// Text or hex string
    Text(String),
    /// Keyed hex strings (`sector_N`, `page_N`)
    Map(BTreeMap<String, String>),
    /// Stored message records
    Records(Vec<DecodedRecord>),
}

impl FieldValue {
    /// Uppercase hex rendering of raw bytes
    pub fn hex(bytes: impl AsRef<[u8]>) -> Self {
        Self::Text(encode_hex(bytes))
    }

    /// String value, if this is text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Keyed map, if this is one
    pub fn as_map(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Records, if this holds a stored message
    pub fn as_records(&self) -> Option<&[DecodedRecord]> {
        match self {
            Self::Records(records) => Some(records),
            _ => None,
        }
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<u8> for FieldValue {
    fn from(value: u8) -> Self {
        Self::Number(value.into())
    }
}

impl From<usize> for FieldValue {
    fn from(value: usize) -> Self {
        Self::Number(value as u64)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Field mapping produced by the capability readers
pub type Fields = BTreeMap<String, FieldValue>;

/// Everything read from one token presentation
///
/// A capability listed in `capabilities` may have no fields; failures are kept in
/// `per_capability_errors` under the tag the platform reported.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TagRecord {
    /// Uppercase hex identifier
    pub uid: String,

    /// Capability tags as reported
    #[serde(rename = "techList")]
    pub capabilities: Vec<String>,

    /// Merged fields of every capability read
    #[serde(flatten)]
    pub fields: Fields,

    /// Failure message per capability tag
    #[serde(rename = "errors", skip_serializing_if = "BTreeMap::is_empty")]
    pub per_capability_errors: BTreeMap<String, String>,
}

impl TagRecord {
    /// Field value by key
    pub fn field(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// Error recorded for a capability tag
    pub fn error(&self, tag: &str) -> Option<&str> {
        self.per_capability_errors.get(tag).map(String::as_str)
    }

    /// Whether every listed capability was read without error
    pub fn is_complete(&self) -> bool {
        self.per_capability_errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_flattens_fields() {
        let mut record = TagRecord {
            uid: "04A1B2C3".to_string(),
            capabilities: vec!["NfcA".to_string(), "MifareClassic".to_string()],
            ..Default::default()
        };
        record.fields.insert("sak".into(), 0x08u8.into());
        record.fields.insert("atqa".into(), FieldValue::hex([0x04u8, 0x00]));

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["uid"], "04A1B2C3");
        assert_eq!(json["techList"][1], "MifareClassic");
        assert_eq!(json["sak"], 8);
        assert_eq!(json["atqa"], "0400");
        assert!(json.get("errors").is_none());
    }

    #[test]
    fn test_serialize_errors_by_tag() {
        let mut record = TagRecord::default();
        record
            .per_capability_errors
            .insert("MifareClassic".into(), "Tag was lost".into());

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["errors"]["MifareClassic"], "Tag was lost");
        assert!(!record.is_complete());
        assert_eq!(record.error("MifareClassic"), Some("Tag was lost"));
    }

    #[test]
    fn test_nested_map_value() {
        let mut sectors = BTreeMap::new();
        sectors.insert("sector_0".to_string(), "00".repeat(16));
        let value = FieldValue::Map(sectors);

        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(json["sector_0"].as_str().map(str::len), Some(32));
        assert!(value.as_text().is_none());
        assert!(value.as_map().is_some());
    }
}
