//! Multi-technology contactless tag reader
//!
//! Given a presented token and the capability tags the platform discovered, [`TagReader`] reads
//! every capability it knows in its own scoped connection and merges the results into a single
//! [`TagRecord`]. A capability that fails is recorded under its tag and never stops the others.
//!
//! Supported capabilities:
//!
//! - NfcA and NfcB protocol parameters
//! - IsoDep historical bytes and higher layer response
//! - Ndef stored messages, with text and URI records decoded
//! - MIFARE Classic sectors that accept the factory key
//! - MIFARE Ultralight pages up to the protected region
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![forbid(unsafe_code)]
#![warn(missing_docs, rustdoc::missing_crate_level_docs)]

mod capability;
mod config;
mod error;
pub mod ndef;
mod reader;
mod readers;
mod record;
mod simulated;
pub mod technology;

pub use capability::Capability;
pub use config::{DEFAULT_KEY, ReaderConfig};
pub use error::ReadError;
pub use reader::TagReader;
pub use record::{FieldValue, Fields, TagRecord};
pub use simulated::{
    Link, SimulatedIsoDep, SimulatedMifareClassic, SimulatedNdef, SimulatedNfcA, SimulatedNfcB,
    SimulatedRecord, SimulatedSector, SimulatedToken, SimulatedUltralight,
};
pub use technology::TokenHandle;

#[cfg(test)]
mod tests {
    use super::*;

    fn token(json: &str) -> SimulatedToken {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_failing_capability_does_not_abort_others() {
        let mut token = token(
            r#"{
                "uid": "04A1B2C3",
                "nfcA": { "atqa": "4400", "sak": 0 },
                "mifareClassic": { "failConnect": true, "sectors": [{}] }
            }"#,
        );

        let record = TagReader::default().read_token(&mut token);

        assert_eq!(record.capabilities, ["NfcA", "MifareClassic"]);
        assert_eq!(record.field("atqa"), Some(&FieldValue::Text("4400".into())));
        assert_eq!(record.field("sak"), Some(&FieldValue::Number(0)));
        assert_eq!(record.error("MifareClassic"), Some("Failed to connect to tag"));
        assert!(record.error("NfcA").is_none());
        assert_eq!(token.open_connections(), 0);
    }

    #[test]
    fn test_ndef_text_and_uri() {
        let mut token = token(
            r#"{
                "uid": "04112233445566",
                "ndef": { "records": [
                    { "kind": "text", "language": "en", "text": "Hi" },
                    { "kind": "uri", "prefix": 4, "rest": "example.com" },
                    { "kind": "raw", "tnf": 2, "type": "746578742F706C61696E", "payload": "6869" }
                ] }
            }"#,
        );

        let record = TagReader::default().read_token(&mut token);
        let records = record.field("ndefRecords").and_then(FieldValue::as_records).unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].decoded, Some(ndef::Decoded::Text("Hi".into())));
        assert_eq!(
            records[1].decoded,
            Some(ndef::Decoded::Uri("https://example.com".into()))
        );
        assert_eq!(records[2].decoded, None);
        assert_eq!(records[2].raw.record_type.as_ref(), b"text/plain");
        assert_eq!(record.field("ndefIsWritable"), Some(&FieldValue::Bool(true)));
        assert!(record.is_complete());
    }

    #[test]
    fn test_ndef_raw_message_parsed() {
        let mut token = token(
            r#"{
                "uid": "01",
                "ndef": { "cached": false, "rawMessage": "D101055402656E4869" }
            }"#,
        );

        let record = TagReader::default().read_token(&mut token);
        let records = record.field("ndefRecords").and_then(FieldValue::as_records).unwrap();
        assert_eq!(records[0].decoded, Some(ndef::Decoded::Text("Hi".into())));
    }

    #[test]
    fn test_ndef_malformed_message_is_capability_error() {
        let mut token = token(
            r#"{ "uid": "01", "ndef": { "rawMessage": "B1010154" } }"#,
        );

        let record = TagReader::default().read_token(&mut token);
        assert!(record.field("ndefRecords").is_none());
        assert_eq!(record.field("ndefMaxSize"), Some(&FieldValue::Number(137)));
        assert_eq!(
            record.error("Ndef"),
            Some("Unsupported record structure: chunked record")
        );
        assert_eq!(token.open_connections(), 0);
    }

    #[test]
    fn test_mifare_sector_rejecting_key_is_omitted() {
        let mut token = token(
            r#"{
                "uid": "DEADBEEF",
                "mifareClassic": { "sectors": [
                    { "data": "000102030405060708090A0B0C0D0E0F" },
                    { "key": "A0A1A2A3A4A5" }
                ] }
            }"#,
        );

        let record = TagReader::default().read_token(&mut token);
        let sectors = record.field("mifareSectors").and_then(FieldValue::as_map).unwrap();

        assert_eq!(sectors.len(), 1);
        let sector_0 = &sectors["sector_0"];
        assert_eq!(sector_0.len(), 4 * 16 * 2);
        assert!(sector_0.starts_with("000102030405060708090A0B0C0D0E0F"));
        assert!(!sectors.contains_key("sector_1"));
        assert!(record.error("MifareClassic").is_none());
        assert_eq!(record.field("mifareSectorCount"), Some(&FieldValue::Number(2)));
        assert_eq!(record.field("mifareType"), Some(&FieldValue::Text("Classic".into())));
    }

    #[test]
    fn test_mifare_all_sectors_rejected() {
        let mut token = token(
            r#"{
                "uid": "DEADBEEF",
                "mifareClassic": { "sectors": [
                    { "key": "A0A1A2A3A4A5" },
                    { "key": "D3F7D3F7D3F7" }
                ] }
            }"#,
        );

        let record = TagReader::default().read_token(&mut token);
        assert_eq!(
            record.error("MifareClassic"),
            Some("No sector readable with the default key (2 sectors tried)")
        );
        assert_eq!(record.field("mifareBlockCount"), Some(&FieldValue::Number(8)));
        assert_eq!(token.open_connections(), 0);
    }

    #[test]
    fn test_mifare_unreadable_block_skipped() {
        let mut token = token(
            r#"{
                "uid": "DEADBEEF",
                "mifareClassic": { "sectors": [
                    { "data": "11111111111111111111111111111111", "unreadableBlocks": [1, 2] }
                ] }
            }"#,
        );

        let record = TagReader::default().read_token(&mut token);
        let sectors = record.field("mifareSectors").and_then(FieldValue::as_map).unwrap();
        assert_eq!(sectors["sector_0"].len(), 2 * 16 * 2);
        assert!(record.is_complete());
    }

    #[test]
    fn test_mifare_sector_without_readable_blocks_is_omitted() {
        let mut token = token(
            r#"{
                "uid": "DEADBEEF",
                "mifareClassic": { "sectors": [
                    { "unreadableBlocks": [0, 1, 2, 3] },
                    { "key": "A0A1A2A3A4A5" }
                ] }
            }"#,
        );

        let record = TagReader::default().read_token(&mut token);
        assert!(record.field("mifareSectors").is_none());
        assert_eq!(
            record.error("MifareClassic"),
            Some("No sector readable with the default key (2 sectors tried)")
        );
    }

    #[test]
    fn test_mifare_empty_sector_skipped_next_read() {
        let mut token = token(
            r#"{
                "uid": "DEADBEEF",
                "mifareClassic": { "sectors": [
                    { "unreadableBlocks": [0, 1, 2, 3] },
                    { "data": "AB" }
                ] }
            }"#,
        );

        let record = TagReader::default().read_token(&mut token);
        let sectors = record.field("mifareSectors").and_then(FieldValue::as_map).unwrap();
        assert_eq!(sectors.keys().collect::<Vec<_>>(), ["sector_1"]);
        assert!(sectors["sector_1"].starts_with("AB00"));
        assert!(record.is_complete());
    }

    #[test]
    fn test_mifare_tag_lost_keeps_partial_sectors() {
        let mut token = token(
            r#"{
                "uid": "DEADBEEF",
                "mifareClassic": { "sectors": [{}, {}, {}], "lostAtSector": 1 }
            }"#,
        );

        let record = TagReader::default().read_token(&mut token);
        let sectors = record.field("mifareSectors").and_then(FieldValue::as_map).unwrap();
        assert!(sectors.contains_key("sector_0"));
        assert_eq!(sectors.len(), 1);
        assert_eq!(record.error("MifareClassic"), Some("Tag was lost"));
    }

    #[test]
    fn test_custom_key() {
        let key = [0xA0, 0xA1, 0xA2, 0xA3, 0xA4, 0xA5];
        let mut token = token(
            r#"{ "uid": "01", "mifareClassic": { "sectors": [{ "key": "A0A1A2A3A4A5" }] } }"#,
        );

        let reader = TagReader::new(ReaderConfig::new().with_default_key(key));
        let record = reader.read_token(&mut token);
        assert!(record.is_complete());
    }

    #[test]
    fn test_ultralight_stops_at_protected_page() {
        let memory = "00".repeat(4 * 48);
        let mut token = token(&format!(
            r#"{{ "uid": "01", "mifareUltralight": {{ "memory": "{memory}", "protectedFrom": 8 }} }}"#
        ));

        let record = TagReader::default().read_token(&mut token);
        let pages = record.field("ultralightPages").and_then(FieldValue::as_map).unwrap();
        assert_eq!(pages.keys().collect::<Vec<_>>(), ["page_0", "page_4"]);
        assert_eq!(record.field("ultralightType"), Some(&FieldValue::Text("Ultralight".into())));
    }

    #[test]
    fn test_ultralight_fully_protected_has_no_pages() {
        let mut token = token(
            r#"{ "uid": "01", "mifareUltralight": { "memory": "00000000", "protectedFrom": 0 } }"#,
        );

        let record = TagReader::default().read_token(&mut token);
        assert!(record.field("ultralightPages").is_none());
        assert_eq!(record.field("ultralightType"), Some(&FieldValue::Text("Ultralight".into())));
        assert!(record.is_complete());
    }

    #[test]
    fn test_ultralight_c_reads_further() {
        let memory = "00".repeat(4 * 48);
        let mut token = token(&format!(
            r#"{{ "uid": "01", "mifareUltralight": {{ "ultralightType": "UltralightC", "memory": "{memory}" }} }}"#
        ));

        let record = TagReader::default().read_token(&mut token);
        let pages = record.field("ultralightPages").and_then(FieldValue::as_map).unwrap();
        assert_eq!(pages.len(), 11);
        assert!(pages.contains_key("page_40"));
        assert_eq!(
            record.field("ultralightType"),
            Some(&FieldValue::Text("Ultralight C".into()))
        );
    }

    #[test]
    fn test_reported_order_and_unknown_tags() {
        let mut token = token(
            r#"{
                "uid": "0102",
                "techList": ["android.nfc.tech.IsoDep", "android.nfc.tech.NfcF", "android.nfc.tech.NfcA", "NfcA"],
                "nfcA": { "atqa": "0400", "sak": 32 },
                "isoDep": { "historicalBytes": "8073", "extendedLength": true }
            }"#,
        );

        let record = TagReader::default().read_token(&mut token);
        assert_eq!(
            record.capabilities,
            ["android.nfc.tech.IsoDep", "android.nfc.tech.NfcF", "android.nfc.tech.NfcA", "NfcA"]
        );
        assert_eq!(record.field("historicalBytes"), Some(&FieldValue::Text("8073".into())));
        assert_eq!(
            record.field("isExtendedLengthApduSupported"),
            Some(&FieldValue::Bool(true))
        );
        assert_eq!(token.total_connects(), 2);
        assert!(record.is_complete());
    }

    #[test]
    fn test_missing_technology_gives_no_fields() {
        let mut token = token(r#"{ "uid": "01", "techList": ["NfcB"] }"#);

        let record = TagReader::default().read_token(&mut token);
        assert!(record.fields.is_empty());
        assert!(record.is_complete());
    }

    #[test]
    fn test_errors_keyed_by_reported_tag() {
        let mut token = token(
            r#"{
                "uid": "01",
                "techList": ["android.nfc.tech.NfcB"],
                "nfcB": { "lost": true }
            }"#,
        );

        let record = TagReader::default().read_token(&mut token);
        assert_eq!(record.error("android.nfc.tech.NfcB"), Some("Tag was lost"));
        assert_eq!(token.open_connections(), 0);
    }
}
