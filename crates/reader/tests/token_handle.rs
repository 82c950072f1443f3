//! Reading through a hand-written platform driver

use std::cell::Cell;
use std::rc::Rc;

use bytes::Bytes;
use tapkit_core::{TagTechnology, TransportError};
use tapkit_reader::technology::{IsoDep, NfcA, TokenHandle};
use tapkit_reader::{FieldValue, TagReader};

#[derive(Debug)]
struct Driver {
    name: &'static str,
    connected: bool,
    closes: Rc<Cell<usize>>,
}

impl Driver {
    fn new(name: &'static str, closes: &Rc<Cell<usize>>) -> Self {
        Self {
            name,
            connected: false,
            closes: Rc::clone(closes),
        }
    }
}

impl TagTechnology for Driver {
    fn name(&self) -> &'static str {
        self.name
    }

    fn do_connect(&mut self) -> Result<(), TransportError> {
        self.connected = true;
        Ok(())
    }

    fn do_close(&mut self) -> Result<(), TransportError> {
        self.connected = false;
        self.closes.set(self.closes.get() + 1);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn max_transceive_length(&self) -> usize {
        261
    }
}

impl NfcA for Driver {
    fn atqa(&self) -> Bytes {
        Bytes::from_static(&[0x44, 0x03])
    }

    fn sak(&self) -> u8 {
        0x20
    }
}

#[derive(Debug)]
struct BrokenIsoDep(Driver);

impl TagTechnology for BrokenIsoDep {
    fn name(&self) -> &'static str {
        self.0.name()
    }

    fn do_connect(&mut self) -> Result<(), TransportError> {
        Err(TransportError::Timeout)
    }

    fn do_close(&mut self) -> Result<(), TransportError> {
        self.0.do_close()
    }

    fn is_connected(&self) -> bool {
        false
    }

    fn max_transceive_length(&self) -> usize {
        0
    }
}

impl IsoDep for BrokenIsoDep {
    fn historical_bytes(&self) -> Option<Bytes> {
        None
    }

    fn hi_layer_response(&self) -> Option<Bytes> {
        None
    }

    fn is_extended_length_supported(&self) -> bool {
        false
    }
}

#[derive(Debug)]
struct Handle {
    nfc_a: Driver,
    iso_dep: BrokenIsoDep,
}

impl TokenHandle for Handle {
    fn uid(&self) -> &[u8] {
        &[0x04, 0x7F, 0x10, 0x22, 0x9A, 0x5C, 0x80]
    }

    fn capability_tags(&self) -> Vec<String> {
        vec!["android.nfc.tech.IsoDep".into(), "android.nfc.tech.NfcA".into()]
    }

    fn nfc_a(&mut self) -> Option<&mut dyn NfcA> {
        Some(&mut self.nfc_a)
    }

    fn iso_dep(&mut self) -> Option<&mut dyn IsoDep> {
        Some(&mut self.iso_dep)
    }
}

#[test]
fn test_second_capability_read_after_first_fails() {
    let closes = Rc::new(Cell::new(0));
    let mut handle = Handle {
        nfc_a: Driver::new("NfcA", &closes),
        iso_dep: BrokenIsoDep(Driver::new("IsoDep", &closes)),
    };

    let record = TagReader::default().read_token(&mut handle);

    assert_eq!(record.uid, "047F10229A5C80");
    assert_eq!(record.error("android.nfc.tech.IsoDep"), Some("Operation timed out"));
    assert_eq!(record.field("atqa"), Some(&FieldValue::Text("4403".into())));
    assert_eq!(record.field("sak"), Some(&FieldValue::Number(0x20)));
    assert_eq!(
        record.field("maxTransceiveLength"),
        Some(&FieldValue::Number(261))
    );
    assert!(!handle.nfc_a.is_connected());
    // Closed after the failed connect and after the successful read
    assert_eq!(closes.get(), 2);
}

#[test]
fn test_record_serializes_for_host() {
    let closes = Rc::new(Cell::new(0));
    let mut handle = Handle {
        nfc_a: Driver::new("NfcA", &closes),
        iso_dep: BrokenIsoDep(Driver::new("IsoDep", &closes)),
    };

    let record = TagReader::default().read_token(&mut handle);
    let json = serde_json::to_value(&record).unwrap();

    assert_eq!(json["uid"], "047F10229A5C80");
    assert_eq!(json["techList"][0], "android.nfc.tech.IsoDep");
    assert_eq!(json["sak"], 32);
    assert_eq!(json["errors"]["android.nfc.tech.IsoDep"], "Operation timed out");
}
