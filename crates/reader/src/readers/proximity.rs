//! NfcA and NfcB parameter readers

use tapkit_core::Connection;

use super::MAX_TRANSCEIVE_LENGTH;
use crate::error::ReadError;
use crate::record::{FieldValue, Fields};
use crate::technology::{NfcA, NfcB};

/// Read the type A answer-to-request and select acknowledge
pub(crate) fn read_nfc_a(technology: &mut dyn NfcA, fields: &mut Fields) -> Result<(), ReadError> {
    let tech = Connection::open(technology)?;

    fields.insert("atqa".into(), FieldValue::hex(tech.atqa()));
    fields.insert("sak".into(), tech.sak().into());
    fields.insert(
        MAX_TRANSCEIVE_LENGTH.into(),
        tech.max_transceive_length().into(),
    );
    Ok(())
}

/// Read the type B application data and protocol info
pub(crate) fn read_nfc_b(technology: &mut dyn NfcB, fields: &mut Fields) -> Result<(), ReadError> {
    let tech = Connection::open(technology)?;

    if let Some(data) = tech.application_data() {
        fields.insert("applicationData".into(), FieldValue::hex(data));
    }
    if let Some(info) = tech.protocol_info() {
        fields.insert("protocolInfo".into(), FieldValue::hex(info));
    }
    fields.insert(
        MAX_TRANSCEIVE_LENGTH.into(),
        tech.max_transceive_length().into(),
    );
    Ok(())
}
