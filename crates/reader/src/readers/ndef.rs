//! Stored message reader

use tapkit_core::Connection;
use tracing::trace;

use crate::error::ReadError;
use crate::ndef::{NdefMessage, decode_records};
use crate::record::{FieldValue, Fields};
use crate::technology::Ndef;

/// Read the message metadata and decode its records
///
/// The message cached at discovery is preferred; the token is only read when the platform
/// cached nothing.
pub(crate) fn read_ndef(technology: &mut dyn Ndef, fields: &mut Fields) -> Result<(), ReadError> {
    let mut tech = Connection::open(technology)?;

    fields.insert("ndefType".into(), tech.ndef_type().into());
    fields.insert("ndefMaxSize".into(), tech.max_size().into());
    fields.insert("ndefIsWritable".into(), tech.is_writable().into());

    let message = match tech.cached_message() {
        Some(message) => Some(message),
        None => match tech.read_raw_message()? {
            Some(raw) => Some(NdefMessage::parse(&raw)?),
            None => None,
        },
    };

    if let Some(message) = message {
        trace!(records = message.records().len(), "Decoding stored message");
        fields.insert(
            "ndefRecords".into(),
            FieldValue::Records(decode_records(message.records())),
        );
    }
    Ok(())
}
