//! ISO/IEC 14443-4 parameter reader

use tapkit_core::Connection;

use super::MAX_TRANSCEIVE_LENGTH;
use crate::error::ReadError;
use crate::record::{FieldValue, Fields};
use crate::technology::IsoDep;

/// Read historical bytes, higher layer response and extended length support
pub(crate) fn read_iso_dep(
    technology: &mut dyn IsoDep,
    fields: &mut Fields,
) -> Result<(), ReadError> {
    let tech = Connection::open(technology)?;

    if let Some(bytes) = tech.historical_bytes() {
        fields.insert("historicalBytes".into(), FieldValue::hex(bytes));
    }
    if let Some(bytes) = tech.hi_layer_response() {
        fields.insert("hiLayerResponse".into(), FieldValue::hex(bytes));
    }
    fields.insert(
        MAX_TRANSCEIVE_LENGTH.into(),
        tech.max_transceive_length().into(),
    );
    fields.insert(
        "isExtendedLengthApduSupported".into(),
        tech.is_extended_length_supported().into(),
    );
    Ok(())
}
