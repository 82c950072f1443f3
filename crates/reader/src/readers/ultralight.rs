//! Ultralight page reader

use std::collections::BTreeMap;

use tapkit_core::Connection;
use tapkit_core::codec::encode_hex;
use tracing::debug;

use crate::config::ReaderConfig;
use crate::error::ReadError;
use crate::record::{FieldValue, Fields};
use crate::technology::{MifareUltralight, UltralightType};

/// Pages returned by one read command
const PAGES_PER_READ: u8 = 4;

/// Read pages four at a time until the limit or the first refused read
pub(crate) fn read_ultralight(
    technology: &mut dyn MifareUltralight,
    config: &ReaderConfig,
    fields: &mut Fields,
) -> Result<(), ReadError> {
    let mut tech = Connection::open(technology)?;

    let kind = tech.ultralight_type();
    fields.insert("ultralightType".into(), kind.as_str().into());

    let limit = match kind {
        UltralightType::UltralightC => config.ultralight_c_page_limit,
        _ => config.ultralight_page_limit,
    };

    let mut pages = BTreeMap::new();
    for page in (0..limit).step_by(PAGES_PER_READ as usize) {
        match tech.read_pages(page) {
            Ok(data) if data.is_empty() => debug!(page, "Empty page read"),
            Ok(data) => {
                pages.insert(format!("page_{page}"), encode_hex(&data));
            }
            Err(e) => {
                // Protected region reached
                debug!(page, error = %e, "Stopping page read");
                break;
            }
        }
    }

    if !pages.is_empty() {
        fields.insert("ultralightPages".into(), FieldValue::Map(pages));
    }
    Ok(())
}
