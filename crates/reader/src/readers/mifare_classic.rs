//! Authenticated sector reader for MIFARE Classic

use std::collections::BTreeMap;

use tapkit_core::codec::encode_hex;
use tapkit_core::{Connection, TransportError};
use tracing::{debug, trace};

use crate::config::ReaderConfig;
use crate::error::ReadError;
use crate::record::{FieldValue, Fields};
use crate::technology::{MIFARE_BLOCK_SIZE, MifareClassic};

/// Read every sector that accepts the configured key A
///
/// Sectors rejecting the key are left out of `mifareSectors`; unreadable blocks inside an
/// authenticated sector are skipped, and a sector with no readable block is left out too. The capability only fails when no sector could be read,
/// or when the token leaves the field.
pub(crate) fn read_mifare_classic(
    technology: &mut dyn MifareClassic,
    config: &ReaderConfig,
    fields: &mut Fields,
) -> Result<(), ReadError> {
    let mut tech = Connection::open(technology)?;

    let sector_count = tech.sector_count();
    fields.insert("mifareType".into(), tech.card_type().as_str().into());
    fields.insert("mifareSize".into(), tech.size().into());
    fields.insert("mifareSectorCount".into(), sector_count.into());
    fields.insert("mifareBlockCount".into(), tech.block_count().into());

    let mut sectors = BTreeMap::new();
    let result = read_sectors(&mut *tech, &config.default_key, &mut sectors);

    let readable = sectors.len();
    if !sectors.is_empty() {
        fields.insert("mifareSectors".into(), FieldValue::Map(sectors));
    }
    result?;

    debug!(readable, sector_count, "Sector read complete");
    if readable == 0 && sector_count > 0 {
        return Err(ReadError::NoReadableSectors {
            sectors: sector_count,
        });
    }
    Ok(())
}

fn read_sectors(
    tech: &mut dyn MifareClassic,
    key: &[u8; 6],
    sectors: &mut BTreeMap<String, String>,
) -> Result<(), TransportError> {
    for sector in 0..tech.sector_count() {
        match tech.authenticate_sector_with_key_a(sector, key) {
            Ok(true) => {}
            Ok(false) => {
                trace!(sector, "Key rejected");
                continue;
            }
            Err(e) if e.is_tag_lost() => return Err(e),
            Err(e) => {
                debug!(sector, error = %e, "Authentication failed");
                continue;
            }
        }

        let first = tech.sector_to_block(sector);
        let count = tech.block_count_in_sector(sector);

        let mut data = Vec::with_capacity(count * MIFARE_BLOCK_SIZE);
        for block in first..first + count {
            match tech.read_block(block) {
                Ok(bytes) => data.extend_from_slice(&bytes),
                Err(e) if e.is_tag_lost() => return Err(e),
                Err(e) => debug!(sector, block, error = %e, "Skipping unreadable block"),
            }
        }

        if data.is_empty() {
            debug!(sector, "No block readable in authenticated sector");
            continue;
        }
        sectors.insert(format!("sector_{sector}"), encode_hex(&data));
    }
    Ok(())
}
