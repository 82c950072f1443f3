//! Capability readers
//!
//! Each reader connects its technology through a [`Connection`](tapkit_core::Connection),
//! writes what it can into the field mapping, and closes on every exit path. Fields written
//! before a failure stay in the mapping.

mod iso_dep;
mod mifare_classic;
mod ndef;
mod proximity;
mod ultralight;

pub(crate) use iso_dep::read_iso_dep;
pub(crate) use mifare_classic::read_mifare_classic;
pub(crate) use ndef::read_ndef;
pub(crate) use proximity::{read_nfc_a, read_nfc_b};
pub(crate) use ultralight::read_ultralight;

/// Field key for the frame size every transceiving technology reports
pub(crate) const MAX_TRANSCEIVE_LENGTH: &str = "maxTransceiveLength";
