//! Hex decoding command

use tapkit_core::codec::{decode_hex, encode_hex};

use crate::utils::display;

/// Decode a hex string and show the normalized form
pub(crate) fn decode_hex_command(input: &str) -> anyhow::Result<()> {
    let bytes = decode_hex(input)?;

    println!(
        "{}",
        display::key_value_box(
            "Decoded payload",
            vec![
                ("Length", bytes.len().to_string()),
                ("Hex", encode_hex(&bytes)),
            ],
        )
    );
    Ok(())
}
