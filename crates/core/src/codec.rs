//! Hex encoding helpers
//!
//! Payloads arrive from the host application as hex strings that are frequently formatted for
//! humans (`"01 02 03"`, `"01:02:03"`). Separators are stripped before decoding; anything else
//! that is not a hex digit is rejected rather than silently skipped.

use crate::error::DecodeError;

/// Characters accepted between hex digit pairs
pub const SEPARATORS: &[char] = &[':', '-'];

/// Decode a separator-tolerant hex string into bytes
///
/// Whitespace, `:` and `-` are ignored. The remaining digits must be of even length.
pub fn decode_hex(input: &str) -> Result<Vec<u8>, DecodeError> {
    let digits: String = input
        .chars()
        .filter(|c| !c.is_whitespace() && !SEPARATORS.contains(c))
        .collect();

    if digits.len() % 2 != 0 {
        return Err(DecodeError::OddLength(digits.len()));
    }

    hex::decode(&digits).map_err(|e| match e {
        hex::FromHexError::InvalidHexCharacter { c, index } => DecodeError::InvalidHexCharacter {
            character: c,
            index,
        },
        _ => DecodeError::OddLength(digits.len()),
    })
}

/// Encode bytes as uppercase hex without separators
pub fn encode_hex(bytes: impl AsRef<[u8]>) -> String {
    hex::encode_upper(bytes)
}
