//! Credential payload storage

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

/// Bytes answered to a SELECT while the credential is armed
///
/// The buffer is overwritten with zeros by [`Payload::wipe`] and again when dropped. `Debug`
/// prints only the length.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Payload(Vec<u8>);

impl Payload {
    /// Wrap decoded payload bytes
    pub const fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Borrow the payload bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Payload length in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the payload is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Overwrite every byte with zero in place, keeping the length
    pub fn wipe(&mut self) {
        self.0.as_mut_slice().zeroize();
    }

    /// Whether every byte is zero
    pub fn is_wiped(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Payload").field(&self.0.len()).finish()
    }
}
