//! Command frame header parsing
//!
//! Inbound frames from a reader are treated as opaque byte sequences; only the fixed-position
//! header (CLA, INS, P1, P2) is ever inspected. This module provides the header view and the
//! single classification the emulated credential cares about.

use bytes::{BufMut, Bytes, BytesMut};

use crate::Error;

/// Instruction byte for SELECT
pub const INS_SELECT: u8 = 0xA4;

/// P1 value for SELECT by name (DF name / AID)
pub const P1_SELECT_BY_NAME: u8 = 0x04;

/// Minimum length of a well-formed command frame (CLA, INS, P1, P2)
pub const HEADER_LEN: usize = 4;

/// Fixed-position header of a command frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Command class byte
    pub cla: u8,
    /// Instruction byte
    pub ins: u8,
    /// Parameter 1
    pub p1: u8,
    /// Parameter 2
    pub p2: u8,
}

impl FrameHeader {
    /// Create a new header
    pub const fn new(cla: u8, ins: u8, p1: u8, p2: u8) -> Self {
        Self { cla, ins, p1, p2 }
    }

    /// Parse the header from the first four bytes of a frame
    pub fn parse(frame: &[u8]) -> Result<Self, Error> {
        if frame.len() < HEADER_LEN {
            return Err(Error::InvalidCommandLength(frame.len()));
        }

        Ok(Self::new(frame[0], frame[1], frame[2], frame[3]))
    }

    /// Whether this header carries the interindustry class with the SELECT instruction.
    ///
    /// Only CLA and INS take part in the match; P1/P2 are not inspected.
    pub const fn is_select(&self) -> bool {
        self.cla == 0x00 && self.ins == INS_SELECT
    }

    /// Serialize the header into a frame with an optional data field
    ///
    /// Data longer than 255 bytes does not fit a short Lc and is rejected.
    pub fn to_frame(&self, data: Option<&[u8]>) -> Result<Bytes, Error> {
        let data_len = data.map_or(0, <[u8]>::len);
        let lc = u8::try_from(data_len).map_err(|_| Error::DataTooLong(data_len))?;
        let mut buffer = BytesMut::with_capacity(HEADER_LEN + 1 + data_len);

        // Header: CLA, INS, P1, P2
        buffer.put_u8(self.cla);
        buffer.put_u8(self.ins);
        buffer.put_u8(self.p1);
        buffer.put_u8(self.p2);

        if let Some(data) = data {
            buffer.put_u8(lc);
            buffer.put_slice(data);
        }

        Ok(buffer.freeze())
    }
}

/// Build a SELECT-by-name frame for the given application identifier
pub fn select_by_name(aid: &[u8]) -> Result<Bytes, Error> {
    FrameHeader::new(0x00, INS_SELECT, P1_SELECT_BY_NAME, 0x00).to_frame(Some(aid))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_header() {
        let header = FrameHeader::parse(&[0x00, 0xA4, 0x04, 0x00, 0x07]).unwrap();
        assert_eq!(header, FrameHeader::new(0x00, 0xA4, 0x04, 0x00));
        assert!(header.is_select());
    }

    #[test]
    fn test_parse_short_frame() {
        assert!(matches!(
            FrameHeader::parse(&[0x00, 0xA4, 0x04]),
            Err(Error::InvalidCommandLength(3))
        ));
        assert!(FrameHeader::parse(&[]).is_err());
    }

    #[test]
    fn test_select_ignores_parameters() {
        assert!(FrameHeader::new(0x00, 0xA4, 0x00, 0x0C).is_select());
        assert!(!FrameHeader::new(0x80, 0xA4, 0x04, 0x00).is_select());
        assert!(!FrameHeader::new(0x00, 0xB0, 0x00, 0x00).is_select());
    }

    #[test]
    fn test_select_by_name_frame() {
        let frame = select_by_name(&[0xA0, 0x00, 0x00, 0x02, 0x47, 0x10, 0x01]).unwrap();
        assert_eq!(
            frame.as_ref(),
            &[0x00, 0xA4, 0x04, 0x00, 0x07, 0xA0, 0x00, 0x00, 0x02, 0x47, 0x10, 0x01]
        );
    }

    #[test]
    fn test_oversized_data_rejected() {
        let header = FrameHeader::new(0x00, INS_SELECT, P1_SELECT_BY_NAME, 0x00);
        assert_eq!(header.to_frame(Some(&[0xAA; 255])).unwrap().len(), HEADER_LEN + 1 + 255);
        assert_eq!(
            header.to_frame(Some(&[0xAA; 256])),
            Err(Error::DataTooLong(256))
        );
        assert_eq!(select_by_name(&[0x01; 300]), Err(Error::DataTooLong(300)));
    }
}
