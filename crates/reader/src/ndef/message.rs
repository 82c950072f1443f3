//! Binary NDEF message framing

use bytes::{BufMut, Bytes, BytesMut};
use tapkit_core::DecodeError;
use tracing::trace;

use super::{RawRecord, Tnf};

const FLAG_MB: u8 = 0x80;
const FLAG_ME: u8 = 0x40;
const FLAG_CF: u8 = 0x20;
const FLAG_SR: u8 = 0x10;
const FLAG_IL: u8 = 0x08;

/// An ordered sequence of records read from a token
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NdefMessage {
    records: Vec<RawRecord>,
}

impl NdefMessage {
    /// Create a message from its records
    pub const fn new(records: Vec<RawRecord>) -> Self {
        Self { records }
    }

    /// Records in stored order
    pub fn records(&self) -> &[RawRecord] {
        &self.records
    }

    /// Consume the message, returning its records
    pub fn into_records(self) -> Vec<RawRecord> {
        self.records
    }

    /// Parse a message from its binary form
    ///
    /// Chunked records are rejected. Parsing stops after the record carrying the
    /// message-end flag; trailing bytes are ignored.
    pub fn parse(data: &[u8]) -> Result<Self, DecodeError> {
        let mut records = Vec::new();
        let mut offset = 0;

        while offset < data.len() {
            let header = data[offset];
            offset += 1;

            if header & FLAG_CF != 0 {
                return Err(DecodeError::Unsupported("chunked record"));
            }

            let type_len = take(data, &mut offset, 1, "type length")?[0] as usize;
            let payload_len = if header & FLAG_SR != 0 {
                take(data, &mut offset, 1, "payload length")?[0] as usize
            } else {
                let raw = take(data, &mut offset, 4, "payload length")?;
                u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]) as usize
            };
            let id_len = if header & FLAG_IL != 0 {
                take(data, &mut offset, 1, "id length")?[0] as usize
            } else {
                0
            };

            let record_type = Bytes::copy_from_slice(take(data, &mut offset, type_len, "type")?);
            let id = Bytes::copy_from_slice(take(data, &mut offset, id_len, "id")?);
            let payload = Bytes::copy_from_slice(take(data, &mut offset, payload_len, "payload")?);

            records.push(RawRecord {
                tnf: Tnf::from_bits(header),
                record_type,
                id,
                payload,
            });

            if header & FLAG_ME != 0 {
                break;
            }
        }

        trace!(records = records.len(), "Parsed NDEF message");
        Ok(Self { records })
    }

    /// Serialize the message to its binary form
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::new();
        let last = self.records.len().saturating_sub(1);

        for (index, record) in self.records.iter().enumerate() {
            let mut header = record.tnf.bits();
            if index == 0 {
                header |= FLAG_MB;
            }
            if index == last {
                header |= FLAG_ME;
            }
            let short = record.payload.len() <= u8::MAX as usize;
            if short {
                header |= FLAG_SR;
            }
            if !record.id.is_empty() {
                header |= FLAG_IL;
            }

            buf.put_u8(header);
            buf.put_u8(record.record_type.len() as u8);
            if short {
                buf.put_u8(record.payload.len() as u8);
            } else {
                buf.put_u32(record.payload.len() as u32);
            }
            if !record.id.is_empty() {
                buf.put_u8(record.id.len() as u8);
            }
            buf.put_slice(&record.record_type);
            buf.put_slice(&record.id);
            buf.put_slice(&record.payload);
        }

        buf.freeze()
    }
}

impl From<Vec<RawRecord>> for NdefMessage {
    fn from(records: Vec<RawRecord>) -> Self {
        Self::new(records)
    }
}

fn take<'a>(
    data: &'a [u8],
    offset: &mut usize,
    len: usize,
    what: &'static str,
) -> Result<&'a [u8], DecodeError> {
    let end = offset
        .checked_add(len)
        .filter(|end| *end <= data.len())
        .ok_or(DecodeError::Truncated(what))?;
    let slice = &data[*offset..end];
    *offset = end;
    Ok(slice)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_text_record() {
        // MB|ME|SR, TNF well-known, "T", payload 02 "en" "Hi"
        let data = hex::decode("D101055402656E4869").unwrap();

        let message = NdefMessage::parse(&data).unwrap();
        assert_eq!(message.records().len(), 1);
        let record = &message.records()[0];
        assert_eq!(record.tnf, Tnf::WellKnown);
        assert_eq!(record.record_type.as_ref(), b"T");
        assert_eq!(record.payload.as_ref(), &[0x02, b'e', b'n', b'H', b'i']);
    }

    #[test]
    fn test_parse_multiple_records() {
        let message = NdefMessage::new(vec![
            RawRecord::text("en", "Hi"),
            RawRecord::uri(0x04, "example.com"),
        ]);
        let data = message.to_bytes();

        assert_eq!(data[0] & (FLAG_MB | FLAG_ME), FLAG_MB);
        assert_eq!(NdefMessage::parse(&data).unwrap(), message);
    }

    #[test]
    fn test_long_payload_and_id() {
        let mut record = RawRecord::new(Tnf::MimeMedia, &b"application/octet-stream"[..], vec![0xABu8; 300]);
        record.id = Bytes::from_static(b"id1");
        let message = NdefMessage::new(vec![record]);
        let data = message.to_bytes();

        assert_eq!(data[0] & FLAG_SR, 0);
        assert_ne!(data[0] & FLAG_IL, 0);
        assert_eq!(NdefMessage::parse(&data).unwrap(), message);
    }

    #[test]
    fn test_chunked_record_rejected() {
        let data = [0xB1, 0x01, 0x01, b'T', 0x00];
        assert_eq!(
            NdefMessage::parse(&data),
            Err(DecodeError::Unsupported("chunked record"))
        );
    }

    #[test]
    fn test_truncated_message() {
        assert_eq!(
            NdefMessage::parse(&[0xD1, 0x01, 0x05, b'T', 0x02]),
            Err(DecodeError::Truncated("payload"))
        );
        assert_eq!(
            NdefMessage::parse(&[0xC1, 0x01, 0x00]),
            Err(DecodeError::Truncated("payload length"))
        );
    }

    #[test]
    fn test_stops_at_message_end() {
        let mut data = NdefMessage::new(vec![RawRecord::uri(0x01, "a.b")])
            .to_bytes()
            .to_vec();
        data.extend_from_slice(&[0x00, 0x00, 0xFE]);

        let message = NdefMessage::parse(&data).unwrap();
        assert_eq!(message.records().len(), 1);
    }

    #[test]
    fn test_empty_message() {
        assert!(NdefMessage::parse(&[]).unwrap().records().is_empty());
        assert!(NdefMessage::default().to_bytes().is_empty());
    }
}
