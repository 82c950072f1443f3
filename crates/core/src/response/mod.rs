//! Response frame definitions
//!
//! A response frame is the payload followed by a two-byte status word, as defined by
//! ISO/IEC 7816-4. The emulated credential only ever produces two shapes: a success frame
//! carrying the active payload, or a bare failure status.

pub mod status;

use bytes::{BufMut, Bytes, BytesMut};
use tracing::trace;

use crate::Error;
use status::StatusWord;

/// Basic response frame structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Response payload data
    payload: Option<Bytes>,
    /// Status word
    status: StatusWord,
}

impl Response {
    /// Create a new response with payload and status
    pub fn new(payload: Option<Bytes>, status: impl Into<StatusWord>) -> Self {
        Self {
            payload,
            status: status.into(),
        }
    }

    /// Create a success response
    pub const fn success(payload: Option<Bytes>) -> Self {
        Self {
            payload,
            status: status::common::SUCCESS,
        }
    }

    /// Create an error response from a status word
    pub fn error(status: impl Into<StatusWord>) -> Self {
        Self {
            payload: None,
            status: status.into(),
        }
    }

    /// Get the response payload data
    pub const fn payload(&self) -> &Option<Bytes> {
        &self.payload
    }

    /// Get the status word
    pub const fn status(&self) -> StatusWord {
        self.status
    }

    /// Check if the response indicates success
    pub const fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Parse response from raw bytes (including status word)
    pub fn from_bytes(data: &[u8]) -> Result<Self, Error> {
        if data.len() < 2 {
            return Err(Error::InvalidCommandLength(data.len()));
        }

        let len = data.len();
        let status = StatusWord::new(data[len - 2], data[len - 1]);
        let payload = (len > 2).then(|| Bytes::copy_from_slice(&data[..len - 2]));

        trace!(
            sw1 = format_args!("{:#04x}", status.sw1),
            sw2 = format_args!("{:#04x}", status.sw2),
            payload_len = payload.as_ref().map_or(0, |p| p.len()),
            "Parsed response frame"
        );

        Ok(Self { payload, status })
    }

    /// Serialize the response as `payload || SW1 SW2`
    pub fn to_bytes(&self) -> Bytes {
        let payload_len = self.payload.as_ref().map_or(0, |p| p.len());
        let mut buf = BytesMut::with_capacity(payload_len + 2);

        if let Some(payload) = &self.payload {
            buf.put_slice(payload);
        }
        buf.put_u8(self.status.sw1);
        buf.put_u8(self.status.sw2);

        buf.freeze()
    }
}

impl From<Response> for Bytes {
    fn from(response: Response) -> Self {
        response.to_bytes()
    }
}

impl TryFrom<&[u8]> for Response {
    type Error = Error;

    fn try_from(data: &[u8]) -> Result<Self, Error> {
        Self::from_bytes(data)
    }
}
