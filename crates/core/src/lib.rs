//! Core types for contactless credential emulation and tag reading
//!
//! This crate provides the foundational pieces shared by the emulation and reader engines:
//!
//! - Frame header parsing and response frame construction according to ISO/IEC 7816-4
//! - Status word definitions for the few statuses the emulated credential ever answers with
//! - A separator-tolerant hex codec used for payloads handed over by the host application
//! - The error taxonomy shared across the workspace
//! - Tag technology traits that platform drivers implement, and a scoped connection guard
//!   that closes the technology on every exit path
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![forbid(unsafe_code)]
#![warn(missing_docs, rustdoc::missing_crate_level_docs)]

// Re-export bytes for convenience
pub use bytes::{Bytes, BytesMut};

// Main modules
pub mod command;
pub mod error;
pub mod codec;
pub mod response;
pub mod transport;

pub use command::{FrameHeader, INS_SELECT};
pub use error::{DecodeError, Error, Result, ResultExt};
pub use response::status::StatusWord;
pub use response::Response;
pub use transport::{Connection, TagTechnology, TransportError};

/// Prelude module containing commonly used traits and types
pub mod prelude {
    // Core types
    pub use crate::{Bytes, BytesMut, DecodeError, Error, Result, ResultExt};

    // Frame related
    pub use crate::command::FrameHeader;
    pub use crate::response::Response;
    pub use crate::response::status::{StatusWord, common as status};

    // Transport layer
    pub use crate::transport::{Connection, TagTechnology, TransportError};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reexports() {
        let header = FrameHeader::parse(&[0x00, 0xA4, 0x04, 0x00]).unwrap();
        assert_eq!(header.cla, 0x00);
        assert_eq!(header.ins, INS_SELECT);
        assert_eq!(header.p1, 0x04);
        assert_eq!(header.p2, 0x00);

        let data = Bytes::from_static(&[0x01, 0x02, 0x03]);
        let resp = Response::success(Some(data.clone()));
        assert!(resp.is_success());
        assert_eq!(resp.payload(), &Some(data));
        assert_eq!(resp.status(), StatusWord::new(0x90, 0x00));
    }
}
