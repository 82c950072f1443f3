//! Transport traits for tag technology access
//!
//! Platform drivers expose each technology a discovered token supports as an object that can be
//! connected, used, and closed. This module provides the common part of those objects and a
//! guard that guarantees the close on every exit path.

pub mod error;

use std::fmt;
use std::ops::{Deref, DerefMut};

use bytes::Bytes;
pub use error::TransportError;
use tracing::{debug, trace};

/// Trait for a single technology exposed by a connected token
///
/// Implementors provide the `do_*` methods; the provided methods wrap them with tracing so every
/// driver logs in the same shape.
pub trait TagTechnology: fmt::Debug {
    /// Short technology name used in logs
    fn name(&self) -> &'static str;

    /// Connect the technology for I/O
    fn connect(&mut self) -> Result<(), TransportError> {
        trace!(technology = self.name(), "Connecting");
        let result = self.do_connect();
        if let Err(e) = &result {
            debug!(technology = self.name(), error = ?e, "Connect failed");
        }
        result
    }

    /// Internal implementation of connect
    fn do_connect(&mut self) -> Result<(), TransportError>;

    /// Close the technology, releasing the link
    fn close(&mut self) -> Result<(), TransportError> {
        trace!(technology = self.name(), "Closing");
        self.do_close()
    }

    /// Internal implementation of close
    fn do_close(&mut self) -> Result<(), TransportError>;

    /// Whether the technology is currently connected
    fn is_connected(&self) -> bool;

    /// Send a raw frame and return the raw response
    fn transceive(&mut self, frame: &[u8]) -> Result<Bytes, TransportError> {
        trace!(technology = self.name(), command = ?hex::encode(frame), "Transceiving");
        let result = self.do_transceive(frame);
        match &result {
            Ok(response) => trace!(response = ?hex::encode(response), "Received raw response"),
            Err(e) => debug!(error = ?e, "Transport error during transceive"),
        }
        result
    }

    /// Internal implementation of transceive
    ///
    /// Technologies that only expose cached parameters keep the default.
    fn do_transceive(&mut self, _frame: &[u8]) -> Result<Bytes, TransportError> {
        Err(TransportError::other("transceive not supported"))
    }

    /// Largest frame the technology accepts in a single transceive
    fn max_transceive_length(&self) -> usize;
}

/// Scoped connection to a technology
///
/// Created by [`Connection::open`]; the technology is closed when the guard drops, whether the
/// read completed, returned early, or failed part way.
pub struct Connection<'a, T: TagTechnology + ?Sized> {
    technology: &'a mut T,
}

impl<T: TagTechnology + ?Sized> fmt::Debug for Connection<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("technology", &self.technology.name())
            .field("connected", &self.technology.is_connected())
            .finish()
    }
}

impl<'a, T: TagTechnology + ?Sized> Connection<'a, T> {
    /// Connect the technology and return a guard that closes it on drop
    ///
    /// A failed connect still closes the technology before the error is returned.
    pub fn open(technology: &'a mut T) -> Result<Self, TransportError> {
        if let Err(e) = technology.connect() {
            if let Err(close_err) = technology.close() {
                trace!(error = ?close_err, "Close after failed connect also failed");
            }
            return Err(e);
        }

        Ok(Self { technology })
    }
}

impl<T: TagTechnology + ?Sized> Deref for Connection<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.technology
    }
}

impl<T: TagTechnology + ?Sized> DerefMut for Connection<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.technology
    }
}

impl<T: TagTechnology + ?Sized> Drop for Connection<'_, T> {
    fn drop(&mut self) {
        if let Err(e) = self.technology.close() {
            debug!(technology = self.technology.name(), error = ?e, "Close failed");
        }
    }
}

#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct MockTechnology {
    pub(crate) connected: bool,
    pub(crate) fail_connect: bool,
    pub(crate) connects: usize,
    pub(crate) closes: usize,
}

#[cfg(test)]
impl TagTechnology for MockTechnology {
    fn name(&self) -> &'static str {
        "Mock"
    }

    fn do_connect(&mut self) -> Result<(), TransportError> {
        self.connects += 1;
        if self.fail_connect {
            return Err(TransportError::Connection);
        }
        self.connected = true;
        Ok(())
    }

    fn do_close(&mut self) -> Result<(), TransportError> {
        self.closes += 1;
        self.connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn max_transceive_length(&self) -> usize {
        253
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_then_fail(tech: &mut MockTechnology) -> Result<(), TransportError> {
        let conn = Connection::open(tech)?;
        assert!(conn.is_connected());
        Err(TransportError::Transmission)
    }

    #[test]
    fn test_connection_closes_on_drop() {
        let mut tech = MockTechnology::default();
        {
            let conn = Connection::open(&mut tech).unwrap();
            assert!(conn.is_connected());
        }
        assert!(!tech.connected);
        assert_eq!(tech.closes, 1);
    }

    #[test]
    fn test_connection_closes_on_error_path() {
        let mut tech = MockTechnology::default();
        assert_eq!(read_then_fail(&mut tech), Err(TransportError::Transmission));
        assert_eq!(tech.connects, 1);
        assert_eq!(tech.closes, 1);
    }

    #[test]
    fn test_failed_connect_still_closes() {
        let mut tech = MockTechnology {
            fail_connect: true,
            ..Default::default()
        };
        assert!(matches!(
            Connection::open(&mut tech),
            Err(TransportError::Connection)
        ));
        assert_eq!(tech.closes, 1);
    }

    #[test]
    fn test_transceive_default_unsupported() {
        let mut tech = MockTechnology::default();
        assert!(tech.transceive(&[0x30, 0x00]).is_err());
        assert_eq!(tech.max_transceive_length(), 253);
    }
}
