//! Pending reader sessions

use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, bounded};
use tapkit_reader::TagRecord;
use tracing::debug;

use crate::error::BridgeError;

/// Outcome delivered to a reader session
pub type SessionResult = Result<TagRecord, BridgeError>;

/// Message used when the bridge goes away with a session pending
const BRIDGE_DROPPED: &str = "NFC scan cancelled";

/// Receiving half of a reader session
///
/// Exactly one outcome is delivered: the record read from the first presented token, or the
/// error that ended the session.
#[derive(Debug)]
pub struct ReaderSession {
    receiver: Receiver<SessionResult>,
}

/// Sending half kept by the bridge while a session is pending
#[derive(Debug)]
pub(crate) struct PendingSession {
    id: u64,
    sender: Sender<SessionResult>,
}

pub(crate) fn session_channel(id: u64) -> (PendingSession, ReaderSession) {
    let (sender, receiver) = bounded(1);
    (PendingSession { id, sender }, ReaderSession { receiver })
}

impl PendingSession {
    pub(crate) const fn id(&self) -> u64 {
        self.id
    }

    /// Deliver the outcome; a session whose receiver is gone is dropped quietly
    pub(crate) fn complete(self, result: SessionResult) {
        if self.sender.try_send(result).is_err() {
            debug!(session = self.id, "Reader session receiver dropped");
        }
    }
}

impl ReaderSession {
    /// Block until the session ends
    pub fn wait(&self) -> SessionResult {
        self.receiver
            .recv()
            .unwrap_or_else(|_| Err(BridgeError::cancelled(BRIDGE_DROPPED)))
    }

    /// Block for at most `timeout`, returning `None` if the session is still pending
    pub fn wait_timeout(&self, timeout: Duration) -> Option<SessionResult> {
        match self.receiver.recv_timeout(timeout) {
            Ok(result) => Some(result),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                Some(Err(BridgeError::cancelled(BRIDGE_DROPPED)))
            }
        }
    }

    /// The outcome if the session has already ended
    pub fn try_result(&self) -> Option<SessionResult> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(BridgeError::cancelled(BRIDGE_DROPPED))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_outcome() {
        let (pending, session) = session_channel(1);
        assert!(session.try_result().is_none());

        pending.complete(Err(BridgeError::cancelled("New scan started")));
        assert_eq!(
            session.wait(),
            Err(BridgeError::cancelled("New scan started"))
        );
    }

    #[test]
    fn test_dropped_sender_cancels() {
        let (pending, session) = session_channel(2);
        drop(pending);

        let result = session.wait_timeout(Duration::from_millis(10)).unwrap();
        assert_eq!(result.unwrap_err().code(), "NFC_CANCELLED");
    }

    #[test]
    fn test_completing_after_receiver_dropped() {
        let (pending, session) = session_channel(3);
        drop(session);
        pending.complete(Ok(TagRecord::default()));
    }
}
