//! Emulation state machine
//!
//! The emulator arms the credential slot with a payload, answers inbound frames from the slot,
//! and erases the slot when the exposure window elapses, the host deactivates, the reader link
//! drops, or the application loses the foreground.
//!
//! ```text
//! Idle --activate--> Armed --clear / expiry / deactivate / session end--> Idle
//!                    Armed --activate--> Armed (payload replaced, deadline reset)
//! ```

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tapkit_core::codec::decode_hex;
use tapkit_core::prelude::*;
use tracing::{debug, info, instrument, trace};

use crate::config::EmulationConfig;
use crate::payload::Payload;
use crate::scheduler::{DeadlineScheduler, ThreadScheduler};
use crate::slot::CredentialSlot;

/// Why the reader-side link ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeactivationReason {
    /// The RF link to the reader was lost
    LinkLost,
    /// The reader selected a different application
    Deselected,
}

/// Snapshot of the emulator state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmulationState {
    /// No payload held
    Idle,
    /// Payload held with a deadline pending
    Armed {
        /// Identifier the payload was activated under
        identifier: String,
        /// Whether frames are answered; `false` while suspended for a reader session
        active: bool,
        /// Time left in the exposure window
        remaining: Duration,
    },
}

/// Emulation state machine over a shared [`CredentialSlot`]
#[derive(Debug, Clone)]
pub struct Emulator {
    slot: CredentialSlot,
    scheduler: Arc<dyn DeadlineScheduler>,
    config: EmulationConfig,
}

impl Default for Emulator {
    fn default() -> Self {
        Self::new(
            CredentialSlot::new(),
            Arc::new(ThreadScheduler::new()),
            EmulationConfig::default(),
        )
    }
}

impl Emulator {
    /// Create an emulator over `slot`, scheduling deadlines with `scheduler`
    pub fn new(
        slot: CredentialSlot,
        scheduler: Arc<dyn DeadlineScheduler>,
        config: EmulationConfig,
    ) -> Self {
        Self {
            slot,
            scheduler,
            config,
        }
    }

    /// The slot this emulator answers from
    pub const fn slot(&self) -> &CredentialSlot {
        &self.slot
    }

    /// The active configuration
    pub const fn config(&self) -> &EmulationConfig {
        &self.config
    }

    /// Arm the slot with `payload_hex` under `identifier`
    ///
    /// Malformed hex is rejected before the slot is touched. Re-activation replaces the payload,
    /// erases the previous one, and restarts the exposure window; the earlier deadline is
    /// cancelled rather than left to fire.
    #[instrument(level = "debug", skip(self, payload_hex))]
    pub fn activate(&self, identifier: &str, payload_hex: &str) -> Result<()> {
        if identifier.trim().is_empty() {
            return Err(Error::invalid_argument("identifier is required"));
        }

        let payload = decode_hex(payload_hex)
            .map_err(|e| Error::invalid_argument(format!("payload is not valid hex: {e}")))?;
        let payload = Payload::new(payload);
        let len = payload.len();

        let mut state = self.slot.lock();
        if let Some(previous) = state.erase() {
            debug!(len = previous.len(), "Replacing armed payload");
        }

        let generation = state.generation;
        let window = self.config.exposure_window;
        let weak = self.slot.downgrade();
        let timer = self
            .scheduler
            .schedule(window, Box::new(move || weak.expire(generation)));

        state.identifier = Some(identifier.to_string());
        state.payload = Some(payload);
        state.active = true;
        state.deadline = Some(self.scheduler.now() + window);
        state.timer = Some(timer);
        drop(state);

        info!(identifier, len, ?window, "Credential armed");
        Ok(())
    }

    /// Stop answering and erase the slot immediately
    pub fn deactivate(&self) {
        if self.slot.clear() {
            debug!("Credential deactivated");
        }
    }

    /// Erase the slot: zero the payload, drop it, cancel the deadline, stop answering
    ///
    /// Returns whether there was anything to erase.
    pub fn clear(&self) -> bool {
        self.slot.clear()
    }

    /// Stop answering frames without erasing the payload
    ///
    /// The exposure deadline keeps running; the payload is still erased when it elapses.
    pub fn suspend(&self) {
        let mut state = self.slot.lock();
        if state.active {
            state.active = false;
            debug!("Credential suspended");
        }
    }

    /// Answer an inbound command frame
    ///
    /// Returns `payload || 90 00` for a SELECT while armed and active, and `6F 00` for
    /// everything else. The slot is not modified.
    pub fn respond(&self, frame: &[u8]) -> Bytes {
        let state = self.slot.lock();

        let response = match (&state.payload, state.active) {
            (Some(payload), true) => match FrameHeader::parse(frame) {
                Ok(header) if header.is_select() => {
                    Response::success(Some(Bytes::copy_from_slice(payload.as_bytes())))
                }
                Ok(header) => {
                    trace!(cla = header.cla, ins = header.ins, "Declining unclassified frame");
                    Response::error(status::NO_PRECISE_DIAGNOSIS)
                }
                Err(_) => {
                    trace!(len = frame.len(), "Declining short frame");
                    Response::error(status::NO_PRECISE_DIAGNOSIS)
                }
            },
            _ => Response::error(status::NO_PRECISE_DIAGNOSIS),
        };
        drop(state);

        trace!(status = %response.status(), "Answered frame");
        response.to_bytes()
    }

    /// The reader-side link ended; sessions are not resumable so the slot is erased
    pub fn on_session_end(&self, reason: DeactivationReason) {
        if self.slot.clear() {
            info!(?reason, "Reader session ended, credential erased");
        }
    }

    /// Current state snapshot
    pub fn state(&self) -> EmulationState {
        let state = self.slot.lock();
        match (&state.identifier, &state.payload) {
            (Some(identifier), Some(_)) => EmulationState::Armed {
                identifier: identifier.clone(),
                active: state.active,
                remaining: state
                    .deadline
                    .map_or(Duration::ZERO, |d| d.saturating_sub(self.scheduler.now())),
            },
            _ => EmulationState::Idle,
        }
    }
}
