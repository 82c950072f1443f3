//! The credential slot shared by activation, frame answering, and deadline expiry

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::payload::Payload;
use crate::scheduler::DeadlineHandle;

#[derive(Debug, Default)]
pub(crate) struct SlotState {
    pub(crate) identifier: Option<String>,
    pub(crate) payload: Option<Payload>,
    pub(crate) active: bool,
    pub(crate) deadline: Option<Duration>,
    pub(crate) timer: Option<DeadlineHandle>,
    /// Bumped on every activation and clear; a deadline only erases the generation it armed.
    pub(crate) generation: u64,
}

impl SlotState {
    /// Wipe and detach the payload, cancel the deadline, and return the wiped buffer
    pub(crate) fn erase(&mut self) -> Option<Payload> {
        let payload = self.payload.take().map(|mut payload| {
            payload.wipe();
            payload
        });
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
        self.identifier = None;
        self.active = false;
        self.deadline = None;
        self.generation = self.generation.wrapping_add(1);
        payload
    }
}

/// Handle to the single credential slot
///
/// Cloning the handle shares the slot. All reads and writes go through one exclusive lock so a
/// frame is never answered from a half-updated slot.
#[derive(Debug, Clone, Default)]
pub struct CredentialSlot {
    state: Arc<Mutex<SlotState>>,
}

impl CredentialSlot {
    /// Create an empty slot
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn lock(&self) -> parking_lot::MutexGuard<'_, SlotState> {
        self.state.lock()
    }

    pub(crate) fn downgrade(&self) -> WeakSlot {
        WeakSlot(Arc::downgrade(&self.state))
    }

    /// Erase the slot; returns whether a payload was present
    pub fn clear(&self) -> bool {
        let erased = self.lock().erase();
        match erased {
            Some(payload) => {
                info!(len = payload.len(), "Credential payload erased");
                true
            }
            None => false,
        }
    }

    /// Whether a payload is currently held
    pub fn has_payload(&self) -> bool {
        self.lock().payload.is_some()
    }

    /// Whether frames are currently answered
    pub fn is_active(&self) -> bool {
        self.lock().active
    }
}

/// Weak reference held by deadline tasks so a pending deadline never keeps the slot alive
#[derive(Debug, Clone)]
pub(crate) struct WeakSlot(Weak<Mutex<SlotState>>);

impl WeakSlot {
    /// Erase the slot if it is still on the activation `generation`
    pub(crate) fn expire(&self, generation: u64) {
        let Some(state) = self.0.upgrade() else {
            return;
        };

        let mut state = state.lock();
        if state.generation != generation {
            debug!(
                armed = generation,
                current = state.generation,
                "Ignoring deadline for superseded activation"
            );
            return;
        }

        if let Some(payload) = state.erase() {
            info!(len = payload.len(), "Exposure window elapsed, credential erased");
        }
    }
}
