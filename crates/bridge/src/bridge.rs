//! Host-facing badge bridge

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use parking_lot::Mutex;
use tapkit_hce::{DeactivationReason, DeadlineScheduler, Emulator, ThreadScheduler};
use tapkit_reader::{TagReader, TokenHandle};
use tracing::{debug, info, instrument, warn};

use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::platform::NfcPlatform;
use crate::session::{PendingSession, ReaderSession, session_channel};

/// Composition root for credential emulation and tag reading on one device
///
/// Owns the single [`Emulator`] answering inbound frames and the [`TagReader`] used by reader
/// sessions. At most one reader session is pending; starting another cancels it.
#[derive(Debug)]
pub struct BadgeBridge<P: NfcPlatform> {
    platform: P,
    emulator: Emulator,
    reader: TagReader,
    config: BridgeConfig,
    pending: Mutex<Option<PendingSession>>,
    next_session: AtomicU64,
}

impl<P: NfcPlatform> BadgeBridge<P> {
    /// Create a bridge whose deadlines run on background threads
    pub fn new(platform: P, config: BridgeConfig) -> Self {
        Self::with_scheduler(platform, config, Arc::new(ThreadScheduler::new()))
    }

    /// Create a bridge with the given deadline scheduler
    pub fn with_scheduler(
        platform: P,
        config: BridgeConfig,
        scheduler: Arc<dyn DeadlineScheduler>,
    ) -> Self {
        let emulator = Emulator::new(Default::default(), scheduler, config.emulation.clone());
        let reader = TagReader::new(config.reader.clone());
        Self {
            platform,
            emulator,
            reader,
            config,
            pending: Mutex::new(None),
            next_session: AtomicU64::new(1),
        }
    }

    /// The platform adapter
    pub const fn platform(&self) -> &P {
        &self.platform
    }

    /// The emulation engine
    pub const fn emulator(&self) -> &Emulator {
        &self.emulator
    }

    /// The active configuration
    pub const fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Arm the credential and route its identifier to this application
    ///
    /// The slot is armed before registration; if the platform refuses the identifier the slot
    /// is erased again and the platform error returned.
    #[instrument(level = "debug", skip(self, payload_hex))]
    pub fn activate_badge(
        &self,
        identifier: Option<&str>,
        payload_hex: Option<&str>,
    ) -> Result<bool, BridgeError> {
        let (Some(identifier), Some(payload_hex)) = (identifier, payload_hex) else {
            return Err(BridgeError::InvalidArgs(
                "Identifier and payload are required".to_string(),
            ));
        };

        self.emulator.activate(identifier, payload_hex)?;

        if !self.platform.has_adapter() {
            debug!("No NFC adapter, identifier not registered");
            return Ok(true);
        }

        if let Err(e) = self
            .platform
            .register_identifier(identifier, &self.config.route_category)
        {
            warn!(identifier, error = %e, "Identifier registration failed");
            self.emulator.clear();
            return Err(e.into());
        }

        Ok(true)
    }

    /// Erase the credential immediately
    pub fn deactivate_badge(&self) -> bool {
        self.emulator.deactivate();
        true
    }

    /// Whether the adapter is present and enabled; `false` on platform failure
    pub fn is_available(&self) -> bool {
        self.platform.is_enabled().unwrap_or_else(|e| {
            debug!(error = %e, "Adapter state probe failed");
            false
        })
    }

    /// Whether the device can emulate a card; `false` on platform failure
    pub fn is_emulation_supported(&self) -> bool {
        self.platform.supports_emulation().unwrap_or_else(|e| {
            debug!(error = %e, "Emulation support probe failed");
            false
        })
    }

    /// Start waiting for a token
    ///
    /// Frame answering is suspended for the duration of the session, without erasing the
    /// credential. A session already pending completes with a cancellation.
    pub fn start_reader_session(&self) -> Result<ReaderSession, BridgeError> {
        if !self.platform.is_enabled()? {
            return Err(BridgeError::Unavailable);
        }

        let id = self.next_session.fetch_add(1, Ordering::Relaxed);
        let (pending, session) = session_channel(id);

        let previous = self.pending.lock().replace(pending);
        if let Some(previous) = previous {
            debug!(session = previous.id(), "Superseding reader session");
            previous.complete(Err(BridgeError::cancelled("New scan started")));
        }

        self.emulator.suspend();

        if let Err(e) = self
            .platform
            .enable_reader_mode(self.config.reader.presence_check_delay)
        {
            let mut pending = self.pending.lock();
            if pending.as_ref().is_some_and(|p| p.id() == id) {
                pending.take();
            }
            return Err(e.into());
        }

        info!(session = id, "Reader session started");
        Ok(session)
    }

    /// Stop the pending reader session, if any
    pub fn stop_reader_session(&self) -> bool {
        self.disable_reader_mode();
        self.cancel_pending("NFC scan cancelled");
        true
    }

    /// Whether a reader session is waiting for a token
    pub fn has_pending_session(&self) -> bool {
        self.pending.lock().is_some()
    }

    /// Read a token the platform discovered while reader mode was enabled
    ///
    /// The pending session receives the record and reader mode is switched off. Returns
    /// `false` if no session was waiting, in which case the token is not read.
    ///
    /// The session stays pending during the read. If it is stopped or superseded meanwhile it
    /// has already been cancelled, and the record is dropped.
    pub fn on_token_discovered(&self, handle: &mut dyn TokenHandle) -> bool {
        let Some(id) = self.pending.lock().as_ref().map(PendingSession::id) else {
            debug!("Token discovered with no pending session");
            return false;
        };

        let result = if handle.capability_tags().is_empty() {
            Err(BridgeError::Read(
                "Token reported no technologies".to_string(),
            ))
        } else {
            Ok(self.reader.read_token(handle))
        };

        let pending = self.pending.lock().take_if(|p| p.id() == id);
        let Some(pending) = pending else {
            debug!(session = id, "Session ended during read, dropping record");
            return true;
        };

        self.disable_reader_mode();
        pending.complete(result);
        true
    }

    /// Answer a frame from a reader on the emulation side
    pub fn process_frame(&self, frame: &[u8]) -> Bytes {
        self.emulator.respond(frame)
    }

    /// The reader on the emulation side went away
    pub fn on_link_deactivated(&self, reason: DeactivationReason) {
        self.emulator.on_session_end(reason);
    }

    /// The host application left the foreground
    ///
    /// Stops any reader session and erases the credential; the host has to activate again.
    pub fn on_foreground_lost(&self) {
        self.stop_reader_session();
        if self.emulator.clear() {
            info!("Credential erased on foreground loss");
        }
    }

    fn disable_reader_mode(&self) {
        if let Err(e) = self.platform.disable_reader_mode() {
            debug!(error = %e, "Disabling reader mode failed");
        }
    }

    fn cancel_pending(&self, message: &str) {
        let pending = self.pending.lock().take();
        if let Some(pending) = pending {
            debug!(session = pending.id(), "Cancelling reader session");
            pending.complete(Err(BridgeError::cancelled(message)));
        }
    }
}
