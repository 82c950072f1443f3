//! Host card emulation for a single time-bounded credential
//!
//! The [`Emulator`] answers reader-initiated frames from a [`CredentialSlot`]. A payload is
//! answerable only between activation and the first of: the exposure deadline, an explicit
//! deactivation or clear, the end of the reader session, or the host losing the foreground.
//! Every one of those paths goes through the same erasure, which zeroes the payload buffer
//! before releasing it and cancels the pending deadline.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use tapkit_hce::{CredentialSlot, EmulationConfig, Emulator, ManualScheduler};
//!
//! let scheduler = ManualScheduler::new();
//! let emulator = Emulator::new(
//!     CredentialSlot::new(),
//!     Arc::new(scheduler.clone()),
//!     EmulationConfig::default(),
//! );
//!
//! emulator.activate("A0000002471001", "0102030405")?;
//! let response = emulator.respond(&[0x00, 0xA4, 0x04, 0x00]);
//! assert_eq!(response.as_ref(), &[0x01, 0x02, 0x03, 0x04, 0x05, 0x90, 0x00]);
//!
//! scheduler.advance(emulator.config().exposure_window);
//! assert_eq!(emulator.respond(&[0x00, 0xA4, 0x04, 0x00]).as_ref(), &[0x6F, 0x00]);
//! # Ok::<(), tapkit_core::Error>(())
//! ```
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod emulator;
mod payload;
mod scheduler;
mod slot;

pub use config::{DEFAULT_EXPOSURE_WINDOW, EmulationConfig};
pub use emulator::{DeactivationReason, EmulationState, Emulator};
pub use payload::Payload;
pub use scheduler::{DeadlineHandle, DeadlineScheduler, DeadlineTask, ManualScheduler, ThreadScheduler};
pub use slot::CredentialSlot;
