//! Host-facing bridge for badge emulation and tag reading
//!
//! [`BadgeBridge`] is the surface the host application calls into: it arms and erases the
//! emulated credential, probes the device's NFC support, and runs reader sessions that deliver
//! one [`TagRecord`](tapkit_reader::TagRecord) each. Errors carry the stable codes the host
//! matches on (see [`BridgeError::code`]).
//!
//! The device adapter is reached through the [`NfcPlatform`] trait. Platform glue forwards
//! inbound frames to [`BadgeBridge::process_frame`], discovered tokens to
//! [`BadgeBridge::on_token_discovered`], and lifecycle signals to
//! [`BadgeBridge::on_foreground_lost`].
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod bridge;
mod config;
mod error;
mod platform;
mod session;

pub use bridge::BadgeBridge;
pub use config::{BridgeConfig, DEFAULT_ROUTE_CATEGORY};
pub use error::BridgeError;
pub use platform::NfcPlatform;
pub use session::{ReaderSession, SessionResult};
