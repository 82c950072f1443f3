//! Emulation exchange command

use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use tapkit_bridge::{BadgeBridge, BridgeConfig};
use tapkit_core::codec::{decode_hex, encode_hex};
use tapkit_core::command::select_by_name;
use tapkit_core::{Bytes, Response};
use tapkit_hce::{EmulationConfig, EmulationState, ManualScheduler};
use tracing::debug;

use crate::utils::{SimulatorPlatform, display};

/// Arm a credential, let simulated time pass, then answer each frame
pub(crate) fn emulate_command(
    identifier: &str,
    payload: &str,
    frames: &[String],
    elapsed: u64,
    window: u64,
) -> anyhow::Result<()> {
    let scheduler = ManualScheduler::new();
    let config = BridgeConfig::new().with_emulation(
        EmulationConfig::new().with_exposure_window(Duration::from_secs(window)),
    );
    let bridge =
        BadgeBridge::with_scheduler(SimulatorPlatform, config, Arc::new(scheduler.clone()));

    bridge
        .activate_badge(Some(identifier), Some(payload))
        .map_err(|e| anyhow!("{}: {e}", e.code()))?;
    println!("{}", display::success("Credential armed"));

    if elapsed > 0 {
        scheduler.advance(Duration::from_secs(elapsed));
        println!(
            "{}",
            display::info(&format!("{elapsed}s of simulated time elapsed"))
        );
    }

    match bridge.emulator().state() {
        EmulationState::Armed { remaining, .. } => println!(
            "{}",
            display::info(&format!("{}s left in exposure window", remaining.as_secs()))
        ),
        EmulationState::Idle => println!("{}", display::warning("Credential erased")),
    }

    let frames = if frames.is_empty() {
        vec![default_select(identifier)?]
    } else {
        frames
            .iter()
            .map(|frame| decode_hex(frame).map(Bytes::from))
            .collect::<Result<Vec<_>, _>>()?
    };

    for frame in &frames {
        let answer = bridge.process_frame(frame);
        let response = Response::from_bytes(&answer)?;
        let status = response.status();

        println!(
            ">> {}\n<< {}  {}",
            encode_hex(frame),
            display::status(&encode_hex(&answer), status.is_success()),
            status.description()
        );
        debug!(%status, "Frame answered");
    }

    Ok(())
}

/// SELECT by name for the identifier, or a bare SELECT header if it is not hex
fn default_select(identifier: &str) -> anyhow::Result<Bytes> {
    match decode_hex(identifier) {
        Ok(aid) => Ok(select_by_name(&aid)?),
        Err(_) => Ok(Bytes::from_static(&[0x00, 0xA4, 0x04, 0x00])),
    }
}
