//! Simulated tag read command

use std::fs;
use std::path::Path;

use anyhow::{Context, anyhow};
use tapkit_bridge::{BadgeBridge, BridgeConfig};
use tapkit_core::codec::{decode_hex, encode_hex};
use tapkit_reader::{FieldValue, ReaderConfig, SimulatedToken, TagRecord};

use crate::utils::{SimulatorPlatform, display};

/// Present a token loaded from `path` to a reader session and show the record
pub(crate) fn read_command(path: &Path, key: Option<&str>, json: bool) -> anyhow::Result<()> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read token description {}", path.display()))?;
    let mut token: SimulatedToken =
        serde_json::from_str(&source).context("Invalid token description")?;

    let mut reader = ReaderConfig::new();
    if let Some(key) = key {
        reader = reader.with_default_key(parse_key(key)?);
    }

    let bridge = BadgeBridge::new(SimulatorPlatform, BridgeConfig::new().with_reader(reader));
    let session = bridge
        .start_reader_session()
        .map_err(|e| anyhow!("{}: {e}", e.code()))?;
    bridge.on_token_discovered(&mut token);
    let record = session.wait().map_err(|e| anyhow!("{}: {e}", e.code()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        print_record(&record);
    }

    Ok(())
}

fn parse_key(key: &str) -> anyhow::Result<[u8; 6]> {
    let bytes = decode_hex(key)?;
    bytes
        .as_slice()
        .try_into()
        .map_err(|_| anyhow!("Key must be 6 bytes, got {}", bytes.len()))
}

fn print_record(record: &TagRecord) {
    println!(
        "{}",
        display::key_value_box(
            "Tag",
            vec![
                ("UID", record.uid.clone()),
                ("Technologies", record.capabilities.join(", ")),
            ],
        )
    );

    let mut items = Vec::new();
    for (key, value) in &record.fields {
        match value {
            FieldValue::Map(entries) => {
                println!();
                println!(
                    "{}",
                    display::key_value_box(
                        key,
                        entries.iter().map(|(k, v)| (k.as_str(), v.clone())).collect(),
                    )
                );
            }
            FieldValue::Records(records) => {
                let labels: Vec<String> =
                    (0..records.len()).map(|i| format!("record_{i}")).collect();
                let entries = labels
                    .iter()
                    .zip(records)
                    .map(|(label, r)| {
                        let value = r.decoded.as_ref().map_or_else(
                            || format!("{:?} {}", r.raw.tnf, encode_hex(&r.raw.payload)),
                            ToString::to_string,
                        );
                        (label.as_str(), value)
                    })
                    .collect();
                println!();
                println!("{}", display::key_value_box(key, entries));
            }
            FieldValue::Bool(b) => items.push((key.as_str(), b.to_string())),
            FieldValue::Number(n) => items.push((key.as_str(), n.to_string())),
            FieldValue::Text(t) => items.push((key.as_str(), t.clone())),
        }
    }

    if !items.is_empty() {
        println!();
        println!("{}", display::key_value_box("Fields", items));
    }

    for (tag, error) in &record.per_capability_errors {
        println!("{}", display::warning(&format!("{tag}: {error}")));
    }

    if record.is_complete() {
        println!("{}", display::success("All technologies read"));
    } else {
        println!(
            "{}",
            display::info("Some technologies failed; partial fields are shown")
        );
    }
}
