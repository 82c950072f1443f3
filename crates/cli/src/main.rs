//! Command-line simulator for badge emulation and tag reading

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod utils;

use commands::*;

#[derive(Parser)]
#[command(version, about = "Simulate badge emulation and contactless tag reads")]
struct Cli {
    /// Trace level output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a hex payload the way activation does
    DecodeHex {
        /// Hex string; whitespace, ':' and '-' separators are accepted
        #[arg(required = true)]
        input: String,
    },

    /// Arm a credential and answer command frames with it
    Emulate {
        /// Application identifier to register
        #[arg(required = true)]
        identifier: String,

        /// Payload returned on SELECT, as hex
        #[arg(required = true)]
        payload: String,

        /// Command frames to answer, as hex (default: a single SELECT)
        frames: Vec<String>,

        /// Seconds of simulated time to let pass before answering
        #[arg(long, default_value_t = 0)]
        elapsed: u64,

        /// Exposure window in seconds
        #[arg(long, default_value_t = 30)]
        window: u64,
    },

    /// Read a simulated token described in JSON
    Read {
        /// Path to the token description
        #[arg(required = true)]
        token: PathBuf,

        /// MIFARE Classic key A, as hex
        #[arg(long)]
        key: Option<String>,

        /// Print the record as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose);

    match &cli.command {
        Commands::DecodeHex { input } => decode_hex_command(input)?,
        Commands::Emulate {
            identifier,
            payload,
            frames,
            elapsed,
            window,
        } => emulate_command(identifier, payload, frames, *elapsed, *window)?,
        Commands::Read { token, key, json } => read_command(token, key.as_deref(), *json)?,
    }

    Ok(())
}

fn setup_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("trace")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .init();
}
