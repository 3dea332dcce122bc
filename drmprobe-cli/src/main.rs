//! drmprobe CLI
//!
//! Inspect DRM/KMS displays: connectors, CRTCs, modes and EDID identity.
//!
//! # Usage
//!
//! ```bash
//! # List DRM devices
//! drmprobe devices
//!
//! # Snapshot every connected display
//! drmprobe scan --json
//!
//! # Show the modes of one connector
//! drmprobe modes HDMI-A-1
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use drmprobe_core::ProbeError;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// drmprobe - DRM display inventory and mode resolution
#[derive(Parser)]
#[command(name = "drmprobe")]
#[command(version)]
#[command(about = "DRM display inventory and mode resolution", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Subcommand to run
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List DRM device nodes
    #[command(alias = "ls")]
    Devices,

    /// Pair connectors with CRTCs and print a snapshot per display
    Scan(commands::ScanArgs),

    /// Show the modes of a connector
    Modes(commands::ModesArgs),

    /// Manage configuration
    Config(commands::ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let mut filter = EnvFilter::from_default_env();
    for target in ["drmprobe", "drmprobe_core"] {
        filter = filter.add_directive(format!("{}={}", target, level).parse()?);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Devices => commands::devices().await,
        Commands::Scan(args) => commands::scan(args).await,
        Commands::Modes(args) => commands::modes(args).await,
        Commands::Config(args) => commands::config(args).await,
    };

    if let Err(e) = &result {
        if let Some(hint) = e.downcast_ref::<ProbeError>().and_then(ProbeError::user_hint) {
            eprintln!("hint: {}", hint);
        }
    }

    result
}
