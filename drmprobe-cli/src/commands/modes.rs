//! Modes command - list the modes of one connector

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use drmprobe_core::config::ConfigFile;
use drmprobe_core::{EnumerationPolicy, ProbeError};

use super::{device_paths, probe_devices};

/// Arguments for the modes command
#[derive(Args)]
pub struct ModesArgs {
    /// Connector name, e.g. HDMI-A-1 or eDP-1
    pub connector: String,

    /// Probe only this device node
    #[arg(short, long)]
    pub device: Option<PathBuf>,
}

/// Print the mode list of a connector, marking the current and native modes
pub async fn modes(args: ModesArgs) -> Result<()> {
    let config = ConfigFile::load_or_default();
    let paths = device_paths(args.device, &config)?;
    let policy = EnumerationPolicy {
        include_disconnected: true,
    };
    let reports = probe_devices(paths, policy).await?;

    let snapshot = reports
        .iter()
        .flat_map(|r| r.snapshots.iter())
        .find(|s| s.connector_name.eq_ignore_ascii_case(&args.connector))
        .ok_or_else(|| ProbeError::not_found(format!("connector {}", args.connector)))?;

    println!(
        "{} on CRTC {} ({})\n",
        snapshot.connector_name,
        snapshot.crtc_id,
        snapshot.sys_path.display()
    );

    if snapshot.modes().is_empty() {
        println!("No modes reported.");
        return Ok(());
    }

    for (index, mode) in snapshot.modes().iter().enumerate() {
        let mut markers = Vec::new();
        if snapshot.current_mode_index() == Some(index) {
            markers.push("current");
        }
        if snapshot.native_mode_index() == Some(index) {
            markers.push("native");
        }
        let suffix = if markers.is_empty() {
            String::new()
        } else {
            format!("  ({})", markers.join(", "))
        };
        println!("  {:>3}  {}{}", index, mode, suffix);
    }

    Ok(())
}
