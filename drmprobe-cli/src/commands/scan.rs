//! Scan command - snapshot every display

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use drmprobe_core::config::{ConfigFile, OutputFormat};
use drmprobe_core::{DisplaySnapshot, ProbeReport};

use super::{device_paths, probe_devices};

/// Arguments for the scan command
#[derive(Args)]
pub struct ScanArgs {
    /// Probe only this device node
    #[arg(short, long)]
    pub device: Option<PathBuf>,

    /// Also report connectors with nothing plugged in
    #[arg(short, long)]
    pub all_connectors: bool,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

/// Snapshot every display on the selected devices
pub async fn scan(args: ScanArgs) -> Result<()> {
    let config = ConfigFile::load_or_default();

    let mut policy = config.scan.policy();
    policy.include_disconnected |= args.all_connectors;

    let format = if args.json {
        OutputFormat::Json
    } else {
        config.output.format
    };

    let paths = device_paths(args.device, &config)?;
    let reports = probe_devices(paths, policy).await?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&reports).context("Failed to encode JSON")?;
            println!("{}", json);
        }
        OutputFormat::Table => print_table(&reports),
    }

    Ok(())
}

fn print_table(reports: &[ProbeReport]) {
    println!("drmprobe - Displays\n");

    if reports.iter().all(|r| r.snapshots.is_empty()) {
        println!("No displays found.");
        println!("\nUse --all-connectors to include connectors with nothing plugged in.");
        return;
    }

    println!(
        "{:<4} {:<12} {:<6} {:<12} {:<22} {:<10} {:<10} {}",
        "Dev", "Connector", "CRTC", "Type", "Mode", "Native", "Physical", "Name"
    );
    println!("{}", "-".repeat(100));

    for report in reports {
        for snapshot in &report.snapshots {
            print_row(report.device_index, snapshot);
        }
    }

    for report in reports.iter().filter(|r| !r.invalid_crtcs.is_empty()) {
        println!(
            "\nDevice {}: unused CRTCs {:?}",
            report.device_index, report.invalid_crtcs
        );
    }
}

fn print_row(device_index: u8, snapshot: &DisplaySnapshot) {
    let current = snapshot
        .current_mode()
        .map(|m| m.to_string())
        .unwrap_or_else(|| "off".to_string());
    let native = snapshot
        .native_mode()
        .map(|m| m.size().to_string())
        .unwrap_or_else(|| "-".to_string());
    let physical = if snapshot.physical_size.is_empty() {
        "-".to_string()
    } else {
        format!("{}mm", snapshot.physical_size)
    };
    let name = match (&snapshot.manufacturer, &snapshot.display_name) {
        (Some(mfr), Some(name)) => format!("{} {}", mfr, name),
        (Some(mfr), None) => mfr.clone(),
        _ => "Unknown".to_string(),
    };

    println!(
        "{:<4} {:<12} {:<6} {:<12} {:<22} {:<10} {:<10} {}",
        device_index,
        snapshot.connector_name,
        snapshot.crtc_id,
        snapshot.connection_type.to_string(),
        current,
        native,
        physical,
        name
    );
}
