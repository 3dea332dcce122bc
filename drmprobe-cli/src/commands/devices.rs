//! Devices command - list DRM device nodes

use std::path::PathBuf;

use anyhow::{Context, Result};
use drmprobe_core::kernel::Resources;
use drmprobe_core::{list_cards, Card, KernelDevice};

struct DeviceRow {
    path: PathBuf,
    details: drmprobe_core::Result<(PathBuf, Resources)>,
}

fn inspect(path: PathBuf) -> DeviceRow {
    let details = Card::open(&path).and_then(|card| Ok((card.sys_path()?, card.resources()?)));
    DeviceRow { path, details }
}

/// List `/dev/dri/card*` with their sysfs path and object counts
pub async fn devices() -> Result<()> {
    let rows = tokio::task::spawn_blocking(|| {
        list_cards().map(|cards| cards.into_iter().map(inspect).collect::<Vec<_>>())
    })
    .await
    .context("Device listing panicked")??;

    println!("drmprobe - DRM Devices\n");

    if rows.is_empty() {
        println!("No DRM devices found under /dev/dri.");
        return Ok(());
    }

    println!(
        "{:<3} {:<18} {:>5} {:>5} {:>5}  {}",
        "#", "Device", "Conn", "Enc", "CRTC", "sysfs"
    );
    println!("{}", "-".repeat(80));

    for (index, row) in rows.iter().enumerate() {
        let path = row.path.display().to_string();
        match &row.details {
            Ok((sys_path, resources)) => println!(
                "{:<3} {:<18} {:>5} {:>5} {:>5}  {}",
                index,
                path,
                resources.connectors.len(),
                resources.encoders.len(),
                resources.crtcs.len(),
                sys_path.display()
            ),
            Err(e) => println!("{:<3} {:<18} unavailable: {}", index, path, e),
        }
    }

    Ok(())
}
