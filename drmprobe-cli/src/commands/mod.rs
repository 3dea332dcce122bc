//! CLI command implementations

mod config;
mod devices;
mod modes;
mod scan;

use std::path::PathBuf;

use anyhow::{Context, Result};
use drmprobe_core::config::ConfigFile;
use drmprobe_core::types::Point;
use drmprobe_core::{list_cards, probe_card, Card, EnumerationPolicy, ProbeReport};
use tracing::warn;

pub use config::{config, ConfigArgs};
pub use devices::devices;
pub use modes::{modes, ModesArgs};
pub use scan::{scan, ScanArgs};

/// Device nodes to probe: the explicit one, else the configured ones, else all
fn device_paths(explicit: Option<PathBuf>, config: &ConfigFile) -> Result<Vec<PathBuf>> {
    if let Some(path) = explicit {
        return Ok(vec![path]);
    }
    if !config.scan.devices.is_empty() {
        return Ok(config.scan.devices.clone());
    }
    list_cards().context("Failed to list /dev/dri")
}

/// Probe every device on a blocking worker and lay them out left to right
///
/// Devices that cannot be opened are skipped; the first failure is returned
/// only when nothing could be probed.
async fn probe_devices(paths: Vec<PathBuf>, policy: EnumerationPolicy) -> Result<Vec<ProbeReport>> {
    let tasks: Vec<_> = paths
        .into_iter()
        .enumerate()
        .filter_map(|(index, path)| {
            let device_index = u8::try_from(index).ok()?;
            Some(tokio::task::spawn_blocking(move || {
                let card = Card::open(&path)?;
                let sys_path = card.sys_path()?;
                probe_card(&card, &sys_path, device_index, 0, policy)
                    .map_err(|e| e.with_context(format!("Failed to probe {:?}", path)))
            }))
        })
        .collect();

    let mut reports = Vec::new();
    let mut first_error = None;
    let mut x = 0;
    for task in tasks {
        match task.await.context("Probe task panicked")? {
            Ok(mut report) => {
                report.snapshots = report
                    .snapshots
                    .into_iter()
                    .map(|s| {
                        let origin = Point::new(s.origin.x + x, s.origin.y);
                        s.with_origin(origin)
                    })
                    .collect();
                x = report.width().max(x);
                reports.push(report);
            }
            Err(e) => {
                warn!("{}", e);
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) if reports.is_empty() => Err(e.into()),
        _ => Ok(reports),
    }
}
