//! One-shot probe of a DRM device
//!
//! Runs the inventory, builds a snapshot per display and lays the displays
//! out left to right.

use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::error::Result;
use crate::inventory::{get_display_infos_and_invalid_crtcs_with_policy, EnumerationPolicy};
use crate::kernel::{KernelDevice, ObjectId};
use crate::snapshot::{create_display_snapshot, DisplaySnapshot};
use crate::types::Point;

/// Everything learned about one device
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeReport {
    pub device_index: u8,
    pub snapshots: Vec<DisplaySnapshot>,
    /// CRTCs no display was paired with
    pub invalid_crtcs: Vec<ObjectId>,
}

impl ProbeReport {
    /// Horizontal extent covered by this device's displays
    pub fn width(&self) -> i32 {
        self.snapshots
            .iter()
            .map(|s| s.origin.x + s.pixel_size().width as i32)
            .max()
            .unwrap_or(0)
    }
}

/// Probe `device` and place its displays starting at `origin_x`
pub fn probe_card(
    device: &impl KernelDevice,
    sys_path: &Path,
    device_index: u8,
    origin_x: i32,
    policy: EnumerationPolicy,
) -> Result<ProbeReport> {
    let (displays, invalid_crtcs) = get_display_infos_and_invalid_crtcs_with_policy(device, policy)?;

    let mut x = origin_x;
    let snapshots = displays
        .iter()
        .map(|display| {
            let snapshot =
                create_display_snapshot(device, display, sys_path, device_index, Point::new(x, 0));
            x += snapshot.pixel_size().width as i32;
            snapshot
        })
        .collect::<Vec<_>>();

    info!(
        "Device {} ({:?}): {} display(s)",
        device_index,
        sys_path,
        snapshots.len()
    );

    Ok(ProbeReport {
        device_index,
        snapshots,
        invalid_crtcs,
    })
}
