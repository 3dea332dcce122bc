//! Connector and CRTC inventory
//!
//! Walks the kernel's connector list, pairs every usable connector with a
//! CRTC, and reports the CRTCs nobody claimed.

use tracing::{debug, info, warn};

use crate::error::{Result, ResultExt};
use crate::kernel::{ConnectorInfo, CrtcInfo, KernelDevice, ObjectId, Resources};

/// It is safe to assume there will be no more than 256 DRM devices
pub const MAX_DRM_COUNT: usize = 256;

/// It is safe to assume there will be no more than 256 connectors per device
pub const MAX_DRM_CONNECTORS: usize = 256;

/// What a native display needs to be initialized and configured
///
/// `index` is the position of the connector in the kernel's connector list
/// and feeds the display identifier. The info owns its kernel records.
#[derive(Debug)]
pub struct HardwareDisplayControllerInfo {
    connector: ConnectorInfo,
    crtc: CrtcInfo,
    index: u8,
}

impl HardwareDisplayControllerInfo {
    pub fn new(connector: ConnectorInfo, crtc: CrtcInfo, index: u8) -> Self {
        Self {
            connector,
            crtc,
            index,
        }
    }

    pub fn connector(&self) -> &ConnectorInfo {
        &self.connector
    }

    pub fn crtc(&self) -> &CrtcInfo {
        &self.crtc
    }

    pub fn index(&self) -> u8 {
        self.index
    }

    /// Give the kernel records back to the caller
    pub fn into_parts(self) -> (ConnectorInfo, CrtcInfo, u8) {
        (self.connector, self.crtc, self.index)
    }
}

/// Which connectors are considered for a CRTC
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnumerationPolicy {
    /// Also pair connectors that are not reported as connected
    pub include_disconnected: bool,
}

impl EnumerationPolicy {
    fn admits(&self, connector: &ConnectorInfo) -> bool {
        self.include_disconnected || has_display(connector)
    }
}

/// Connected and reporting at least one mode
fn has_display(connector: &ConnectorInfo) -> bool {
    connector.is_connected() && !connector.modes.is_empty()
}

/// Parse the native display configuration of `device`
///
/// Returns every display that got a CRTC, plus the CRTCs that were not picked
/// for any connector.
pub fn get_display_infos_and_invalid_crtcs(
    device: &impl KernelDevice,
) -> Result<(Vec<HardwareDisplayControllerInfo>, Vec<ObjectId>)> {
    get_display_infos_and_invalid_crtcs_with_policy(device, EnumerationPolicy::default())
}

/// Same as [`get_display_infos_and_invalid_crtcs`] with an explicit policy
pub fn get_display_infos_and_invalid_crtcs_with_policy(
    device: &impl KernelDevice,
    policy: EnumerationPolicy,
) -> Result<(Vec<HardwareDisplayControllerInfo>, Vec<ObjectId>)> {
    let resources = device
        .resources()
        .context("Failed to get DRM resources")?;

    let mut candidates: Vec<(u8, ConnectorInfo)> = Vec::new();
    for (position, &connector_id) in resources.connectors.iter().enumerate() {
        let Ok(index) = u8::try_from(position) else {
            warn!(
                "Connector {} exceeds the limit of {} connectors, skipping",
                connector_id, MAX_DRM_CONNECTORS
            );
            continue;
        };

        let connector = match device.connector(connector_id) {
            Ok(connector) => connector,
            Err(e) => {
                warn!("Failed to read connector {}: {}", connector_id, e);
                continue;
            }
        };

        if !policy.admits(&connector) {
            debug!(
                "Connector {} ({}) is {:?} with {} modes, not a candidate",
                connector.id,
                connector.name(),
                connector.connection,
                connector.modes.len()
            );
            continue;
        }

        candidates.push((index, connector));
    }

    // Connected monitors pick CRTCs before ports with nothing plugged in.
    let (connected, others): (Vec<_>, Vec<_>) = candidates
        .into_iter()
        .partition(|(_, connector)| has_display(connector));

    let mut invalid_crtcs = resources.crtcs.clone();
    let mut displays: Vec<HardwareDisplayControllerInfo> = Vec::new();

    for (index, connector) in connected.into_iter().chain(others) {
        let Some(crtc_id) = select_crtc(device, &connector, &resources, &displays) else {
            warn!(
                "No free CRTC for connector {} ({}), skipping",
                connector.id,
                connector.name()
            );
            continue;
        };

        let crtc = match device.crtc(crtc_id) {
            Ok(crtc) => crtc,
            Err(e) => {
                warn!("Failed to read CRTC {}: {}", crtc_id, e);
                continue;
            }
        };

        invalid_crtcs.retain(|&id| id != crtc_id);
        debug!(
            "Connector {} ({}) -> CRTC {} (index {})",
            connector.id,
            connector.name(),
            crtc_id,
            index
        );
        displays.push(HardwareDisplayControllerInfo::new(connector, crtc, index));
    }

    displays.sort_by_key(HardwareDisplayControllerInfo::index);

    info!(
        "Found {} display(s), {} unused CRTC(s)",
        displays.len(),
        invalid_crtcs.len()
    );

    Ok((displays, invalid_crtcs))
}

/// The displays found by [`get_display_infos_and_invalid_crtcs`]
pub fn get_available_display_controller_infos(
    device: &impl KernelDevice,
) -> Result<Vec<HardwareDisplayControllerInfo>> {
    get_display_infos_and_invalid_crtcs(device).map(|(displays, _)| displays)
}

fn is_crtc_in_use(crtc_id: ObjectId, displays: &[HardwareDisplayControllerInfo]) -> bool {
    displays.iter().any(|d| d.crtc().id == crtc_id)
}

/// Pick a CRTC for `connector`
///
/// Reuses the CRTC behind the connector's current encoder when it is still
/// free. Otherwise the first free CRTC, in resource order, that one of the
/// connector's encoders can drive.
fn select_crtc(
    device: &impl KernelDevice,
    connector: &ConnectorInfo,
    resources: &Resources,
    displays: &[HardwareDisplayControllerInfo],
) -> Option<ObjectId> {
    if connector.encoder_id != 0 {
        if let Ok(encoder) = device.encoder(connector.encoder_id) {
            if encoder.crtc_id != 0 && !is_crtc_in_use(encoder.crtc_id, displays) {
                return Some(encoder.crtc_id);
            }
        }
    }

    for &encoder_id in &connector.encoders {
        let encoder = match device.encoder(encoder_id) {
            Ok(encoder) => encoder,
            Err(e) => {
                debug!("Failed to read encoder {}: {}", encoder_id, e);
                continue;
            }
        };

        let free = resources
            .crtcs
            .iter()
            .enumerate()
            .take(32)
            .find(|&(bit, &crtc_id)| {
                encoder.possible_crtcs & (1 << bit) != 0 && !is_crtc_in_use(crtc_id, displays)
            });

        if let Some((_, &crtc_id)) = free {
            return Some(crtc_id);
        }
    }

    None
}
