//! Display snapshot construction
//!
//! A [`DisplaySnapshot`] is the immutable description of one connected
//! display that the display-configuration layer consumes. It is assembled from
//! the inventory, the mode catalog, the EDID, and a handful of DRM properties.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::edid::Edid;
use crate::format::get_maximum_cursor_size;
use crate::inventory::HardwareDisplayControllerInfo;
use crate::kernel::{ConnectorKind, KernelDevice, ObjectProperties};
use crate::modes::{extract_display_modes, ExtractedModes};
use crate::properties::{self, find_drm_property, parse_path_blob};
use crate::types::{
    ContentProtectionMethod, DisplayConnectionType, DisplayMode, HdcpState, Point,
    PrivacyScreenState, Size,
};

/// Immutable description of a connected display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplaySnapshot {
    /// Stable id; derived from the EDID when one is available
    pub display_id: i64,
    /// Id derived from the port only
    pub port_display_id: i64,
    pub connector_id: u32,
    pub connector_name: String,
    pub crtc_id: u32,
    /// Root connector of an MST tree, or the connector itself
    pub base_connector_id: u64,
    /// MST branch ports below the base connector
    pub path_topology: Vec<u64>,
    pub connection_type: DisplayConnectionType,
    pub origin: Point,
    /// Millimetres; zero when no EDID could be read
    pub physical_size: Size,
    pub sys_path: PathBuf,
    pub device_index: u8,
    pub manufacturer: Option<String>,
    pub manufacturer_id: u16,
    pub product_code: u16,
    pub display_name: Option<String>,
    pub year_of_manufacture: Option<u16>,
    pub bits_per_channel: Option<u8>,
    pub is_aspect_preserving_scaling: bool,
    pub has_content_protection: bool,
    pub hdcp_state: Option<HdcpState>,
    pub content_protection_method: Option<ContentProtectionMethod>,
    pub has_color_correction_matrix: bool,
    pub privacy_screen_state: PrivacyScreenState,
    pub maximum_cursor_size: Size,
    modes: Vec<DisplayMode>,
    current_mode: Option<usize>,
    native_mode: Option<usize>,
}

impl DisplaySnapshot {
    pub fn modes(&self) -> &[DisplayMode] {
        &self.modes
    }

    /// Mode the CRTC is scanning out, if any
    pub fn current_mode(&self) -> Option<&DisplayMode> {
        self.current_mode.and_then(|i| self.modes.get(i))
    }

    /// Mode matching the panel's native resolution, if any
    pub fn native_mode(&self) -> Option<&DisplayMode> {
        self.native_mode.and_then(|i| self.modes.get(i))
    }

    pub fn current_mode_index(&self) -> Option<usize> {
        self.current_mode
    }

    pub fn native_mode_index(&self) -> Option<usize> {
        self.native_mode
    }

    /// Best known pixel size: native, then current, then the first mode
    pub fn pixel_size(&self) -> Size {
        self.native_mode()
            .or_else(|| self.current_mode())
            .or_else(|| self.modes.first())
            .map(DisplayMode::size)
            .unwrap_or_default()
    }

    /// A copy placed at `origin`
    pub fn with_origin(mut self, origin: Point) -> Self {
        self.origin = origin;
        self
    }
}

/// Connector index unique across devices: device in the high byte
pub fn connector_index(device_index: u8, display_index: u8) -> u16 {
    (u16::from(device_index) << 8) | u16::from(display_index)
}

/// Display id of an EDID-identified display
///
/// Manufacturer in bits 40.., product hash in bits 8..40, the low byte of the
/// connector index in bits 0..8.
pub fn generate_display_id(edid: &Edid, connector_index: u16) -> i64 {
    let product_hash = product_code_hash(edid);
    (i64::from(edid.manufacturer_id) << 40)
        | (i64::from(product_hash) << 8)
        | i64::from(connector_index & 0xff)
}

/// 32-bit FNV-1a over the model name and the little-endian product code
fn product_code_hash(edid: &Edid) -> u32 {
    const OFFSET: u32 = 0x811c_9dc5;
    const PRIME: u32 = 0x0100_0193;

    let name = edid.display_name.as_deref().unwrap_or_default();
    name.bytes()
        .chain(edid.product_code.to_le_bytes())
        .fold(OFFSET, |hash, b| (hash ^ u32::from(b)).wrapping_mul(PRIME))
}

pub fn connection_type(kind: ConnectorKind) -> DisplayConnectionType {
    match kind {
        ConnectorKind::Edp | ConnectorKind::Lvds | ConnectorKind::Dsi => {
            DisplayConnectionType::Internal
        }
        ConnectorKind::Vga => DisplayConnectionType::Vga,
        ConnectorKind::HdmiA | ConnectorKind::HdmiB => DisplayConnectionType::Hdmi,
        ConnectorKind::DviI | ConnectorKind::DviD | ConnectorKind::DviA => {
            DisplayConnectionType::Dvi
        }
        ConnectorKind::DisplayPort => DisplayConnectionType::DisplayPort,
        ConnectorKind::Virtual => DisplayConnectionType::Virtual,
        _ => DisplayConnectionType::Unknown,
    }
}

fn read_blob_property(
    device: &impl KernelDevice,
    properties: &ObjectProperties,
    name: &str,
) -> Option<Vec<u8>> {
    let (_, blob_id) = find_drm_property(device, properties, name)?;
    if blob_id == 0 {
        return None;
    }
    match device.property_blob(blob_id) {
        Ok(blob) => Some(blob),
        Err(e) => {
            debug!("Failed to read {} blob {}: {}", name, blob_id, e);
            None
        }
    }
}

/// Build the snapshot for `info`
///
/// Never fails: unreadable properties and a missing or broken EDID degrade
/// the snapshot (zero physical size, no native mode, no EDID identity)
/// instead of dropping the display.
pub fn create_display_snapshot(
    device: &impl KernelDevice,
    info: &HardwareDisplayControllerInfo,
    sys_path: &Path,
    device_index: u8,
    origin: Point,
) -> DisplaySnapshot {
    let connector = info.connector();
    let crtc = info.crtc();

    let properties = device.connector_properties(connector.id).unwrap_or_else(|e| {
        debug!("Failed to read properties of connector {}: {}", connector.id, e);
        ObjectProperties::default()
    });

    let edid = read_blob_property(device, &properties, properties::EDID).and_then(|blob| {
        Edid::parse(&blob)
            .inspect_err(|e| debug!("Connector {}: {}", connector.id, e))
            .ok()
    });

    let active_pixel_size = edid
        .as_ref()
        .map(|e| e.active_pixel_size)
        .unwrap_or_default();
    let ExtractedModes {
        modes,
        current,
        native,
    } = extract_display_modes(info, active_pixel_size);

    let index = connector_index(device_index, info.index());
    let port_display_id = i64::from(index);
    let display_id = edid
        .as_ref()
        .map(|e| generate_display_id(e, index))
        .unwrap_or(port_display_id);

    let path_topology = read_blob_property(device, &properties, properties::PATH)
        .map(|blob| parse_path_blob(&blob))
        .unwrap_or_default();
    let (base_connector_id, path_topology) = match path_topology.split_first() {
        Some((&base, ports)) => (base, ports.to_vec()),
        None => (u64::from(connector.id), Vec::new()),
    };

    let has_content_protection =
        find_drm_property(device, &properties, properties::CONTENT_PROTECTION).is_some();

    let snapshot = DisplaySnapshot {
        display_id,
        port_display_id,
        connector_id: connector.id,
        connector_name: connector.name(),
        crtc_id: crtc.id,
        base_connector_id,
        path_topology,
        connection_type: connection_type(connector.kind),
        origin,
        physical_size: edid.as_ref().map(|e| e.physical_size).unwrap_or_default(),
        sys_path: sys_path.to_path_buf(),
        device_index,
        manufacturer: edid.as_ref().map(|e| e.manufacturer.clone()),
        manufacturer_id: edid.as_ref().map_or(0, |e| e.manufacturer_id),
        product_code: edid.as_ref().map_or(0, |e| e.product_code),
        display_name: edid.as_ref().and_then(|e| e.display_name.clone()),
        year_of_manufacture: edid.as_ref().and_then(|e| e.year_of_manufacture),
        bits_per_channel: edid.as_ref().and_then(|e| e.bits_per_channel),
        is_aspect_preserving_scaling: properties::is_aspect_preserving_scaling(device, &properties),
        has_content_protection,
        hdcp_state: properties::hdcp_state(device, &properties),
        content_protection_method: properties::content_protection_method(device, &properties),
        has_color_correction_matrix: properties::has_color_correction_matrix(device, crtc.id),
        privacy_screen_state: properties::privacy_screen_state(device, &properties),
        maximum_cursor_size: get_maximum_cursor_size(device),
        modes,
        current_mode: current,
        native_mode: native,
    };

    debug!(
        "Snapshot for {}: id={} modes={} physical={}",
        snapshot.connector_name,
        snapshot.display_id,
        snapshot.modes.len(),
        snapshot.physical_size
    );

    snapshot
}
