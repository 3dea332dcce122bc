//! DRM property lookup and enum decoding
//!
//! Properties are found by name with a linear scan; drivers expose a few
//! dozen at most per object. Enum properties are decoded through the constant
//! tables below.

use tracing::{debug, warn};

use crate::kernel::{KernelDevice, ObjectId, ObjectProperties, PropertyInfo};
use crate::types::{ContentProtectionMethod, HdcpState, PrivacyScreenState};

// DRM property names.
pub const CONTENT_PROTECTION: &str = "Content Protection";
pub const HDCP_CONTENT_TYPE: &str = "HDCP Content Type";
pub const PRIVACY_SCREEN_LEGACY: &str = "privacy-screen";
pub const PRIVACY_SCREEN_HW_STATE: &str = "privacy-screen hw-state";
pub const PRIVACY_SCREEN_SW_STATE: &str = "privacy-screen sw-state";
pub const EDID: &str = "EDID";
pub const PATH: &str = "PATH";
pub const CTM: &str = "CTM";
pub const SCALING_MODE: &str = "scaling mode";

/// Enum entry of `scaling mode` that keeps the aspect ratio
pub const SCALING_MODE_FULL_ASPECT: &str = "Full aspect";

/// Kernel enum name to internal value
pub type EnumMapping<T> = (&'static str, T);

pub const HDCP_CONTENT_TYPE_STATES: &[EnumMapping<ContentProtectionMethod>] = &[
    ("HDCP Type0", ContentProtectionMethod::HdcpType0),
    ("HDCP Type1", ContentProtectionMethod::HdcpType1),
];

pub const CONTENT_PROTECTION_STATES: &[EnumMapping<HdcpState>] = &[
    ("Undesired", HdcpState::Undesired),
    ("Desired", HdcpState::Desired),
    ("Enabled", HdcpState::Enabled),
];

pub const PRIVACY_SCREEN_STATES: &[EnumMapping<PrivacyScreenState>] = &[
    ("Disabled", PrivacyScreenState::Disabled),
    ("Enabled", PrivacyScreenState::Enabled),
    ("Disabled-locked", PrivacyScreenState::DisabledLocked),
    ("Enabled-locked", PrivacyScreenState::EnabledLocked),
];

/// Look up `name` in a mapping table
pub fn lookup_enum<T: Copy>(table: &[EnumMapping<T>], name: &str) -> Option<T> {
    table
        .iter()
        .find(|(drm_enum, _)| *drm_enum == name)
        .map(|&(_, internal)| internal)
}

/// Find the property called `name` among `properties`
///
/// Returns the property definition together with its current value on the
/// object. Properties the kernel refuses to describe are skipped.
pub fn find_drm_property(
    device: &impl KernelDevice,
    properties: &ObjectProperties,
    name: &str,
) -> Option<(PropertyInfo, u64)> {
    for (prop_id, value) in properties.iter() {
        match device.property(prop_id) {
            Ok(property) if property.name == name => return Some((property, value)),
            Ok(_) => {}
            Err(e) => debug!("Failed to read property {}: {}", prop_id, e),
        }
    }
    None
}

/// Integer value of the enum entry `name` on property `property_id`
///
/// `None` means the property is unreadable, not an enum, or has no such
/// entry; callers treat that as unsupported.
pub fn get_enum_value_for_name(
    device: &impl KernelDevice,
    property_id: ObjectId,
    name: &str,
) -> Option<u64> {
    let property = device.property(property_id).ok()?;
    property
        .enum_entries()
        .iter()
        .find(|entry| entry.name == name)
        .map(|entry| entry.value)
}

/// Name of the enum entry whose value is `value`
pub fn get_enum_name_for_value(property: &PropertyInfo, value: u64) -> Option<&str> {
    property
        .enum_entries()
        .iter()
        .find(|entry| entry.value == value)
        .map(|entry| entry.name.as_str())
}

/// Map a privacy-screen enum name to its state
///
/// Unknown names are reported as [`PrivacyScreenState::NotSupported`].
pub fn get_privacy_screen_state_from_enum_value(enum_value: &str) -> PrivacyScreenState {
    lookup_enum(PRIVACY_SCREEN_STATES, enum_value).unwrap_or_else(|| {
        warn!("Unknown privacy-screen state {:?}", enum_value);
        PrivacyScreenState::NotSupported
    })
}

/// Decode the current value of an enum property found on an object
fn current_enum_name(
    device: &impl KernelDevice,
    properties: &ObjectProperties,
    name: &str,
) -> Option<String> {
    let (property, value) = find_drm_property(device, properties, name)?;
    get_enum_name_for_value(&property, value).map(str::to_owned)
}

/// Current privacy-screen state of a connector
///
/// With the sw-state/hw-state pair the hardware state is reported, since only
/// it carries the `*-locked` values. Otherwise the legacy single property is
/// read.
pub fn privacy_screen_state(
    device: &impl KernelDevice,
    properties: &ObjectProperties,
) -> PrivacyScreenState {
    let has_sw_state = find_drm_property(device, properties, PRIVACY_SCREEN_SW_STATE).is_some();
    let name = if has_sw_state {
        PRIVACY_SCREEN_HW_STATE
    } else {
        PRIVACY_SCREEN_LEGACY
    };

    current_enum_name(device, properties, name)
        .map(|state| get_privacy_screen_state_from_enum_value(&state))
        .unwrap_or(PrivacyScreenState::NotSupported)
}

/// Current HDCP state of a connector, if it supports content protection
pub fn hdcp_state(device: &impl KernelDevice, properties: &ObjectProperties) -> Option<HdcpState> {
    let name = current_enum_name(device, properties, CONTENT_PROTECTION)?;
    lookup_enum(CONTENT_PROTECTION_STATES, &name)
}

/// Requested HDCP content type of a connector
pub fn content_protection_method(
    device: &impl KernelDevice,
    properties: &ObjectProperties,
) -> Option<ContentProtectionMethod> {
    let name = current_enum_name(device, properties, HDCP_CONTENT_TYPE)?;
    lookup_enum(HDCP_CONTENT_TYPE_STATES, &name)
}

/// Whether the connector scales while preserving the aspect ratio
pub fn is_aspect_preserving_scaling(
    device: &impl KernelDevice,
    properties: &ObjectProperties,
) -> bool {
    let Some((property, value)) = find_drm_property(device, properties, SCALING_MODE) else {
        return false;
    };
    get_enum_value_for_name(device, property.id, SCALING_MODE_FULL_ASPECT) == Some(value)
}

/// Whether `crtc_id` exposes a colour transformation matrix
pub fn has_color_correction_matrix(device: &impl KernelDevice, crtc_id: ObjectId) -> bool {
    match device.crtc_properties(crtc_id) {
        Ok(properties) => find_drm_property(device, &properties, CTM).is_some(),
        Err(e) => {
            debug!("Failed to read properties of CRTC {}: {}", crtc_id, e);
            false
        }
    }
}

/// Parse an MST `PATH` blob such as `mst:42-1-3`
///
/// Yields the base connector id followed by the port of each branch device.
/// Returns an empty list if the blob is malformed.
pub fn parse_path_blob(blob: &[u8]) -> Vec<u64> {
    let end = blob.iter().position(|&b| b == 0).unwrap_or(blob.len());
    let Ok(path) = std::str::from_utf8(&blob[..end]) else {
        return Vec::new();
    };
    let Some(rest) = path.strip_prefix("mst:") else {
        return Vec::new();
    };

    let parsed: Option<Vec<u64>> = rest.split('-').map(|part| part.parse().ok()).collect();
    match parsed {
        Some(path) if !path.is_empty() => path,
        _ => {
            debug!("Malformed PATH blob {:?}", path);
            Vec::new()
        }
    }
}
