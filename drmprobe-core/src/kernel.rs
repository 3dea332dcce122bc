//! Raw kernel records and the device seam
//!
//! Everything in this module mirrors what the DRM mode-setting ioctls hand
//! back (`drmModeRes`, `drmModeConnector`, `drmModeEncoder`, `drmModeCrtc`,
//! `drmModePropertyRes`, ...). The records are plain owned values, so dropping
//! one releases it; nothing here needs an explicit free.
//!
//! [`KernelDevice`] is the only way the rest of the crate talks to the kernel.
//! [`crate::card::Card`] implements it on top of a real `/dev/dri/cardN`.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// `DRM_MODE_FLAG_INTERLACE`
pub const DRM_MODE_FLAG_INTERLACE: u32 = 1 << 4;

/// `DRM_MODE_TYPE_PREFERRED`
pub const DRM_MODE_TYPE_PREFERRED: u32 = 1 << 3;

/// Object ids and property values the kernel uses
pub type ObjectId = u32;

/// Mirror of `struct drm_mode_modeinfo`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeInfo {
    /// Pixel clock in kHz
    pub clock: u32,
    pub hdisplay: u16,
    pub hsync_start: u16,
    pub hsync_end: u16,
    pub htotal: u16,
    pub hskew: u16,
    pub vdisplay: u16,
    pub vsync_start: u16,
    pub vsync_end: u16,
    pub vtotal: u16,
    pub vscan: u16,
    /// Kernel-rounded refresh rate in Hz
    pub vrefresh: u32,
    /// `DRM_MODE_FLAG_*`
    pub flags: u32,
    /// `DRM_MODE_TYPE_*`
    pub mode_type: u32,
    pub name: String,
}

impl ModeInfo {
    pub fn is_preferred(&self) -> bool {
        self.mode_type & DRM_MODE_TYPE_PREFERRED != 0
    }
}

/// `DRM_MODE_CONNECTOR_*`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectorKind {
    Unknown,
    Vga,
    DviI,
    DviD,
    DviA,
    Composite,
    SVideo,
    Lvds,
    Component,
    NinePinDin,
    DisplayPort,
    HdmiA,
    HdmiB,
    Tv,
    Edp,
    Virtual,
    Dsi,
    Dpi,
    Writeback,
    Spi,
    Usb,
}

impl ConnectorKind {
    /// Kernel connector type number
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            1 => Self::Vga,
            2 => Self::DviI,
            3 => Self::DviD,
            4 => Self::DviA,
            5 => Self::Composite,
            6 => Self::SVideo,
            7 => Self::Lvds,
            8 => Self::Component,
            9 => Self::NinePinDin,
            10 => Self::DisplayPort,
            11 => Self::HdmiA,
            12 => Self::HdmiB,
            13 => Self::Tv,
            14 => Self::Edp,
            15 => Self::Virtual,
            16 => Self::Dsi,
            17 => Self::Dpi,
            18 => Self::Writeback,
            19 => Self::Spi,
            20 => Self::Usb,
            _ => Self::Unknown,
        }
    }

    /// Name the kernel uses in sysfs and `modetest` output
    pub fn name(&self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Vga => "VGA",
            Self::DviI => "DVI-I",
            Self::DviD => "DVI-D",
            Self::DviA => "DVI-A",
            Self::Composite => "Composite",
            Self::SVideo => "SVIDEO",
            Self::Lvds => "LVDS",
            Self::Component => "Component",
            Self::NinePinDin => "DIN",
            Self::DisplayPort => "DP",
            Self::HdmiA => "HDMI-A",
            Self::HdmiB => "HDMI-B",
            Self::Tv => "TV",
            Self::Edp => "eDP",
            Self::Virtual => "Virtual",
            Self::Dsi => "DSI",
            Self::Dpi => "DPI",
            Self::Writeback => "Writeback",
            Self::Spi => "SPI",
            Self::Usb => "USB",
        }
    }
}

/// `drmModeConnection`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
    Unknown,
}

/// Mirror of `drmModeRes`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resources {
    pub connectors: Vec<ObjectId>,
    pub encoders: Vec<ObjectId>,
    /// CRTC ids; an encoder's `possible_crtcs` bit `n` refers to `crtcs[n]`
    pub crtcs: Vec<ObjectId>,
}

/// Mirror of `drmModeConnector`
#[derive(Debug, PartialEq, Eq)]
pub struct ConnectorInfo {
    pub id: ObjectId,
    pub kind: ConnectorKind,
    /// Per-kind instance number, `1` in `HDMI-A-1`
    pub kind_id: u32,
    pub connection: ConnectionStatus,
    pub mm_width: u32,
    pub mm_height: u32,
    /// Currently bound encoder, `0` when none
    pub encoder_id: ObjectId,
    pub encoders: Vec<ObjectId>,
    pub modes: Vec<ModeInfo>,
}

impl ConnectorInfo {
    /// Kernel-style name such as `DP-2` or `eDP-1`
    pub fn name(&self) -> String {
        format!("{}-{}", self.kind.name(), self.kind_id)
    }

    pub fn is_connected(&self) -> bool {
        self.connection == ConnectionStatus::Connected
    }
}

/// Mirror of `drmModeEncoder`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderInfo {
    pub id: ObjectId,
    /// Currently bound CRTC, `0` when none
    pub crtc_id: ObjectId,
    /// Bitmask over the index of each CRTC in [`Resources::crtcs`]
    pub possible_crtcs: u32,
}

/// Mirror of `drmModeCrtc`
#[derive(Debug, PartialEq, Eq)]
pub struct CrtcInfo {
    pub id: ObjectId,
    /// Programmed mode; `None` when the kernel reports `mode_valid == 0`
    pub mode: Option<ModeInfo>,
    pub x: u32,
    pub y: u32,
    pub buffer_id: ObjectId,
    pub gamma_size: u32,
}

/// One named entry of an enum property
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyEnumEntry {
    pub value: u64,
    pub name: String,
}

/// Value type of a property, reduced to what this crate decodes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyKind {
    Enum(Vec<PropertyEnumEntry>),
    Blob,
    Range,
    Other,
}

/// Mirror of `drmModePropertyRes`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyInfo {
    pub id: ObjectId,
    pub name: String,
    pub kind: PropertyKind,
}

impl PropertyInfo {
    pub fn enum_entries(&self) -> &[PropertyEnumEntry] {
        match &self.kind {
            PropertyKind::Enum(entries) => entries,
            _ => &[],
        }
    }
}

/// Mirror of `drmModeObjectProperties`: parallel property ids and values
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectProperties {
    pub props: Vec<ObjectId>,
    pub values: Vec<u64>,
}

impl ObjectProperties {
    pub fn new(entries: impl IntoIterator<Item = (ObjectId, u64)>) -> Self {
        let (props, values) = entries.into_iter().unzip();
        Self { props, values }
    }

    /// `(property id, current value)` pairs in kernel order
    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, u64)> + '_ {
        self.props.iter().copied().zip(self.values.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.props.len()
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }
}

/// Read-only access to a DRM device's mode-setting state
///
/// Implementations perform blocking kernel queries. Callers serialize access
/// to a device; nothing here is expected to be called concurrently.
pub trait KernelDevice {
    /// `drmModeGetResources`
    fn resources(&self) -> Result<Resources>;

    /// `drmModeGetConnector`
    fn connector(&self, id: ObjectId) -> Result<ConnectorInfo>;

    /// `drmModeGetEncoder`
    fn encoder(&self, id: ObjectId) -> Result<EncoderInfo>;

    /// `drmModeGetCrtc`
    fn crtc(&self, id: ObjectId) -> Result<CrtcInfo>;

    /// `drmModeObjectGetProperties` on a connector
    fn connector_properties(&self, id: ObjectId) -> Result<ObjectProperties>;

    /// `drmModeObjectGetProperties` on a CRTC
    fn crtc_properties(&self, id: ObjectId) -> Result<ObjectProperties>;

    /// `drmModeGetProperty`
    fn property(&self, id: ObjectId) -> Result<PropertyInfo>;

    /// `drmModeGetPropertyBlob`
    fn property_blob(&self, blob_id: u64) -> Result<Vec<u8>>;

    /// `DRM_CAP_CURSOR_WIDTH` / `DRM_CAP_CURSOR_HEIGHT`
    fn cursor_size(&self) -> Result<(u64, u64)>;
}
