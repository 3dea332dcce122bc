//! Core types for drmprobe
//!
//! These are the display-level values produced from raw kernel records:
//! geometry, display modes, and the typed states decoded from DRM properties.

use serde::{Deserialize, Serialize};

/// Pixel or millimetre dimensions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True when either dimension is zero
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Position of a display in the virtual screen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// A display mode as seen by the display-configuration layer
///
/// Immutable once created; see [`crate::modes::create_display_mode`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayMode {
    size: Size,
    is_interlaced: bool,
    refresh_rate: f32,
}

impl DisplayMode {
    pub fn new(size: Size, is_interlaced: bool, refresh_rate: f32) -> Self {
        Self {
            size,
            is_interlaced,
            refresh_rate,
        }
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn is_interlaced(&self) -> bool {
        self.is_interlaced
    }

    /// Refresh rate in Hz
    pub fn refresh_rate(&self) -> f32 {
        self.refresh_rate
    }
}

impl std::fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{} @ {:.2}Hz",
            self.size,
            if self.is_interlaced { "i" } else { "" },
            self.refresh_rate
        )
    }
}

/// Physical link type of a display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayConnectionType {
    /// Built-in panel (eDP, LVDS, DSI)
    Internal,
    Vga,
    Hdmi,
    Dvi,
    DisplayPort,
    Virtual,
    Unknown,
}

impl std::fmt::Display for DisplayConnectionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Internal => write!(f, "Internal"),
            Self::Vga => write!(f, "VGA"),
            Self::Hdmi => write!(f, "HDMI"),
            Self::Dvi => write!(f, "DVI"),
            Self::DisplayPort => write!(f, "DisplayPort"),
            Self::Virtual => write!(f, "Virtual"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// State of an integrated privacy screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrivacyScreenState {
    Disabled,
    Enabled,
    DisabledLocked,
    EnabledLocked,
    /// No privacy screen, or the kernel reported a state we do not know
    NotSupported,
}

impl std::fmt::Display for PrivacyScreenState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disabled => write!(f, "disabled"),
            Self::Enabled => write!(f, "enabled"),
            Self::DisabledLocked => write!(f, "disabled (locked)"),
            Self::EnabledLocked => write!(f, "enabled (locked)"),
            Self::NotSupported => write!(f, "not supported"),
        }
    }
}

/// HDCP negotiation state reported by the `Content Protection` property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HdcpState {
    Undesired,
    Desired,
    Enabled,
}

/// HDCP content type requested through the `HDCP Content Type` property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentProtectionMethod {
    HdcpType0,
    HdcpType1,
}
