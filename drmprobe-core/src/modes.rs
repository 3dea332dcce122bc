//! Display mode catalog
//!
//! Converts kernel mode records into [`DisplayMode`] values and picks out the
//! mode a CRTC is currently scanning out and the panel's native mode.

use tracing::debug;

use crate::inventory::HardwareDisplayControllerInfo;
use crate::kernel::{ModeInfo, DRM_MODE_FLAG_INTERLACE};
use crate::types::{DisplayMode, Size};

/// Largest refresh-rate difference, in Hz, that [`match_mode`] still treats
/// as the same mode. The comparison is inclusive.
pub const REFRESH_RATE_TOLERANCE_HZ: f32 = 0.01;

/// Modes of one connector plus the designated current and native entries
///
/// `current` and `native` are indices into `modes`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedModes {
    pub modes: Vec<DisplayMode>,
    pub current: Option<usize>,
    pub native: Option<usize>,
}

impl ExtractedModes {
    pub fn current_mode(&self) -> Option<&DisplayMode> {
        self.current.and_then(|i| self.modes.get(i))
    }

    pub fn native_mode(&self) -> Option<&DisplayMode> {
        self.native.and_then(|i| self.modes.get(i))
    }
}

pub fn mode_size(mode: &ModeInfo) -> Size {
    Size::new(u32::from(mode.hdisplay), u32::from(mode.vdisplay))
}

/// Refresh rate derived from the pixel clock and total timings
///
/// Falls back to the kernel's rounded `vrefresh` when the totals are zero.
pub fn mode_refresh_rate(mode: &ModeInfo) -> f32 {
    if mode.htotal == 0 || mode.vtotal == 0 {
        return mode.vrefresh as f32;
    }

    let clock = mode.clock as f32;
    let htotal = f32::from(mode.htotal);
    let vtotal = f32::from(mode.vtotal);
    (clock * 1000.0) / (htotal * vtotal)
}

pub fn mode_is_interlaced(mode: &ModeInfo) -> bool {
    mode.flags & DRM_MODE_FLAG_INTERLACE != 0
}

/// Exact comparison of two kernel modes, timings and name included
pub fn same_mode(lhs: &ModeInfo, rhs: &ModeInfo) -> bool {
    lhs.clock == rhs.clock
        && lhs.hdisplay == rhs.hdisplay
        && lhs.vdisplay == rhs.vdisplay
        && lhs.vrefresh == rhs.vrefresh
        && lhs.hsync_start == rhs.hsync_start
        && lhs.hsync_end == rhs.hsync_end
        && lhs.htotal == rhs.htotal
        && lhs.hskew == rhs.hskew
        && lhs.vsync_start == rhs.vsync_start
        && lhs.vsync_end == rhs.vsync_end
        && lhs.vtotal == rhs.vtotal
        && lhs.vscan == rhs.vscan
        && lhs.flags == rhs.flags
        && lhs.name == rhs.name
}

pub fn create_display_mode(mode: &ModeInfo) -> DisplayMode {
    DisplayMode::new(
        mode_size(mode),
        mode_is_interlaced(mode),
        mode_refresh_rate(mode),
    )
}

/// Whether `display_mode` describes the kernel mode `mode`
pub fn match_mode(display_mode: &DisplayMode, mode: &ModeInfo) -> bool {
    display_mode.size() == mode_size(mode)
        && display_mode.is_interlaced() == mode_is_interlaced(mode)
        && (display_mode.refresh_rate() - mode_refresh_rate(mode)).abs()
            <= REFRESH_RATE_TOLERANCE_HZ
}

/// Build the mode list for `info` and locate its current and native modes
///
/// `active_pixel_size` comes from the first detailed timing descriptor of the
/// EDID. The native mode is a mode of exactly that size, preferring one the
/// kernel flagged as preferred; if no mode has that size there is no native
/// mode.
pub fn extract_display_modes(
    info: &HardwareDisplayControllerInfo,
    active_pixel_size: Size,
) -> ExtractedModes {
    let connector = info.connector();
    let crtc_mode = info.crtc().mode.as_ref();

    let mut extracted = ExtractedModes {
        modes: Vec::with_capacity(connector.modes.len()),
        current: None,
        native: None,
    };
    let mut first_size_match = None;

    for (i, mode) in connector.modes.iter().enumerate() {
        let display_mode = create_display_mode(mode);

        if extracted.current.is_none() && crtc_mode.is_some_and(|c| same_mode(c, mode)) {
            extracted.current = Some(i);
        }

        if !active_pixel_size.is_empty() && display_mode.size() == active_pixel_size {
            if first_size_match.is_none() {
                first_size_match = Some(i);
            }
            if extracted.native.is_none() && mode.is_preferred() {
                extracted.native = Some(i);
            }
        }

        extracted.modes.push(display_mode);
    }

    if extracted.native.is_none() {
        extracted.native = first_size_match;
    }

    debug!(
        connector = connector.id,
        modes = extracted.modes.len(),
        current = ?extracted.current,
        native = ?extracted.native,
        "Extracted display modes"
    );

    extracted
}
