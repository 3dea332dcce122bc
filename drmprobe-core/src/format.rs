//! Scanout format and cursor helpers

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::kernel::KernelDevice;
use crate::types::Size;

/// Cursor size assumed when the driver does not report one
pub const DEFAULT_CURSOR_SIZE: Size = Size::new(64, 64);

const fn fourcc(code: &[u8; 4]) -> u32 {
    (code[0] as u32) | ((code[1] as u32) << 8) | ((code[2] as u32) << 16) | ((code[3] as u32) << 24)
}

pub const DRM_FORMAT_XRGB8888: u32 = fourcc(b"XR24");
pub const DRM_FORMAT_XBGR8888: u32 = fourcc(b"XB24");
pub const DRM_FORMAT_RGB565: u32 = fourcc(b"RG16");
pub const DRM_FORMAT_XRGB2101010: u32 = fourcc(b"XR30");
pub const DRM_FORMAT_XBGR2101010: u32 = fourcc(b"XB30");

/// Pixel layout of a client buffer, in memory byte order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BufferFormat {
    Bgra8888,
    Bgrx8888,
    Rgba8888,
    Rgbx8888,
    Bgr565,
    Rgba1010102,
    Bgra1010102,
    Rgba4444,
    Yuv420,
}

/// DRM fourcc to scan out `format` with alpha ignored
///
/// `None` for formats that have no opaque scanout equivalent.
pub fn get_fourcc_format_for_opaque_framebuffer(format: BufferFormat) -> Option<u32> {
    match format {
        BufferFormat::Bgra8888 | BufferFormat::Bgrx8888 => Some(DRM_FORMAT_XRGB8888),
        BufferFormat::Rgba8888 | BufferFormat::Rgbx8888 => Some(DRM_FORMAT_XBGR8888),
        BufferFormat::Bgr565 => Some(DRM_FORMAT_RGB565),
        BufferFormat::Rgba1010102 => Some(DRM_FORMAT_XBGR2101010),
        BufferFormat::Bgra1010102 => Some(DRM_FORMAT_XRGB2101010),
        BufferFormat::Rgba4444 | BufferFormat::Yuv420 => None,
    }
}

/// Largest hardware cursor the driver supports
pub fn get_maximum_cursor_size(device: &impl KernelDevice) -> Size {
    match device.cursor_size() {
        Ok((width, height)) if width > 0 && height > 0 => Size::new(
            u32::try_from(width).unwrap_or(u32::MAX),
            u32::try_from(height).unwrap_or(u32::MAX),
        ),
        Ok(_) => DEFAULT_CURSOR_SIZE,
        Err(e) => {
            debug!("Cursor size capability unavailable: {}", e);
            DEFAULT_CURSOR_SIZE
        }
    }
}
