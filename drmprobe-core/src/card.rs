//! DRM device access through `/dev/dri/cardN`
//!
//! [`Card`] wraps an open device node and answers [`KernelDevice`] queries
//! with the `drm` crate's mode-setting ioctls. No DRM master is needed; every
//! query here is read-only.

use std::cell::OnceCell;
use std::fs::{File, OpenOptions};
use std::io;
use std::os::fd::{AsFd, BorrowedFd};
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

use drm::control::{self, connector, crtc, encoder, property, Device as ControlDevice};
use drm::{Device, DriverCapability};
use tracing::{debug, warn};

use crate::error::{ProbeError, Result};
use crate::inventory::MAX_DRM_COUNT;
use crate::kernel::{
    ConnectionStatus, ConnectorInfo, ConnectorKind, CrtcInfo, EncoderInfo, KernelDevice, ModeInfo,
    ObjectId, ObjectProperties, PropertyEnumEntry, PropertyInfo, PropertyKind, Resources,
};

const DRI_DIR: &str = "/dev/dri";

/// An open DRM device node
#[derive(Debug)]
pub struct Card {
    file: File,
    path: PathBuf,
    /// Resource handles, read once; CRTCs do not come and go
    resources: OnceCell<control::ResourceHandles>,
}

impl AsFd for Card {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.file.as_fd()
    }
}

impl Device for Card {}
impl ControlDevice for Card {}

impl Card {
    /// Open a device node such as `/dev/dri/card0`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| ProbeError::from(e).with_context(format!("Failed to open {:?}", path)))?;

        debug!("Opened DRM device {:?}", path);
        Ok(Self {
            file,
            path: path.to_path_buf(),
            resources: OnceCell::new(),
        })
    }

    fn resource_handles_cached(&self) -> Result<&control::ResourceHandles> {
        if let Some(res) = self.resources.get() {
            return Ok(res);
        }
        let res = self
            .resource_handles()
            .map_err(|e| ProbeError::device(format!("drmModeGetResources: {}", e)))?;
        Ok(self.resources.get_or_init(|| res))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// sysfs directory of this device, e.g. `/sys/devices/pci0000:00/.../drm/card0`
    pub fn sys_path(&self) -> Result<PathBuf> {
        let rdev = self.file.metadata()?.rdev();
        let link = PathBuf::from(format!(
            "/sys/dev/char/{}:{}",
            libc::major(rdev),
            libc::minor(rdev)
        ));
        Ok(std::fs::canonicalize(&link).unwrap_or(link))
    }
}

/// Device nodes under `/dev/dri`, `card0` first
///
/// At most [`MAX_DRM_COUNT`] are returned.
pub fn list_cards() -> Result<Vec<PathBuf>> {
    list_cards_in(Path::new(DRI_DIR))
}

fn list_cards_in(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut cards: Vec<(u32, PathBuf)> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let name = entry.file_name();
            let number = name.to_str()?.strip_prefix("card")?.parse().ok()?;
            Some((number, entry.path()))
        })
        .collect();

    cards.sort_by_key(|(number, _)| *number);
    if cards.len() > MAX_DRM_COUNT {
        warn!(
            "Found {} DRM devices, only the first {} are used",
            cards.len(),
            MAX_DRM_COUNT
        );
        cards.truncate(MAX_DRM_COUNT);
    }

    Ok(cards.into_iter().map(|(_, path)| path).collect())
}

fn ioctl_error(call: &'static str, id: ObjectId) -> impl FnOnce(io::Error) -> ProbeError {
    move |e| ProbeError::from(e).with_context(format!("{}({})", call, id))
}

fn property_error(call: &'static str, id: u64) -> impl FnOnce(io::Error) -> ProbeError {
    move |e| ProbeError::property(format!("{}({}): {}", call, id, e))
}

/// `possible_crtcs` bitmask over the positions of `crtcs`
fn possible_crtc_mask(crtcs: &[crtc::Handle], possible: &[crtc::Handle]) -> u32 {
    crtcs
        .iter()
        .take(32)
        .enumerate()
        .filter(|(_, crtc)| possible.contains(crtc))
        .fold(0u32, |mask, (bit, _)| mask | (1 << bit))
}

fn handle<T: From<control::RawResourceHandle>>(id: ObjectId) -> Result<T> {
    control::from_u32(id).ok_or_else(|| ProbeError::not_found("object id 0"))
}

fn mode_info(mode: &control::Mode) -> ModeInfo {
    let (hdisplay, vdisplay) = mode.size();
    let (hsync_start, hsync_end, htotal) = mode.hsync();
    let (vsync_start, vsync_end, vtotal) = mode.vsync();
    ModeInfo {
        clock: mode.clock(),
        hdisplay,
        hsync_start,
        hsync_end,
        htotal,
        hskew: mode.hskew(),
        vdisplay,
        vsync_start,
        vsync_end,
        vtotal,
        vscan: mode.vscan(),
        vrefresh: mode.vrefresh(),
        flags: mode.flags().bits(),
        mode_type: mode.mode_type().bits(),
        name: mode.name().to_string_lossy().into_owned(),
    }
}

fn connector_kind(interface: connector::Interface) -> ConnectorKind {
    use connector::Interface;
    match interface {
        Interface::VGA => ConnectorKind::Vga,
        Interface::DVII => ConnectorKind::DviI,
        Interface::DVID => ConnectorKind::DviD,
        Interface::DVIA => ConnectorKind::DviA,
        Interface::Composite => ConnectorKind::Composite,
        Interface::SVideo => ConnectorKind::SVideo,
        Interface::LVDS => ConnectorKind::Lvds,
        Interface::Component => ConnectorKind::Component,
        Interface::NinePinDIN => ConnectorKind::NinePinDin,
        Interface::DisplayPort => ConnectorKind::DisplayPort,
        Interface::HDMIA => ConnectorKind::HdmiA,
        Interface::HDMIB => ConnectorKind::HdmiB,
        Interface::TV => ConnectorKind::Tv,
        Interface::EmbeddedDisplayPort => ConnectorKind::Edp,
        Interface::Virtual => ConnectorKind::Virtual,
        Interface::DSI => ConnectorKind::Dsi,
        _ => ConnectorKind::Unknown,
    }
}

fn object_properties(set: control::PropertyValueSet) -> ObjectProperties {
    let (props, values) = set.as_props_and_values();
    ObjectProperties::new(
        props
            .iter()
            .map(|&p| u32::from(p))
            .zip(values.iter().copied()),
    )
}

impl KernelDevice for Card {
    fn resources(&self) -> Result<Resources> {
        let res = self.resource_handles_cached()?;
        Ok(Resources {
            connectors: res.connectors().iter().map(|&h| u32::from(h)).collect(),
            encoders: res.encoders().iter().map(|&h| u32::from(h)).collect(),
            crtcs: res.crtcs().iter().map(|&h| u32::from(h)).collect(),
        })
    }

    fn connector(&self, id: ObjectId) -> Result<ConnectorInfo> {
        let info = self
            .get_connector(handle::<connector::Handle>(id)?, false)
            .map_err(ioctl_error("drmModeGetConnector", id))?;

        let (mm_width, mm_height) = info.size().unwrap_or((0, 0));
        Ok(ConnectorInfo {
            id,
            kind: connector_kind(info.interface()),
            kind_id: info.interface_id(),
            connection: match info.state() {
                connector::State::Connected => ConnectionStatus::Connected,
                connector::State::Disconnected => ConnectionStatus::Disconnected,
                _ => ConnectionStatus::Unknown,
            },
            mm_width,
            mm_height,
            encoder_id: info.current_encoder().map_or(0, u32::from),
            encoders: info.encoders().iter().map(|&h| u32::from(h)).collect(),
            modes: info.modes().iter().map(mode_info).collect(),
        })
    }

    fn encoder(&self, id: ObjectId) -> Result<EncoderInfo> {
        let info = self
            .get_encoder(handle::<encoder::Handle>(id)?)
            .map_err(ioctl_error("drmModeGetEncoder", id))?;

        // The kernel bitmask indexes the resource CRTC list; the crate only
        // exposes it as a filter, so rebuild it against that list.
        let res = self.resource_handles_cached()?;
        let possible = res.filter_crtcs(info.possible_crtcs());
        let possible_crtcs = possible_crtc_mask(res.crtcs(), &possible);

        Ok(EncoderInfo {
            id,
            crtc_id: info.crtc().map_or(0, u32::from),
            possible_crtcs,
        })
    }

    fn crtc(&self, id: ObjectId) -> Result<CrtcInfo> {
        let info = self
            .get_crtc(handle::<crtc::Handle>(id)?)
            .map_err(ioctl_error("drmModeGetCrtc", id))?;

        let (x, y) = info.position();
        Ok(CrtcInfo {
            id,
            mode: info.mode().as_ref().map(mode_info),
            x,
            y,
            buffer_id: info.framebuffer().map_or(0, u32::from),
            gamma_size: info.gamma_length(),
        })
    }

    fn connector_properties(&self, id: ObjectId) -> Result<ObjectProperties> {
        self.get_properties(handle::<connector::Handle>(id)?)
            .map(object_properties)
            .map_err(ioctl_error("drmModeObjectGetProperties", id))
    }

    fn crtc_properties(&self, id: ObjectId) -> Result<ObjectProperties> {
        self.get_properties(handle::<crtc::Handle>(id)?)
            .map(object_properties)
            .map_err(ioctl_error("drmModeObjectGetProperties", id))
    }

    fn property(&self, id: ObjectId) -> Result<PropertyInfo> {
        let info = self
            .get_property(handle::<property::Handle>(id)?)
            .map_err(property_error("drmModeGetProperty", u64::from(id)))?;

        let kind = match info.value_type() {
            property::ValueType::Enum(values) => {
                let (_, entries) = values.values();
                PropertyKind::Enum(
                    entries
                        .iter()
                        .map(|e| PropertyEnumEntry {
                            value: e.value(),
                            name: e.name().to_string_lossy().into_owned(),
                        })
                        .collect(),
                )
            }
            property::ValueType::Blob => PropertyKind::Blob,
            property::ValueType::UnsignedRange(..) | property::ValueType::SignedRange(..) => {
                PropertyKind::Range
            }
            _ => PropertyKind::Other,
        };

        Ok(PropertyInfo {
            id,
            name: info.name().to_string_lossy().into_owned(),
            kind,
        })
    }

    fn property_blob(&self, blob_id: u64) -> Result<Vec<u8>> {
        self.get_property_blob(blob_id)
            .map_err(property_error("drmModeGetPropertyBlob", blob_id))
    }

    fn cursor_size(&self) -> Result<(u64, u64)> {
        let width = self.get_driver_capability(DriverCapability::CursorWidth)?;
        let height = self.get_driver_capability(DriverCapability::CursorHeight)?;
        Ok((width, height))
    }
}
