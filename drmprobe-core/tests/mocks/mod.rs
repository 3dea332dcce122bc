//! Mock infrastructure for testing
//!
//! Provides an in-memory [`KernelDevice`] and builders for kernel modes and
//! EDID blobs.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};

use drmprobe_core::error::{ProbeError, Result};
use drmprobe_core::kernel::{
    ConnectionStatus, ConnectorInfo, ConnectorKind, CrtcInfo, EncoderInfo, KernelDevice, ModeInfo,
    ObjectId, ObjectProperties, PropertyEnumEntry, PropertyInfo, PropertyKind, Resources,
    DRM_MODE_TYPE_PREFERRED,
};

/// Build a progressive kernel mode with CEA-like blanking
pub fn mode(width: u16, height: u16, refresh: u32) -> ModeInfo {
    let htotal = width + 280;
    let vtotal = height + 45;
    ModeInfo {
        clock: (u32::from(htotal) * u32::from(vtotal) * refresh) / 1000,
        hdisplay: width,
        hsync_start: width + 88,
        hsync_end: width + 132,
        htotal,
        hskew: 0,
        vdisplay: height,
        vsync_start: height + 4,
        vsync_end: height + 9,
        vtotal,
        vscan: 0,
        vrefresh: refresh,
        flags: 0,
        mode_type: 0,
        name: format!("{}x{}", width, height),
    }
}

/// Same as [`mode`] with the kernel's preferred flag set
pub fn preferred(width: u16, height: u16, refresh: u32) -> ModeInfo {
    ModeInfo {
        mode_type: DRM_MODE_TYPE_PREFERRED,
        ..mode(width, height, refresh)
    }
}

/// Cloneable description of a connector; the fake hands out fresh records
#[derive(Debug, Clone)]
pub struct ConnectorSpec {
    pub kind: ConnectorKind,
    pub kind_id: u32,
    pub connection: ConnectionStatus,
    pub encoder_id: ObjectId,
    pub encoders: Vec<ObjectId>,
    pub modes: Vec<ModeInfo>,
}

impl ConnectorSpec {
    pub fn connected(kind: ConnectorKind, encoders: &[ObjectId], modes: Vec<ModeInfo>) -> Self {
        Self {
            kind,
            kind_id: 1,
            connection: ConnectionStatus::Connected,
            encoder_id: 0,
            encoders: encoders.to_vec(),
            modes,
        }
    }

    pub fn disconnected(kind: ConnectorKind, encoders: &[ObjectId]) -> Self {
        Self {
            connection: ConnectionStatus::Disconnected,
            ..Self::connected(kind, encoders, Vec::new())
        }
    }

    pub fn with_current_encoder(mut self, encoder_id: ObjectId) -> Self {
        self.encoder_id = encoder_id;
        self
    }

    pub fn with_kind_id(mut self, kind_id: u32) -> Self {
        self.kind_id = kind_id;
        self
    }
}

/// In-memory DRM device
#[derive(Debug, Default)]
pub struct FakeDevice {
    pub crtc_ids: Vec<ObjectId>,
    pub connector_ids: Vec<ObjectId>,
    pub connectors: HashMap<ObjectId, ConnectorSpec>,
    pub encoders: HashMap<ObjectId, EncoderInfo>,
    pub crtc_modes: HashMap<ObjectId, ModeInfo>,
    pub properties: HashMap<ObjectId, PropertyInfo>,
    pub object_properties: HashMap<ObjectId, Vec<(ObjectId, u64)>>,
    pub blobs: HashMap<u64, Vec<u8>>,
    pub broken_connectors: HashSet<ObjectId>,
    pub broken_properties: HashSet<ObjectId>,
    pub broken_resources: bool,
    pub cursor: Option<(u64, u64)>,
    next_property: ObjectId,
}

impl FakeDevice {
    pub fn new() -> Self {
        Self {
            next_property: 1000,
            ..Default::default()
        }
    }

    pub fn add_crtc(&mut self, id: ObjectId) -> &mut Self {
        self.crtc_ids.push(id);
        self
    }

    /// Program a mode on a CRTC, making it the "current" mode
    pub fn set_crtc_mode(&mut self, id: ObjectId, mode: ModeInfo) -> &mut Self {
        self.crtc_modes.insert(id, mode);
        self
    }

    pub fn add_encoder(&mut self, id: ObjectId, crtc_id: ObjectId, possible_crtcs: u32) -> &mut Self {
        self.encoders.insert(
            id,
            EncoderInfo {
                id,
                crtc_id,
                possible_crtcs,
            },
        );
        self
    }

    pub fn add_connector(&mut self, id: ObjectId, spec: ConnectorSpec) -> &mut Self {
        self.connector_ids.push(id);
        self.connectors.insert(id, spec);
        self
    }

    /// Attach a property to an object, registering its definition
    pub fn attach_property(
        &mut self,
        object_id: ObjectId,
        name: &str,
        kind: PropertyKind,
        value: u64,
    ) -> ObjectId {
        let existing = self
            .properties
            .values()
            .find(|p| p.name == name && p.kind == kind)
            .map(|p| p.id);
        let prop_id = existing.unwrap_or_else(|| {
            self.next_property += 1;
            let id = self.next_property;
            self.properties.insert(
                id,
                PropertyInfo {
                    id,
                    name: name.to_string(),
                    kind,
                },
            );
            id
        });
        self.object_properties
            .entry(object_id)
            .or_default()
            .push((prop_id, value));
        prop_id
    }

    /// Attach an enum property whose current value is the entry `current`
    pub fn attach_enum(
        &mut self,
        object_id: ObjectId,
        name: &str,
        entries: &[&str],
        current: &str,
    ) -> ObjectId {
        let entries: Vec<PropertyEnumEntry> = entries
            .iter()
            .enumerate()
            .map(|(i, n)| PropertyEnumEntry {
                value: i as u64,
                name: n.to_string(),
            })
            .collect();
        let value = entries
            .iter()
            .find(|e| e.name == current)
            .map(|e| e.value)
            .expect("current value must be one of the entries");
        self.attach_property(object_id, name, PropertyKind::Enum(entries), value)
    }

    /// Attach a blob property holding `data`
    pub fn attach_blob(&mut self, object_id: ObjectId, name: &str, data: Vec<u8>) -> u64 {
        let blob_id = 5000 + self.blobs.len() as u64;
        self.blobs.insert(blob_id, data);
        self.attach_property(object_id, name, PropertyKind::Blob, blob_id);
        blob_id
    }

    fn object_properties_of(&self, id: ObjectId) -> ObjectProperties {
        ObjectProperties::new(self.object_properties.get(&id).cloned().unwrap_or_default())
    }
}

impl KernelDevice for FakeDevice {
    fn resources(&self) -> Result<Resources> {
        if self.broken_resources {
            return Err(ProbeError::device("resources unavailable"));
        }
        let mut encoders: Vec<_> = self.encoders.keys().copied().collect();
        encoders.sort_unstable();
        Ok(Resources {
            connectors: self.connector_ids.clone(),
            encoders,
            crtcs: self.crtc_ids.clone(),
        })
    }

    fn connector(&self, id: ObjectId) -> Result<ConnectorInfo> {
        if self.broken_connectors.contains(&id) {
            return Err(ProbeError::device(format!("connector {} unreadable", id)));
        }
        let spec = self
            .connectors
            .get(&id)
            .ok_or_else(|| ProbeError::not_found(format!("connector {}", id)))?;
        Ok(ConnectorInfo {
            id,
            kind: spec.kind,
            kind_id: spec.kind_id,
            connection: spec.connection,
            mm_width: 0,
            mm_height: 0,
            encoder_id: spec.encoder_id,
            encoders: spec.encoders.clone(),
            modes: spec.modes.clone(),
        })
    }

    fn encoder(&self, id: ObjectId) -> Result<EncoderInfo> {
        self.encoders
            .get(&id)
            .copied()
            .ok_or_else(|| ProbeError::not_found(format!("encoder {}", id)))
    }

    fn crtc(&self, id: ObjectId) -> Result<CrtcInfo> {
        if !self.crtc_ids.contains(&id) {
            return Err(ProbeError::not_found(format!("crtc {}", id)));
        }
        Ok(CrtcInfo {
            id,
            mode: self.crtc_modes.get(&id).cloned(),
            x: 0,
            y: 0,
            buffer_id: 0,
            gamma_size: 256,
        })
    }

    fn connector_properties(&self, id: ObjectId) -> Result<ObjectProperties> {
        Ok(self.object_properties_of(id))
    }

    fn crtc_properties(&self, id: ObjectId) -> Result<ObjectProperties> {
        Ok(self.object_properties_of(id))
    }

    fn property(&self, id: ObjectId) -> Result<PropertyInfo> {
        if self.broken_properties.contains(&id) {
            return Err(ProbeError::property(format!("property {} unreadable", id)));
        }
        self.properties
            .get(&id)
            .cloned()
            .ok_or_else(|| ProbeError::not_found(format!("property {}", id)))
    }

    fn property_blob(&self, blob_id: u64) -> Result<Vec<u8>> {
        self.blobs
            .get(&blob_id)
            .cloned()
            .ok_or_else(|| ProbeError::not_found(format!("blob {}", blob_id)))
    }

    fn cursor_size(&self) -> Result<(u64, u64)> {
        self.cursor
            .ok_or_else(|| ProbeError::device("cursor capability unavailable"))
    }
}

/// Parameters of a synthetic EDID base block
#[derive(Debug, Clone)]
pub struct EdidSpec {
    pub manufacturer: [u8; 3],
    pub product_code: u16,
    pub serial: u32,
    pub year: u16,
    pub name: Option<&'static str>,
    pub active: (u16, u16),
    pub image_mm: (u16, u16),
    pub screen_cm: (u8, u8),
}

impl Default for EdidSpec {
    fn default() -> Self {
        Self {
            manufacturer: *b"DEL",
            product_code: 0x4123,
            serial: 0x1234_5678,
            year: 2021,
            name: Some("DELL U2720Q"),
            active: (3840, 2160),
            image_mm: (597, 336),
            screen_cm: (60, 34),
        }
    }
}

impl EdidSpec {
    /// Packed manufacturer id as stored in the EDID
    pub fn manufacturer_id(&self) -> u16 {
        let [a, b, c] = self.manufacturer.map(|l| u16::from(l - b'A' + 1));
        (a << 10) | (b << 5) | c
    }

    /// Encode as a 128-byte base block with a valid checksum
    pub fn build(&self) -> Vec<u8> {
        let mut edid = vec![0u8; 128];
        edid[..8].copy_from_slice(&[0x00, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x00]);
        edid[8..10].copy_from_slice(&self.manufacturer_id().to_be_bytes());
        edid[10..12].copy_from_slice(&self.product_code.to_le_bytes());
        edid[12..16].copy_from_slice(&self.serial.to_le_bytes());
        edid[16] = 10;
        edid[17] = (self.year - 1990) as u8;
        edid[18] = 1;
        edid[19] = 4;
        // Digital input, 10 bits per channel
        edid[20] = 0x80 | (3 << 4);
        edid[21] = self.screen_cm.0;
        edid[22] = self.screen_cm.1;

        let (h, v) = self.active;
        let (hmm, vmm) = self.image_mm;
        let dtd = &mut edid[54..72];
        dtd[0..2].copy_from_slice(&59_400u16.to_le_bytes());
        dtd[2] = (h & 0xff) as u8;
        dtd[3] = 0x30;
        dtd[4] = (((h >> 8) & 0x0f) << 4) as u8;
        dtd[5] = (v & 0xff) as u8;
        dtd[6] = 0x5a;
        dtd[7] = (((v >> 8) & 0x0f) << 4) as u8;
        dtd[12] = (hmm & 0xff) as u8;
        dtd[13] = (vmm & 0xff) as u8;
        dtd[14] = ((((hmm >> 8) & 0x0f) << 4) | ((vmm >> 8) & 0x0f)) as u8;

        if let Some(name) = self.name {
            let desc = &mut edid[72..90];
            desc[3] = 0xfc;
            let mut text = [b' '; 13];
            let bytes = name.as_bytes();
            let n = bytes.len().min(13);
            text[..n].copy_from_slice(&bytes[..n]);
            if n < 13 {
                text[n] = b'\n';
            }
            desc[5..18].copy_from_slice(&text);
        }

        let sum = edid[..127].iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
        edid[127] = 0u8.wrapping_sub(sum);
        edid
    }
}
