//! EDID base block parsing
//!
//! Only the 128-byte base block is read: identity, physical size, and the
//! first detailed timing descriptor. Extension blocks are ignored.

use serde::Serialize;
use tracing::debug;

use crate::error::{ProbeError, Result};
use crate::types::Size;

const HEADER: [u8; 8] = [0x00, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x00];
const BLOCK_LEN: usize = 128;
const DESCRIPTOR_OFFSETS: [usize; 4] = [54, 72, 90, 108];
const DESCRIPTOR_LEN: usize = 18;
const TAG_MONITOR_NAME: u8 = 0xfc;

/// Fields decoded from an EDID base block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edid {
    /// Packed PNP id as stored in bytes 8-9
    pub manufacturer_id: u16,
    /// Three-letter PNP id, e.g. `DEL`
    pub manufacturer: String,
    pub product_code: u16,
    pub serial_number: u32,
    pub year_of_manufacture: Option<u16>,
    pub version: (u8, u8),
    /// Bits per colour channel, only declared by digital EDID 1.4 sinks
    pub bits_per_channel: Option<u8>,
    /// Image size in millimetres
    pub physical_size: Size,
    /// Resolution of the first detailed timing descriptor
    pub active_pixel_size: Size,
    pub display_name: Option<String>,
    pub checksum_valid: bool,
}

impl Edid {
    /// Parse an EDID blob as read from the connector's `EDID` property
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < BLOCK_LEN {
            return Err(ProbeError::edid(format!(
                "blob is {} bytes, need at least {}",
                data.len(),
                BLOCK_LEN
            )));
        }
        let block = &data[..BLOCK_LEN];
        if block[..8] != HEADER {
            return Err(ProbeError::edid("missing EDID header"));
        }

        let checksum_valid = block.iter().fold(0u8, |acc, &b| acc.wrapping_add(b)) == 0;
        if !checksum_valid {
            debug!("EDID checksum mismatch, decoding anyway");
        }

        let manufacturer_id = u16::from_be_bytes([block[8], block[9]]);
        let product_code = u16::from_le_bytes([block[10], block[11]]);
        let serial_number = u32::from_le_bytes([block[12], block[13], block[14], block[15]]);
        let year_of_manufacture = (block[17] != 0).then(|| 1990 + u16::from(block[17]));
        let version = (block[18], block[19]);

        let bits_per_channel = if block[20] & 0x80 != 0 && version >= (1, 4) {
            match (block[20] >> 4) & 0x07 {
                1 => Some(6),
                2 => Some(8),
                3 => Some(10),
                4 => Some(12),
                5 => Some(14),
                6 => Some(16),
                _ => None,
            }
        } else {
            None
        };

        let descriptors: Vec<&[u8]> = DESCRIPTOR_OFFSETS
            .iter()
            .map(|&off| &block[off..off + DESCRIPTOR_LEN])
            .collect();

        let first_timing = descriptors.iter().find(|d| d[0] != 0 || d[1] != 0);

        let (active_pixel_size, dtd_size) = match first_timing {
            Some(d) => {
                let hactive = u32::from(d[2]) | (u32::from(d[4] & 0xf0) << 4);
                let vactive = u32::from(d[5]) | (u32::from(d[7] & 0xf0) << 4);
                let hmm = u32::from(d[12]) | (u32::from(d[14] & 0xf0) << 4);
                let vmm = u32::from(d[13]) | (u32::from(d[14] & 0x0f) << 8);
                (Size::new(hactive, vactive), Size::new(hmm, vmm))
            }
            None => (Size::default(), Size::default()),
        };

        let physical_size = if !dtd_size.is_empty() {
            dtd_size
        } else {
            Size::new(u32::from(block[21]) * 10, u32::from(block[22]) * 10)
        };

        let display_name = descriptors
            .iter()
            .find(|d| d[0] == 0 && d[1] == 0 && d[3] == TAG_MONITOR_NAME)
            .map(|d| descriptor_text(&d[5..]))
            .filter(|name| !name.is_empty());

        Ok(Self {
            manufacturer_id,
            manufacturer: pnp_id(manufacturer_id),
            product_code,
            serial_number,
            year_of_manufacture,
            version,
            bits_per_channel,
            physical_size,
            active_pixel_size,
            display_name,
            checksum_valid,
        })
    }
}

/// Decode the packed 5-bit letters of a PNP id
fn pnp_id(raw: u16) -> String {
    [10u16, 5, 0]
        .iter()
        .map(|shift| {
            let letter = ((raw >> shift) & 0x1f) as u8;
            if (1..=26).contains(&letter) {
                char::from(b'A' + letter - 1)
            } else {
                '?'
            }
        })
        .collect()
}

/// Text of a display descriptor, up to the line feed, trailing padding removed
fn descriptor_text(raw: &[u8]) -> String {
    let end = raw.iter().position(|&b| b == 0x0a).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..end]).trim_end().to_string()
}
