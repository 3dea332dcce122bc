//! drmprobe Core Library
//!
//! DRM/KMS display inventory and mode resolution for Linux.
//!
//! This library provides:
//! - Connector/CRTC pairing for a DRM device
//! - Display mode extraction with current and native mode resolution
//! - EDID and DRM property decoding (HDCP, privacy screen, CTM, MST path)
//! - Immutable display snapshots for a display-configuration layer
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐    ┌───────────────┐    ┌──────────────┐    ┌─────────────────┐
//! │ KernelDevice │───▶│ Inventory     │───▶│ Mode catalog │───▶│ DisplaySnapshot │
//! │ (/dev/dri)   │    │ (conn ↔ CRTC) │    │ (cur/native) │    │ (+EDID, props)  │
//! └──────────────┘    └───────────────┘    └──────────────┘    └─────────────────┘
//! ```

pub mod card;
pub mod config;
pub mod edid;
pub mod error;
pub mod format;
pub mod inventory;
pub mod kernel;
pub mod modes;
pub mod probe;
pub mod properties;
pub mod snapshot;
pub mod types;

pub use card::{list_cards, Card};
pub use config::{ConfigFile, OutputFormat};
pub use error::{ProbeError, Result};
pub use inventory::{
    get_available_display_controller_infos, get_display_infos_and_invalid_crtcs,
    EnumerationPolicy, HardwareDisplayControllerInfo,
};
pub use kernel::KernelDevice;
pub use probe::{probe_card, ProbeReport};
pub use snapshot::{create_display_snapshot, DisplaySnapshot};
pub use types::{DisplayMode, Point, PrivacyScreenState, Size};
