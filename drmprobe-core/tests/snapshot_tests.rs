//! Integration tests for snapshot construction

mod mocks;

use std::path::Path;

use drmprobe_core::edid::Edid;
use drmprobe_core::inventory::{get_available_display_controller_infos, EnumerationPolicy};
use drmprobe_core::kernel::{ConnectorKind, PropertyKind};
use drmprobe_core::probe::probe_card;
use drmprobe_core::properties;
use drmprobe_core::snapshot::{connector_index, create_display_snapshot, generate_display_id};
use drmprobe_core::types::{
    ContentProtectionMethod, DisplayConnectionType, HdcpState, Point, PrivacyScreenState, Size,
};
use mocks::{mode, preferred, ConnectorSpec, EdidSpec, FakeDevice};

const SYS_PATH: &str = "/sys/devices/pci0000:00/0000:00:02.0/drm/card0";

/// One 4K DisplayPort monitor on CRTC 10, currently running 1080p
fn single_display() -> FakeDevice {
    let mut device = FakeDevice::new();
    device.add_crtc(10).add_crtc(11);
    device.add_encoder(20, 0, 0b11);
    device.add_connector(
        30,
        ConnectorSpec::connected(
            ConnectorKind::DisplayPort,
            &[20],
            vec![preferred(3840, 2160, 60), mode(1920, 1080, 60)],
        ),
    );
    device.set_crtc_mode(10, mode(1920, 1080, 60));
    device
}

#[test]
fn test_snapshot_with_edid() {
    let mut device = single_display();
    let spec = EdidSpec::default();
    device.attach_blob(30, properties::EDID, spec.build());

    let displays = get_available_display_controller_infos(&device).unwrap();
    let snapshot =
        create_display_snapshot(&device, &displays[0], Path::new(SYS_PATH), 1, Point::new(0, 0));

    assert_eq!(snapshot.connector_name, "DP-1");
    assert_eq!(snapshot.connection_type, DisplayConnectionType::DisplayPort);
    assert_eq!(snapshot.physical_size, Size::new(597, 336));
    assert_eq!(snapshot.manufacturer.as_deref(), Some("DEL"));
    assert_eq!(snapshot.display_name.as_deref(), Some("DELL U2720Q"));
    assert_eq!(snapshot.year_of_manufacture, Some(2021));
    assert_eq!(snapshot.bits_per_channel, Some(10));
    assert_eq!(snapshot.sys_path, Path::new(SYS_PATH));

    assert_eq!(snapshot.modes().len(), 2);
    assert_eq!(snapshot.native_mode_index(), Some(0));
    assert_eq!(snapshot.current_mode_index(), Some(1));
    assert_eq!(
        snapshot.current_mode().map(|m| m.size()),
        Some(Size::new(1920, 1080))
    );

    let index = connector_index(1, 0);
    assert_eq!(snapshot.port_display_id, i64::from(index));
    let edid = Edid::parse(&spec.build()).unwrap();
    assert_eq!(snapshot.display_id, generate_display_id(&edid, index));
    assert_eq!(snapshot.display_id >> 40, i64::from(spec.manufacturer_id()));
    assert_eq!(snapshot.base_connector_id, 30);
    assert!(snapshot.path_topology.is_empty());
}

#[test]
fn test_display_id_differs_between_models() {
    let a = Edid::parse(&EdidSpec::default().build()).unwrap();
    let b = Edid::parse(
        &EdidSpec {
            name: Some("DELL P2419H"),
            ..EdidSpec::default()
        }
        .build(),
    )
    .unwrap();
    assert_ne!(generate_display_id(&a, 0), generate_display_id(&b, 0));
    assert_eq!(generate_display_id(&a, 3) & 0xff, 3);
}

#[test]
fn test_snapshot_without_edid_falls_back() {
    let device = single_display();

    let displays = get_available_display_controller_infos(&device).unwrap();
    let snapshot =
        create_display_snapshot(&device, &displays[0], Path::new(SYS_PATH), 0, Point::default());

    assert_eq!(snapshot.physical_size, Size::default());
    assert!(snapshot.native_mode().is_none());
    assert_eq!(snapshot.display_id, snapshot.port_display_id);
    assert!(snapshot.manufacturer.is_none());
    // Geometry falls back to the programmed mode.
    assert_eq!(snapshot.pixel_size(), Size::new(1920, 1080));
}

#[test]
fn test_snapshot_with_corrupt_edid_falls_back() {
    let mut device = single_display();
    device.attach_blob(30, properties::EDID, vec![0xde, 0xad, 0xbe, 0xef]);

    let displays = get_available_display_controller_infos(&device).unwrap();
    let snapshot =
        create_display_snapshot(&device, &displays[0], Path::new(SYS_PATH), 0, Point::default());

    assert_eq!(snapshot.physical_size, Size::default());
    assert!(snapshot.native_mode().is_none());
    assert_eq!(snapshot.modes().len(), 2);
}

#[test]
fn test_edid_with_bad_checksum_is_still_used() {
    let mut device = single_display();
    let mut blob = EdidSpec::default().build();
    blob[127] = blob[127].wrapping_add(1);
    device.attach_blob(30, properties::EDID, blob);

    let displays = get_available_display_controller_infos(&device).unwrap();
    let snapshot =
        create_display_snapshot(&device, &displays[0], Path::new(SYS_PATH), 0, Point::default());
    assert_eq!(snapshot.physical_size, Size::new(597, 336));
}

#[test]
fn test_snapshot_properties() {
    let mut device = single_display();
    device.attach_enum(
        30,
        properties::CONTENT_PROTECTION,
        &["Undesired", "Desired", "Enabled"],
        "Desired",
    );
    device.attach_enum(
        30,
        properties::HDCP_CONTENT_TYPE,
        &["HDCP Type0", "HDCP Type1"],
        "HDCP Type1",
    );
    device.attach_enum(
        30,
        properties::SCALING_MODE,
        &["None", "Full", "Center", "Full aspect"],
        "Full aspect",
    );
    device.attach_enum(
        30,
        properties::PRIVACY_SCREEN_SW_STATE,
        &["Disabled", "Enabled"],
        "Enabled",
    );
    device.attach_enum(
        30,
        properties::PRIVACY_SCREEN_HW_STATE,
        &["Disabled", "Enabled", "Disabled-locked", "Enabled-locked"],
        "Enabled",
    );
    device.attach_property(10, properties::CTM, PropertyKind::Blob, 0);

    let displays = get_available_display_controller_infos(&device).unwrap();
    let snapshot =
        create_display_snapshot(&device, &displays[0], Path::new(SYS_PATH), 0, Point::default());

    assert!(snapshot.has_content_protection);
    assert_eq!(snapshot.hdcp_state, Some(HdcpState::Desired));
    assert_eq!(
        snapshot.content_protection_method,
        Some(ContentProtectionMethod::HdcpType1)
    );
    assert!(snapshot.is_aspect_preserving_scaling);
    assert_eq!(snapshot.privacy_screen_state, PrivacyScreenState::Enabled);
    assert!(snapshot.has_color_correction_matrix);
}

#[test]
fn test_snapshot_without_optional_properties() {
    let device = single_display();

    let displays = get_available_display_controller_infos(&device).unwrap();
    let snapshot =
        create_display_snapshot(&device, &displays[0], Path::new(SYS_PATH), 0, Point::default());

    assert!(!snapshot.has_content_protection);
    assert_eq!(snapshot.hdcp_state, None);
    assert!(!snapshot.is_aspect_preserving_scaling);
    assert_eq!(snapshot.privacy_screen_state, PrivacyScreenState::NotSupported);
    assert!(!snapshot.has_color_correction_matrix);
    assert_eq!(snapshot.maximum_cursor_size, Size::new(64, 64));
}

#[test]
fn test_snapshot_mst_path_and_cursor() {
    let mut device = single_display();
    device.attach_blob(30, properties::PATH, b"mst:42-1-3\0".to_vec());
    device.cursor = Some((256, 256));

    let displays = get_available_display_controller_infos(&device).unwrap();
    let snapshot =
        create_display_snapshot(&device, &displays[0], Path::new(SYS_PATH), 0, Point::default());

    assert_eq!(snapshot.base_connector_id, 42);
    assert_eq!(snapshot.path_topology, vec![1, 3]);
    assert_eq!(snapshot.maximum_cursor_size, Size::new(256, 256));
}

#[test]
fn test_probe_card_lays_out_displays() {
    let mut device = FakeDevice::new();
    device.add_crtc(10).add_crtc(11).add_crtc(12);
    device.add_encoder(20, 0, 0b111).add_encoder(21, 0, 0b111);
    device.add_connector(
        30,
        ConnectorSpec::connected(ConnectorKind::Edp, &[20], vec![preferred(2560, 1600, 60)]),
    );
    device.add_connector(
        31,
        ConnectorSpec::connected(ConnectorKind::HdmiA, &[21], vec![preferred(1920, 1080, 60)]),
    );
    device.set_crtc_mode(10, preferred(2560, 1600, 60));
    device.set_crtc_mode(11, preferred(1920, 1080, 60));

    let report = probe_card(
        &device,
        Path::new(SYS_PATH),
        0,
        100,
        EnumerationPolicy::default(),
    )
    .unwrap();

    assert_eq!(report.snapshots.len(), 2);
    assert_eq!(report.invalid_crtcs, vec![12]);
    assert_eq!(report.snapshots[0].origin, Point::new(100, 0));
    assert_eq!(report.snapshots[1].origin, Point::new(2660, 0));
    assert_eq!(
        report.snapshots[0].connection_type,
        DisplayConnectionType::Internal
    );
    assert_eq!(report.width(), 2660 + 1920);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["snapshots"][1]["connector_name"], "HDMI-A-1");
    assert_eq!(json["snapshots"][1]["current_mode"], 0);
}
