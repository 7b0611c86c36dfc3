use std::io::Write;

use netdispatch::inventory::render::render_inventory;
use netdispatch::inventory::{resolve, FileInventory, InventorySource, TargetSelector};

const SNAPSHOT: &str = r#"
devices:
  - id: lab-router1
    address: 127.0.0.1
    port: 2221
    platform: cisco_ios_router
  - id: lab-switch1
    address: 127.0.0.1
    port: 2222
    platform: arista_switch
    credential_ref: lab
  - id: lab-firewall1
    address: 127.0.0.1
    port: 2223
    platform: cisco_asa
"#;

fn write_snapshot(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_snapshot_loads_with_defaults() {
    let file = write_snapshot(SNAPSHOT);
    let devices = FileInventory::new(file.path()).snapshot().unwrap();

    assert_eq!(devices.len(), 3);
    assert_eq!(devices[0].id, "lab-router1");
    assert_eq!(devices[0].port, 2221);
    // Unspecified credential reference falls back to "default".
    assert_eq!(devices[0].credential_ref, "default");
    assert_eq!(devices[1].credential_ref, "lab");
}

#[test]
fn test_duplicate_device_ids_are_rejected() {
    let file = write_snapshot(
        "devices:\n  - id: r1\n    address: 10.0.0.1\n    platform: cisco_ios_router\n  - id: r1\n    address: 10.0.0.2\n    platform: cisco_ios_router\n",
    );
    let err = FileInventory::new(file.path()).snapshot().unwrap_err();
    assert!(err.to_string().contains("duplicate device id"));
}

#[test]
fn test_generated_inventory_shape() {
    let file = write_snapshot(SNAPSHOT);
    let devices = FileInventory::new(file.path()).snapshot().unwrap();
    let groups = resolve(&devices, &TargetSelector::All);
    let rendered = render_inventory(&groups).unwrap();

    // Grouped mapping {group: {hosts: {device: {...}}}} with one group per
    // platform class present in the snapshot.
    let parsed: serde_yaml::Value = serde_yaml::from_str(&rendered).unwrap();
    let mapping = parsed.as_mapping().unwrap();
    assert_eq!(mapping.len(), 3);
    let routers = &parsed["routers"]["hosts"]["lab-router1"];
    assert_eq!(routers["port"].as_u64(), Some(2221));
    assert_eq!(routers["platform_hint"].as_str(), Some("ios"));
}
