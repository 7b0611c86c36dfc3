use netdispatch::inventory::resolver::{flatten, target_count};
use netdispatch::inventory::{resolve, Device, TargetSelector};

fn device(id: &str, platform: &str) -> Device {
    Device {
        id: id.to_string(),
        address: "127.0.0.1".to_string(),
        port: 22,
        platform: platform.to_string(),
        credential_ref: "default".to_string(),
        connection_mode: Default::default(),
    }
}

fn lab_snapshot() -> Vec<Device> {
    vec![
        device("lab-router1", "cisco_ios_router"),
        device("lab-router2", "cisco_xr_router"),
        device("lab-switch1", "arista_switch"),
        device("lab-firewall1", "cisco_asa"),
        device("lab-sensor1", "telemetry_probe"),
    ]
}

#[test]
fn test_groups_are_disjoint_and_cover_the_match() {
    let snapshot = lab_snapshot();
    let groups = resolve(&snapshot, &TargetSelector::All);

    // Union equals the match.
    assert_eq!(target_count(&groups), snapshot.len());

    // No device appears in two groups.
    let mut seen = std::collections::HashSet::new();
    for group in &groups {
        for dev in &group.devices {
            assert!(seen.insert(dev.id.clone()), "{} appears twice", dev.id);
        }
    }
    assert_eq!(seen.len(), snapshot.len());
}

#[test]
fn test_id_selector_matches_exactly() {
    let snapshot = lab_snapshot();
    let groups = resolve(
        &snapshot,
        &TargetSelector::Ids(vec!["lab-router1".to_string(), "lab-switch1".to_string()]),
    );

    let ids: Vec<String> = flatten(&groups).into_iter().map(|d| d.id).collect();
    assert_eq!(ids, vec!["lab-router1".to_string(), "lab-switch1".to_string()]);
}

#[test]
fn test_unknown_ids_are_simply_not_matched() {
    let snapshot = lab_snapshot();
    let groups = resolve(
        &snapshot,
        &TargetSelector::Ids(vec!["lab-router1".to_string(), "ghost".to_string()]),
    );
    assert_eq!(target_count(&groups), 1);
}

#[test]
fn test_platform_selector_groups_by_class() {
    let snapshot = lab_snapshot();
    let groups = resolve(&snapshot, &TargetSelector::Platform("router".to_string()));

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].name, "routers");
    assert_eq!(groups[0].devices.len(), 2);
}

#[test]
fn test_empty_match_yields_empty_result_not_error() {
    let snapshot = lab_snapshot();
    let groups = resolve(&snapshot, &TargetSelector::Platform("loadbalancer".to_string()));
    assert!(groups.is_empty());
}

#[test]
fn test_unclassified_platforms_land_in_unknown() {
    let snapshot = lab_snapshot();
    let groups = resolve(&snapshot, &TargetSelector::All);
    let unknown = groups.iter().find(|g| g.name == "unknown").unwrap();
    assert_eq!(unknown.devices[0].id, "lab-sensor1");
}

#[test]
fn test_flatten_is_sorted_by_device_id() {
    let snapshot = lab_snapshot();
    let groups = resolve(&snapshot, &TargetSelector::All);
    let ids: Vec<String> = flatten(&groups).into_iter().map(|d| d.id).collect();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted);
}
