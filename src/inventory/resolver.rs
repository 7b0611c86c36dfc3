//! Target Resolver: device snapshot + selector -> disjoint target groups.

use crate::inventory::{Device, TargetSelector};

/// A named partition of devices sharing a platform class. Derived per job,
/// never persisted.
#[derive(Debug, Clone)]
pub struct TargetGroup {
    pub name: String,
    pub devices: Vec<Device>,
}

impl TargetGroup {
    pub fn device_ids(&self) -> Vec<String> {
        self.devices.iter().map(|d| d.id.clone()).collect()
    }
}

/// Platform class a device's tag falls into, in match order. `asa` counts as
/// a firewall tag even without the word itself.
fn group_name(platform: &str) -> &'static str {
    let tag = platform.to_ascii_lowercase();
    if tag.contains("router") {
        "routers"
    } else if tag.contains("switch") {
        "switches"
    } else if tag.contains("firewall") || tag.contains("asa") {
        "firewalls"
    } else {
        "unknown"
    }
}

/// Automation-OS hint written into the generated inventory for a platform tag.
pub fn platform_os_hint(platform: &str) -> &'static str {
    const MAPPING: &[(&str, &str)] = &[
        ("cisco_xr", "iosxr"),
        ("cisco_nxos", "nxos"),
        ("cisco_asa", "asa"),
        ("juniper", "junos"),
        ("arista", "eos"),
        ("hp", "comware"),
        ("dell", "dellos10"),
    ];
    let tag = platform.to_ascii_lowercase();
    for (key, hint) in MAPPING {
        if tag.contains(key) {
            return hint;
        }
    }
    "ios"
}

fn matches(device: &Device, selector: &TargetSelector) -> bool {
    match selector {
        TargetSelector::All => true,
        TargetSelector::Ids(ids) => ids.iter().any(|id| id == &device.id),
        TargetSelector::Platform(filter) => device
            .platform
            .to_ascii_lowercase()
            .contains(&filter.to_ascii_lowercase()),
    }
}

/// Partition the selector-matched devices into platform-class groups.
///
/// Guarantees: groups are pairwise disjoint and their union equals the
/// selector match; group and device ordering is deterministic. An empty
/// match yields an empty vector, not an error, so callers can report
/// "no matching devices" distinctly from a failure.
pub fn resolve(snapshot: &[Device], selector: &TargetSelector) -> Vec<TargetGroup> {
    let mut buckets: std::collections::BTreeMap<&'static str, Vec<Device>> =
        std::collections::BTreeMap::new();

    for device in snapshot {
        if matches(device, selector) {
            buckets
                .entry(group_name(&device.platform))
                .or_default()
                .push(device.clone());
        }
    }

    buckets
        .into_iter()
        .map(|(name, mut devices)| {
            devices.sort_by(|a, b| a.id.cmp(&b.id));
            TargetGroup {
                name: name.to_string(),
                devices,
            }
        })
        .collect()
}

/// Total number of devices across groups.
pub fn target_count(groups: &[TargetGroup]) -> usize {
    groups.iter().map(|g| g.devices.len()).sum()
}

/// All devices across groups in normalizer order (ascending id).
pub fn flatten(groups: &[TargetGroup]) -> Vec<Device> {
    let mut devices: Vec<Device> = groups.iter().flat_map(|g| g.devices.clone()).collect();
    devices.sort_by(|a, b| a.id.cmp(&b.id));
    devices
}
