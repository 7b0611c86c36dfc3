//! Generated artifacts for the delegated runtime boundary.
//!
//! The inventory document is the only artifact written across that boundary
//! and is regenerated fresh per job; addresses and credentials may change
//! between jobs, so nothing here is cached.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::Result;
use crate::inventory::resolver::{platform_os_hint, TargetGroup};
use crate::job::TaskRequest;

#[derive(Debug, Serialize)]
pub struct HostEntry {
    pub address: String,
    pub port: u16,
    pub platform_hint: String,
}

#[derive(Debug, Serialize)]
pub struct GroupEntry {
    pub hosts: BTreeMap<String, HostEntry>,
}

/// Grouped mapping `{group: {hosts: {device_id: {address, port, platform_hint}}}}`.
/// BTreeMap ordering keeps the rendered document reproducible.
pub fn inventory_document(groups: &[TargetGroup]) -> BTreeMap<String, GroupEntry> {
    let mut doc = BTreeMap::new();
    for group in groups {
        let mut hosts = BTreeMap::new();
        for device in &group.devices {
            hosts.insert(
                device.id.clone(),
                HostEntry {
                    address: device.address.clone(),
                    port: device.port,
                    platform_hint: platform_os_hint(&device.platform).to_string(),
                },
            );
        }
        doc.insert(group.name.clone(), GroupEntry { hosts });
    }
    doc
}

pub fn render_inventory(groups: &[TargetGroup]) -> Result<String> {
    Ok(serde_yaml::to_string(&inventory_document(groups))?)
}

#[derive(Serialize)]
struct PlaybookTask {
    name: String,
    raw: String,
}

#[derive(Serialize)]
struct Play {
    name: String,
    hosts: String,
    gather_facts: bool,
    tasks: Vec<PlaybookTask>,
}

/// Minimal playbook document: one play over all hosts running the task's
/// command set as a raw script.
pub fn render_playbook(task: &TaskRequest, commands: &[String]) -> Result<String> {
    let play = Play {
        name: task.name.clone(),
        hosts: "all".to_string(),
        gather_facts: false,
        tasks: vec![PlaybookTask {
            name: format!("run {}", task.name),
            raw: commands.join("\n"),
        }],
    };
    Ok(serde_yaml::to_string(&vec![play])?)
}
