//! Device snapshot access and target resolution.
//!
//! The inventory store itself is an external collaborator; this module reads
//! a point-in-time snapshot per job and derives backend-facing target groups
//! from it. Nothing here mutates device records.

pub mod render;
pub mod resolver;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{DispatchError, Result};

pub use resolver::{resolve, TargetGroup};

/// Preferred transport for a device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionMode {
    #[default]
    Ssh,
    NetworkCli,
}

/// A device record as read from the inventory snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    pub address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Platform/vendor tag, e.g. `cisco_ios_router`.
    pub platform: String,
    /// Key into the engine's credential table.
    #[serde(default = "default_credential_ref")]
    pub credential_ref: String,
    #[serde(default)]
    pub connection_mode: ConnectionMode,
}

fn default_port() -> u16 {
    22
}

fn default_credential_ref() -> String {
    "default".to_string()
}

/// How a task selects its targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetSelector {
    All,
    Ids(Vec<String>),
    Platform(String),
}

impl std::fmt::Display for TargetSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetSelector::All => write!(f, "all"),
            TargetSelector::Ids(ids) => write!(f, "ids:{}", ids.join(",")),
            TargetSelector::Platform(p) => write!(f, "platform:{}", p),
        }
    }
}

/// Source of device snapshots. Implementations must return a fresh snapshot
/// on every call; the engine never caches one across jobs.
pub trait InventorySource: Send + Sync {
    fn snapshot(&self) -> Result<Vec<Device>>;
}

/// Snapshot loaded from a YAML file, re-read per job so that address and
/// credential changes between jobs are picked up.
pub struct FileInventory {
    path: PathBuf,
}

#[derive(Deserialize)]
struct SnapshotFile {
    devices: Vec<Device>,
}

impl FileInventory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl InventorySource for FileInventory {
    fn snapshot(&self) -> Result<Vec<Device>> {
        let raw = std::fs::read_to_string(&self.path)?;
        let file: SnapshotFile = serde_yaml::from_str(&raw)?;
        let mut seen = std::collections::HashSet::new();
        for device in &file.devices {
            if !seen.insert(device.id.clone()) {
                return Err(DispatchError::Inventory(format!(
                    "duplicate device id in snapshot: {}",
                    device.id
                )));
            }
        }
        Ok(file.devices)
    }
}

/// Fixed snapshot, used by tests and embedded callers.
pub struct StaticInventory {
    devices: Vec<Device>,
}

impl StaticInventory {
    pub fn new(devices: Vec<Device>) -> Self {
        Self { devices }
    }
}

impl InventorySource for StaticInventory {
    fn snapshot(&self) -> Result<Vec<Device>> {
        Ok(self.devices.clone())
    }
}
