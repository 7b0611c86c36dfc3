//! Backend capability probing and the backend selection policy.
//!
//! Availability is recomputed at the start of every job and never cached
//! across jobs; runtime reachability and shell connectivity can change
//! between invocations. A check that exceeds its timeout is treated as
//! "unavailable", never as an error that aborts the job.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;

use crate::config::BridgeConfig;
use crate::executor::bridge;
use crate::inventory::{Device, TargetGroup};

/// One of the three execution strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Bridge,
    DirectSsh,
    Simulation,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Bridge => write!(f, "bridge"),
            BackendKind::DirectSsh => write!(f, "direct_ssh"),
            BackendKind::Simulation => write!(f, "simulation"),
        }
    }
}

/// Ephemeral availability snapshot for one job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackendAvailability {
    pub bridge: bool,
    pub direct_ssh: bool,
}

impl BackendAvailability {
    fn has(&self, backend: BackendKind) -> bool {
        match backend {
            BackendKind::Bridge => self.bridge,
            BackendKind::DirectSsh => self.direct_ssh,
            BackendKind::Simulation => true,
        }
    }
}

/// Selection policy, most preferred first. A policy constant rather than a
/// per-call-site decision so explicit caller preference can override it.
pub const BACKEND_PREFERENCE: [BackendKind; 3] = [
    BackendKind::Bridge,
    BackendKind::DirectSsh,
    BackendKind::Simulation,
];

/// Pure backend decision over an availability snapshot. An explicit
/// preference wins when that backend is available; otherwise the standard
/// order applies. Simulation is always available, so this total function
/// never fails.
pub fn select_backend(
    availability: BackendAvailability,
    preference: Option<BackendKind>,
) -> BackendKind {
    if let Some(preferred) = preference {
        if availability.has(preferred) {
            return preferred;
        }
    }
    for backend in BACKEND_PREFERENCE {
        if availability.has(backend) {
            return backend;
        }
    }
    BackendKind::Simulation
}

/// Determines which backends are usable for this job's targets.
#[async_trait]
pub trait CapabilityProber: Send + Sync {
    async fn probe(&self, groups: &[TargetGroup]) -> BackendAvailability;
}

/// How many devices the direct-shell check samples.
const PROBE_SAMPLE: usize = 3;

/// Result of one device connectivity check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectivityProbe {
    pub device_id: String,
    pub reachable: bool,
    pub latency_ms: Option<u64>,
}

/// Lightweight TCP reachability check against one device.
pub async fn probe_device(device: &Device, timeout: Duration) -> ConnectivityProbe {
    let started = Instant::now();
    let attempt = tokio::time::timeout(
        timeout,
        TcpStream::connect((device.address.as_str(), device.port)),
    )
    .await;
    match attempt {
        Ok(Ok(_)) => ConnectivityProbe {
            device_id: device.id.clone(),
            reachable: true,
            latency_ms: Some(started.elapsed().as_millis() as u64),
        },
        Ok(Err(e)) => {
            tracing::debug!(device = %device.id, error = %e, "device probe refused");
            ConnectivityProbe {
                device_id: device.id.clone(),
                reachable: false,
                latency_ms: None,
            }
        }
        Err(_) => {
            tracing::debug!(device = %device.id, "device probe timed out");
            ConnectivityProbe {
                device_id: device.id.clone(),
                reachable: false,
                latency_ms: None,
            }
        }
    }
}

/// Real prober: runtime-environment discovery for the bridge, TCP
/// reachability against a representative subset for direct shell. The two
/// checks run concurrently, each under its own timeout.
pub struct NetworkProber {
    bridge: BridgeConfig,
    timeout: Duration,
}

impl NetworkProber {
    pub fn new(bridge: BridgeConfig, timeout: Duration) -> Self {
        Self { bridge, timeout }
    }

    async fn bridge_reachable(&self) -> bool {
        match tokio::time::timeout(self.timeout, bridge::discover_runtimes(&self.bridge)).await {
            Ok(Ok(runtimes)) => !runtimes.is_empty(),
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "bridge probe failed");
                false
            }
            Err(_) => {
                tracing::debug!("bridge probe timed out");
                false
            }
        }
    }

    async fn shell_reachable(&self, groups: &[TargetGroup]) -> bool {
        // Representative subset: the first device of each group, capped.
        let sample: Vec<&Device> = groups
            .iter()
            .filter_map(|g| g.devices.first())
            .take(PROBE_SAMPLE)
            .collect();

        for device in sample {
            let probe = probe_device(device, self.timeout).await;
            if probe.reachable {
                tracing::debug!(
                    device = %probe.device_id,
                    latency_ms = probe.latency_ms,
                    "device reachable"
                );
                return true;
            }
        }
        false
    }
}

#[async_trait]
impl CapabilityProber for NetworkProber {
    async fn probe(&self, groups: &[TargetGroup]) -> BackendAvailability {
        let (bridge, direct_ssh) =
            tokio::join!(self.bridge_reachable(), self.shell_reachable(groups));
        tracing::info!(bridge, direct_ssh, "backend availability probed");
        BackendAvailability { bridge, direct_ssh }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preference_order_is_bridge_shell_simulation() {
        let all = BackendAvailability {
            bridge: true,
            direct_ssh: true,
        };
        assert_eq!(select_backend(all, None), BackendKind::Bridge);

        let no_bridge = BackendAvailability {
            bridge: false,
            direct_ssh: true,
        };
        assert_eq!(select_backend(no_bridge, None), BackendKind::DirectSsh);

        let none = BackendAvailability::default();
        assert_eq!(select_backend(none, None), BackendKind::Simulation);
    }

    #[test]
    fn explicit_preference_wins_when_available() {
        let all = BackendAvailability {
            bridge: true,
            direct_ssh: true,
        };
        assert_eq!(
            select_backend(all, Some(BackendKind::DirectSsh)),
            BackendKind::DirectSsh
        );
        assert_eq!(
            select_backend(all, Some(BackendKind::Simulation)),
            BackendKind::Simulation
        );
    }

    #[test]
    fn unavailable_preference_falls_back_to_policy() {
        let shell_only = BackendAvailability {
            bridge: false,
            direct_ssh: true,
        };
        assert_eq!(
            select_backend(shell_only, Some(BackendKind::Bridge)),
            BackendKind::DirectSsh
        );
    }
}
