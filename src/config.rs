use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings for the direct SSH backend.
///
/// One session is opened per device; sessions are never pooled across
/// devices so one device's failure cannot affect another.
#[derive(Debug, Clone)]
pub struct SshConfig {
    /// Time allowed for TCP connect plus SSH handshake.
    pub connect_timeout: Duration,
    /// Cap on captured output per device; anything beyond is truncated
    /// with an explicit marker.
    pub max_output_bytes: usize,
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            max_output_bytes: 256 * 1024,
        }
    }
}

/// Settings for the delegated automation-runtime bridge.
///
/// The runtime lives in a separate execution environment reached through a
/// subprocess. Environment discovery filters the runtime list with a
/// positive marker (must appear) and decoy markers (must not appear),
/// because container-management environments show up in the same listing.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Program that fronts the runtime environment (e.g. `wsl`).
    pub program: String,
    /// Arguments that list available runtime environments.
    pub list_args: Vec<String>,
    /// A usable environment's name must contain this marker.
    pub expected_marker: String,
    /// An environment whose name contains any of these is host-reserved.
    pub decoy_markers: Vec<String>,
    /// Playbook runner invoked inside the environment.
    pub runner: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            program: "wsl".to_string(),
            list_args: vec!["--list".to_string(), "--quiet".to_string()],
            expected_marker: "ubuntu".to_string(),
            decoy_markers: vec!["docker".to_string()],
            runner: "ansible-playbook".to_string(),
        }
    }
}

/// Credentials resolved through a device's credential reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum simultaneous per-device executions within one job.
    pub max_concurrency: usize,
    /// Per-device execution budget (direct SSH and simulation accounting).
    pub device_timeout: Duration,
    /// Budget for the single blocking bridge call covering a whole batch.
    pub bridge_timeout: Duration,
    /// Budget for each individual backend liveness check.
    pub probe_timeout: Duration,
    /// Slack added on top of the computed per-unit budgets for the
    /// job-level wall-clock cap.
    pub job_overhead: Duration,
    /// Upper bound on retained job records; submission is rejected beyond it.
    pub max_jobs: usize,
    pub ssh: SshConfig,
    pub bridge: BridgeConfig,
    /// Credential table keyed by credential reference.
    pub credentials: BTreeMap<String, Credentials>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let mut credentials = BTreeMap::new();
        credentials.insert(
            "default".to_string(),
            Credentials {
                username: "admin".to_string(),
                password: "admin".to_string(),
            },
        );
        Self {
            max_concurrency: 5,
            device_timeout: Duration::from_secs(30),
            bridge_timeout: Duration::from_secs(300),
            probe_timeout: Duration::from_secs(5),
            job_overhead: Duration::from_secs(10),
            max_jobs: 10_000,
            ssh: SshConfig::default(),
            bridge: BridgeConfig::default(),
            credentials,
        }
    }
}

impl EngineConfig {
    pub fn with_max_concurrency(mut self, n: usize) -> Self {
        self.max_concurrency = n.max(1);
        self
    }

    pub fn with_device_timeout(mut self, timeout: Duration) -> Self {
        self.device_timeout = timeout;
        self
    }

    pub fn with_credentials(mut self, reference: &str, creds: Credentials) -> Self {
        self.credentials.insert(reference.to_string(), creds);
        self
    }

    /// Job-level wall-clock cap: the per-unit budgets for `device_count`
    /// devices at the configured concurrency, plus overhead.
    pub fn job_timeout(&self, device_count: usize) -> Duration {
        let waves = device_count.div_ceil(self.max_concurrency).max(1) as u32;
        self.device_timeout * waves + self.job_overhead
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_config_default() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.max_concurrency, 5);
        assert_eq!(cfg.device_timeout, Duration::from_secs(30));
        assert_eq!(cfg.max_jobs, 10_000);
        assert!(cfg.credentials.contains_key("default"));
    }

    #[test]
    fn bridge_config_default_markers() {
        let cfg = BridgeConfig::default();
        assert_eq!(cfg.program, "wsl");
        assert_eq!(cfg.expected_marker, "ubuntu");
        assert_eq!(cfg.decoy_markers, vec!["docker".to_string()]);
    }

    #[test]
    fn max_concurrency_is_never_zero() {
        let cfg = EngineConfig::default().with_max_concurrency(0);
        assert_eq!(cfg.max_concurrency, 1);
    }

    #[test]
    fn credential_table_accepts_additional_references() {
        let cfg = EngineConfig::default().with_credentials(
            "lab",
            Credentials {
                username: "ansible".to_string(),
                password: "ansible123".to_string(),
            },
        );
        assert_eq!(cfg.credentials["lab"].username, "ansible");
        assert!(cfg.credentials.contains_key("default"));
    }

    #[test]
    fn job_timeout_scales_with_device_count() {
        let cfg = EngineConfig {
            max_concurrency: 2,
            device_timeout: Duration::from_secs(10),
            job_overhead: Duration::from_secs(5),
            ..EngineConfig::default()
        };
        // 5 devices at concurrency 2 -> 3 waves of 10s, plus 5s overhead.
        assert_eq!(cfg.job_timeout(5), Duration::from_secs(35));
        // An empty job still gets one wave.
        assert_eq!(cfg.job_timeout(0), Duration::from_secs(15));
    }
}
