//! Delegated automation-runtime bridge.
//!
//! The runtime lives in a separate execution environment reached through a
//! blocking subprocess call. Two boundary hazards are handled explicitly:
//! the transport may answer in an encoding other than UTF-8 (see
//! [`encoding`](super::encoding)), and the environment listing contains
//! host-reserved decoys that superficially resemble the target runtime and
//! must be filtered out before dispatching real work.

use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::Command;

use crate::config::BridgeConfig;
use crate::error::{DispatchError, ErrorKind, Result};
use crate::executor::encoding::decode;
use crate::executor::BatchExecutor;
use crate::inventory::render::{render_inventory, render_playbook};
use crate::inventory::resolver::flatten;
use crate::inventory::{Device, TargetGroup};
use crate::job::{DeviceResult, TaskRequest};

/// Outcome of one delegated batch call.
#[derive(Debug)]
pub struct BridgeBatch {
    pub results: Vec<DeviceResult>,
    /// Set when structured parsing of the runtime output failed and the
    /// per-device outcomes were recovered from raw text.
    pub parse_degraded: bool,
    /// Runtime environment the batch ran in.
    pub runtime: String,
}

/// Enumerate runtime environments the bridge program knows about, dropping
/// decoys. The listing frequently arrives as UTF-16, hence the decode step.
pub async fn discover_runtimes(config: &BridgeConfig) -> Result<Vec<String>> {
    let output = Command::new(&config.program)
        .args(&config.list_args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| {
            DispatchError::BridgeUnavailable(format!("{} not runnable: {}", config.program, e))
        })?;

    if !output.status.success() {
        return Err(DispatchError::BridgeUnavailable(format!(
            "{} listing exited with {}",
            config.program, output.status
        )));
    }

    let (text, used) = decode(&output.stdout);
    tracing::debug!(encoding = %used, "decoded runtime listing");
    Ok(filter_runtimes(&text, config))
}

/// Positive-match rule (must contain the expected marker) combined with a
/// negative-match rule (must not contain a decoy marker).
pub fn filter_runtimes(listing: &str, config: &BridgeConfig) -> Vec<String> {
    listing
        .lines()
        .map(|line| {
            let cleaned = line.replace('*', "");
            let cleaned = cleaned.trim();
            let lowered = cleaned.to_ascii_lowercase();
            match lowered.strip_suffix("(default)") {
                Some(_) => cleaned[..cleaned.len() - "(default)".len()].trim().to_string(),
                None => cleaned.to_string(),
            }
        })
        .filter(|name| !name.is_empty())
        .filter(|name| {
            let lowered = name.to_ascii_lowercase();
            lowered.contains(&config.expected_marker.to_ascii_lowercase())
                && !config
                    .decoy_markers
                    .iter()
                    .any(|decoy| lowered.contains(&decoy.to_ascii_lowercase()))
        })
        .collect()
}

pub struct BridgeExecutor {
    config: BridgeConfig,
}

impl BridgeExecutor {
    pub fn new(config: BridgeConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl BatchExecutor for BridgeExecutor {
    async fn execute_batch(
        &self,
        task: &TaskRequest,
        commands: &[String],
        groups: &[TargetGroup],
        timeout: Duration,
    ) -> Result<BridgeBatch> {
        let runtimes = discover_runtimes(&self.config).await?;
        let runtime = runtimes.first().cloned().ok_or_else(|| {
            DispatchError::BridgeUnavailable("no runtime environment matched the markers".into())
        })?;

        // Both artifacts are regenerated fresh per job; addresses and
        // credentials may have changed since the last one.
        let scratch = tempfile::tempdir()?;
        let inventory_path = scratch.path().join("inventory.yml");
        let playbook_path = scratch.path().join("playbook.yml");
        tokio::fs::write(&inventory_path, render_inventory(groups)?).await?;
        tokio::fs::write(&playbook_path, render_playbook(task, commands)?).await?;

        let devices = flatten(groups);
        let started = Instant::now();

        let mut command = Command::new(&self.config.program);
        command
            .arg("-d")
            .arg(&runtime)
            .arg(&self.config.runner)
            .arg("-i")
            .arg(&inventory_path)
            .arg(&playbook_path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::info!(runtime = %runtime, runner = %self.config.runner, targets = devices.len(), "dispatching batch to runtime");

        let output = match tokio::time::timeout(timeout, command.output()).await {
            Err(_) => {
                // The runner may still be applying changes; every device is
                // reported as timeout, not failure.
                let elapsed = started.elapsed().as_millis() as u64;
                tracing::warn!(runtime = %runtime, elapsed_ms = elapsed, "batch call exceeded its budget");
                return Ok(BridgeBatch {
                    results: devices
                        .iter()
                        .map(|d| DeviceResult::timeout(&d.id, elapsed))
                        .collect(),
                    parse_degraded: false,
                    runtime,
                });
            }
            Ok(Err(e)) => {
                return Err(DispatchError::BridgeUnavailable(format!(
                    "runner invocation failed: {}",
                    e
                )))
            }
            Ok(Ok(output)) => output,
        };

        let elapsed = started.elapsed().as_millis() as u64;
        let (stdout, used) = decode(&output.stdout);
        tracing::debug!(encoding = %used, bytes = output.stdout.len(), "decoded runner output");

        match parse_structured(&stdout, &devices, elapsed) {
            Some(results) => Ok(BridgeBatch {
                results,
                parse_degraded: false,
                runtime,
            }),
            None => {
                tracing::warn!(runtime = %runtime, "structured parse failed, recovering from raw text");
                Ok(BridgeBatch {
                    results: parse_raw(&stdout, &devices, elapsed),
                    parse_degraded: true,
                    runtime,
                })
            }
        }
    }
}

/// Parse the runner's JSON stats document. Returns `None` when the output is
/// not a stats document at all, which sends the caller down the raw-text
/// path.
fn parse_structured(stdout: &str, devices: &[Device], elapsed_ms: u64) -> Option<Vec<DeviceResult>> {
    let trimmed = stdout.trim_start();
    if !trimmed.starts_with('{') {
        return None;
    }
    let value: serde_json::Value = serde_json::from_str(trimmed).ok()?;
    let stats = value.get("stats")?.as_object()?;

    let results = devices
        .iter()
        .map(|device| match stats.get(&device.id) {
            Some(entry) => {
                let count = |key: &str| entry.get(key).and_then(|v| v.as_u64()).unwrap_or(0);
                if count("unreachable") > 0 {
                    DeviceResult::failure(
                        &device.id,
                        elapsed_ms,
                        ErrorKind::ConnectivityFailure,
                        format!("{}: unreachable", device.id),
                    )
                } else if count("failures") > 0 {
                    DeviceResult::failure(
                        &device.id,
                        elapsed_ms,
                        ErrorKind::CommandRejected,
                        format!("{}: {} task(s) failed", device.id, count("failures")),
                    )
                } else {
                    DeviceResult::success(
                        &device.id,
                        elapsed_ms,
                        format!("{}: ok={} changed={}", device.id, count("ok"), count("changed")),
                    )
                }
            }
            None => DeviceResult::failure(
                &device.id,
                elapsed_ms,
                ErrorKind::ConnectivityFailure,
                format!("{}: absent from runtime stats", device.id),
            ),
        })
        .collect();
    Some(results)
}

/// Recover per-device outcomes from free-form runner text. Failure markers
/// win over success markers for the same device; a device the text never
/// mentions is recorded under the degradation kind rather than invented as
/// a success.
fn parse_raw(stdout: &str, devices: &[Device], elapsed_ms: u64) -> Vec<DeviceResult> {
    devices
        .iter()
        .map(|device| {
            let id = device.id.as_str();
            let mentions: Vec<&str> = stdout
                .lines()
                .filter(|line| line.contains(id))
                .collect();

            let unreachable = mentions.iter().any(|l| {
                l.contains("UNREACHABLE") || l.contains(&format!("unreachable: [{}]", id))
            });
            let failed = mentions.iter().any(|l| {
                l.contains(&format!("fatal: [{}]", id))
                    || l.contains("FAILED")
                    || l.contains(&format!("failed: [{}]", id))
            });
            let succeeded = mentions.iter().any(|l| {
                l.contains("SUCCESS")
                    || l.contains("CHANGED | rc=0")
                    || l.contains(&format!("ok: [{}]", id))
                    || l.contains(&format!("changed: [{}]", id))
            });

            let excerpt = mentions.join("\n");
            if unreachable {
                DeviceResult::failure(id, elapsed_ms, ErrorKind::ConnectivityFailure, excerpt)
            } else if failed {
                DeviceResult::failure(id, elapsed_ms, ErrorKind::CommandRejected, excerpt)
            } else if succeeded {
                DeviceResult::success(id, elapsed_ms, excerpt)
            } else {
                DeviceResult::failure(
                    id,
                    elapsed_ms,
                    ErrorKind::ParseDegraded,
                    format!("{}: no per-device record in runtime output", id),
                )
            }
        })
        .collect()
}
