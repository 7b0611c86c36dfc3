use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use netdispatch::config::EngineConfig;
use netdispatch::coordinator::{await_terminal, JobCoordinator};
use netdispatch::error::{DispatchError, ErrorKind, Result};
use netdispatch::executor::{BatchExecutor, BridgeBatch, DeviceExecutor};
use netdispatch::inventory::{Device, StaticInventory, TargetGroup, TargetSelector};
use netdispatch::job::{DeviceResult, JobState, Outcome, TaskRequest};
use netdispatch::probe::{BackendAvailability, BackendKind, CapabilityProber};

// =============================================================================
// Test doubles
// =============================================================================

struct FixedProber {
    availability: BackendAvailability,
}

#[async_trait]
impl CapabilityProber for FixedProber {
    async fn probe(&self, _groups: &[TargetGroup]) -> BackendAvailability {
        self.availability
    }
}

/// Scripted per-device executor that records call counts and the maximum
/// number of simultaneously running executions.
struct ScriptedExecutor {
    outcomes: HashMap<String, DeviceResult>,
    delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedExecutor {
    fn new(outcomes: HashMap<String, DeviceResult>) -> Self {
        Self {
            outcomes,
            delay: Duration::from_millis(20),
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    fn all_succeeding(devices: &[&str]) -> Self {
        let outcomes = devices
            .iter()
            .map(|id| (id.to_string(), DeviceResult::success(id, 10, format!("{} ok", id))))
            .collect();
        Self::new(outcomes)
    }
}

#[async_trait]
impl DeviceExecutor for ScriptedExecutor {
    async fn execute(
        &self,
        device: &Device,
        _commands: &[String],
        _timeout: Duration,
    ) -> DeviceResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.outcomes
            .get(&device.id)
            .cloned()
            .unwrap_or_else(|| {
                DeviceResult::failure(
                    &device.id,
                    1,
                    ErrorKind::ConnectivityFailure,
                    "unscripted device".to_string(),
                )
            })
    }
}

enum BridgeScript {
    Unavailable,
    Degraded(Vec<DeviceResult>),
    Ok(Vec<DeviceResult>),
}

struct ScriptedBridge {
    script: BridgeScript,
    calls: AtomicUsize,
}

impl ScriptedBridge {
    fn new(script: BridgeScript) -> Self {
        Self {
            script,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl BatchExecutor for ScriptedBridge {
    async fn execute_batch(
        &self,
        _task: &TaskRequest,
        _commands: &[String],
        _groups: &[TargetGroup],
        _timeout: Duration,
    ) -> Result<BridgeBatch> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            BridgeScript::Unavailable => Err(DispatchError::BridgeUnavailable(
                "no runtime environment matched the markers".to_string(),
            )),
            BridgeScript::Degraded(results) => Ok(BridgeBatch {
                results: results.clone(),
                parse_degraded: true,
                runtime: "Ubuntu".to_string(),
            }),
            BridgeScript::Ok(results) => Ok(BridgeBatch {
                results: results.clone(),
                parse_degraded: false,
                runtime: "Ubuntu".to_string(),
            }),
        }
    }
}

// =============================================================================
// Harness
// =============================================================================

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

fn lab_devices() -> Vec<Device> {
    vec![
        device("lab-router1", "cisco_ios_router"),
        device("lab-switch1", "arista_switch"),
        device("lab-firewall1", "cisco_asa"),
    ]
}

fn coordinator(
    devices: Vec<Device>,
    availability: BackendAvailability,
    direct: Arc<ScriptedExecutor>,
    bridge: Arc<ScriptedBridge>,
) -> JobCoordinator {
    coordinator_with_config(EngineConfig::default(), devices, availability, direct, bridge)
}

fn coordinator_with_config(
    config: EngineConfig,
    devices: Vec<Device>,
    availability: BackendAvailability,
    direct: Arc<ScriptedExecutor>,
    bridge: Arc<ScriptedBridge>,
) -> JobCoordinator {
    JobCoordinator::new(
        config,
        Arc::new(StaticInventory::new(devices)),
        Arc::new(FixedProber { availability }),
        direct,
        bridge,
    )
}

const WAIT: Duration = Duration::from_secs(5);

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn test_simulation_fallback_when_no_backend_is_reachable() {
    let direct = Arc::new(ScriptedExecutor::new(HashMap::new()));
    let bridge = Arc::new(ScriptedBridge::new(BridgeScript::Unavailable));
    let coord = coordinator(
        lab_devices(),
        BackendAvailability::default(),
        direct.clone(),
        bridge.clone(),
    );

    let (job_id, _) = coord
        .submit(TaskRequest::new("connectivity-test"), TargetSelector::All, None)
        .await
        .unwrap();
    let job = await_terminal(&coord, job_id, WAIT).await.unwrap();

    assert_eq!(job.state, JobState::Succeeded);
    assert_eq!(job.backend, Some(BackendKind::Simulation));
    assert!(job.simulated);
    assert_eq!(job.results.len(), 3);
    assert!(job.results.iter().all(|r| r.simulated));

    // No real executor was touched.
    assert_eq!(direct.calls.load(Ordering::SeqCst), 0);
    assert_eq!(bridge.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_partial_job_with_device_timeout() {
    let mut outcomes = HashMap::new();
    outcomes.insert(
        "lab-router1".to_string(),
        DeviceResult::success("lab-router1", 120, "ok".to_string()),
    );
    outcomes.insert(
        "lab-switch1".to_string(),
        DeviceResult::timeout("lab-switch1", 5000),
    );
    let direct = Arc::new(ScriptedExecutor::new(outcomes));
    let bridge = Arc::new(ScriptedBridge::new(BridgeScript::Unavailable));

    let coord = coordinator(
        vec![
            device("lab-router1", "cisco_ios_router"),
            device("lab-switch1", "arista_switch"),
        ],
        BackendAvailability {
            bridge: false,
            direct_ssh: true,
        },
        direct,
        bridge,
    );

    let (job_id, _) = coord
        .submit(TaskRequest::new("connectivity-test"), TargetSelector::All, None)
        .await
        .unwrap();
    let job = await_terminal(&coord, job_id, WAIT).await.unwrap();

    assert_eq!(job.state, JobState::Partial);
    assert_eq!(job.backend, Some(BackendKind::DirectSsh));
    assert!(!job.simulated);

    let slow = job
        .results
        .iter()
        .find(|r| r.device_id == "lab-switch1")
        .unwrap();
    assert_eq!(slow.outcome, Outcome::Timeout);
    assert_eq!(slow.error_kind, Some(ErrorKind::Timeout));
    assert_eq!(slow.duration_ms, 5000);
}

#[tokio::test]
async fn test_zero_matching_devices_fails_without_execution() {
    let direct = Arc::new(ScriptedExecutor::new(HashMap::new()));
    let bridge = Arc::new(ScriptedBridge::new(BridgeScript::Unavailable));
    let coord = coordinator(
        lab_devices(),
        BackendAvailability {
            bridge: true,
            direct_ssh: true,
        },
        direct.clone(),
        bridge.clone(),
    );

    let (job_id, _) = coord
        .submit(
            TaskRequest::new("connectivity-test"),
            TargetSelector::Platform("loadbalancer".to_string()),
            None,
        )
        .await
        .unwrap();
    let job = await_terminal(&coord, job_id, WAIT).await.unwrap();

    assert_eq!(job.state, JobState::Failed);
    assert_eq!(job.error_kind, Some(ErrorKind::NoMatchingDevices));
    assert!(job.results.is_empty());
    assert_eq!(direct.calls.load(Ordering::SeqCst), 0);
    assert_eq!(bridge.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_degraded_bridge_parse_is_not_a_job_failure() {
    let results = vec![
        DeviceResult::success("lab-firewall1", 40, "lab-firewall1 | SUCCESS".to_string()),
        DeviceResult::success("lab-router1", 40, "lab-router1 | SUCCESS".to_string()),
        DeviceResult::failure(
            "lab-switch1",
            40,
            ErrorKind::ParseDegraded,
            "no per-device record in runtime output".to_string(),
        ),
    ];
    let direct = Arc::new(ScriptedExecutor::new(HashMap::new()));
    let bridge = Arc::new(ScriptedBridge::new(BridgeScript::Degraded(results)));
    let coord = coordinator(
        lab_devices(),
        BackendAvailability {
            bridge: true,
            direct_ssh: false,
        },
        direct,
        bridge,
    );

    let (job_id, _) = coord
        .submit(TaskRequest::new("system-report"), TargetSelector::All, None)
        .await
        .unwrap();
    let job = await_terminal(&coord, job_id, WAIT).await.unwrap();

    assert_eq!(job.state, JobState::Partial);
    assert_eq!(job.backend, Some(BackendKind::Bridge));
    assert_eq!(job.error_kind, Some(ErrorKind::ParseDegraded));
    assert_eq!(job.results.len(), 3);
}

#[tokio::test]
async fn test_bridge_failure_falls_back_to_direct_shell() {
    let direct = Arc::new(ScriptedExecutor::all_succeeding(&[
        "lab-router1",
        "lab-switch1",
        "lab-firewall1",
    ]));
    let bridge = Arc::new(ScriptedBridge::new(BridgeScript::Unavailable));
    let coord = coordinator(
        lab_devices(),
        BackendAvailability {
            bridge: true,
            direct_ssh: true,
        },
        direct.clone(),
        bridge.clone(),
    );

    let (job_id, _) = coord
        .submit(TaskRequest::new("connectivity-test"), TargetSelector::All, None)
        .await
        .unwrap();
    let job = await_terminal(&coord, job_id, WAIT).await.unwrap();

    assert_eq!(bridge.calls.load(Ordering::SeqCst), 1);
    assert_eq!(direct.calls.load(Ordering::SeqCst), 3);
    assert_eq!(job.state, JobState::Succeeded);
    // The record shows the backend that actually executed.
    assert_eq!(job.backend, Some(BackendKind::DirectSsh));
}

#[tokio::test]
async fn test_concurrency_bound_is_respected() {
    let ids = [
        "d1", "d2", "d3", "d4", "d5", "d6", "d7", "d8",
    ];
    let devices: Vec<Device> = ids.iter().map(|id| device(id, "cisco_ios_router")).collect();
    let direct = Arc::new(ScriptedExecutor::all_succeeding(&ids));

    let config = EngineConfig::default().with_max_concurrency(2);
    let coord = coordinator_with_config(
        config,
        devices,
        BackendAvailability {
            bridge: false,
            direct_ssh: true,
        },
        direct.clone(),
        Arc::new(ScriptedBridge::new(BridgeScript::Unavailable)),
    );

    let (job_id, _) = coord
        .submit(TaskRequest::new("connectivity-test"), TargetSelector::All, None)
        .await
        .unwrap();
    let job = await_terminal(&coord, job_id, WAIT).await.unwrap();

    assert_eq!(job.state, JobState::Succeeded);
    assert_eq!(direct.calls.load(Ordering::SeqCst), 8);
    assert!(
        direct.max_in_flight.load(Ordering::SeqCst) <= 2,
        "more than 2 executions were in flight"
    );
}

#[tokio::test]
async fn test_results_are_complete_and_sorted() {
    let direct = Arc::new(ScriptedExecutor::all_succeeding(&[
        "lab-router1",
        "lab-switch1",
        "lab-firewall1",
    ]));
    let coord = coordinator(
        lab_devices(),
        BackendAvailability {
            bridge: false,
            direct_ssh: true,
        },
        direct,
        Arc::new(ScriptedBridge::new(BridgeScript::Unavailable)),
    );

    let (job_id, _) = coord
        .submit(TaskRequest::new("connectivity-test"), TargetSelector::All, None)
        .await
        .unwrap();
    let job = await_terminal(&coord, job_id, WAIT).await.unwrap();

    let ids: Vec<&str> = job.results.iter().map(|r| r.device_id.as_str()).collect();
    assert_eq!(ids, vec!["lab-firewall1", "lab-router1", "lab-switch1"]);
}

#[tokio::test]
async fn test_terminal_job_records_are_immutable() {
    let direct = Arc::new(ScriptedExecutor::new(HashMap::new()));
    let coord = coordinator(
        lab_devices(),
        BackendAvailability::default(),
        direct,
        Arc::new(ScriptedBridge::new(BridgeScript::Unavailable)),
    );

    let (job_id, _) = coord
        .submit(TaskRequest::new("connectivity-test"), TargetSelector::All, None)
        .await
        .unwrap();
    let first = await_terminal(&coord, job_id, WAIT).await.unwrap();
    assert!(first.state.is_terminal());

    for _ in 0..5 {
        let again = coord.status(job_id).await.unwrap();
        assert_eq!(again.state, first.state);
        assert_eq!(again.ended_at, first.ended_at);
        assert_eq!(again.results.len(), first.results.len());
        for (a, b) in again.results.iter().zip(first.results.iter()) {
            assert_eq!(a.output, b.output);
            assert_eq!(a.duration_ms, b.duration_ms);
        }
    }
}

#[tokio::test]
async fn test_explicit_simulation_preference_overrides_policy() {
    let direct = Arc::new(ScriptedExecutor::new(HashMap::new()));
    let bridge = Arc::new(ScriptedBridge::new(BridgeScript::Ok(Vec::new())));
    let coord = coordinator(
        lab_devices(),
        BackendAvailability {
            bridge: true,
            direct_ssh: true,
        },
        direct.clone(),
        bridge.clone(),
    );

    let (job_id, _) = coord
        .submit(
            TaskRequest::new("connectivity-test"),
            TargetSelector::All,
            Some(BackendKind::Simulation),
        )
        .await
        .unwrap();
    let job = await_terminal(&coord, job_id, WAIT).await.unwrap();

    assert_eq!(job.backend, Some(BackendKind::Simulation));
    assert!(job.simulated);
    assert_eq!(direct.calls.load(Ordering::SeqCst), 0);
    assert_eq!(bridge.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unknown_task_is_rejected_at_submission() {
    let coord = coordinator(
        lab_devices(),
        BackendAvailability::default(),
        Arc::new(ScriptedExecutor::new(HashMap::new())),
        Arc::new(ScriptedBridge::new(BridgeScript::Unavailable)),
    );

    let err = coord
        .submit(TaskRequest::new("format-all-disks"), TargetSelector::All, None)
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::UnknownTask(_)));
}

#[tokio::test]
async fn test_custom_command_set_is_accepted() {
    let direct = Arc::new(ScriptedExecutor::all_succeeding(&["lab-router1"]));
    let coord = coordinator(
        vec![device("lab-router1", "cisco_ios_router")],
        BackendAvailability {
            bridge: false,
            direct_ssh: true,
        },
        direct,
        Arc::new(ScriptedBridge::new(BridgeScript::Unavailable)),
    );

    let task = TaskRequest::new("custom").with_param("commands", "show version");
    let (job_id, _) = coord.submit(task, TargetSelector::All, None).await.unwrap();
    let job = await_terminal(&coord, job_id, WAIT).await.unwrap();
    assert_eq!(job.state, JobState::Succeeded);
}
