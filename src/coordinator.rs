//! Job Coordinator: job identity, backend selection, fan-out, job state.
//!
//! The coordinator is the single writer of job state. Executors return
//! results; they never touch the job record. It is an explicit instance with
//! injected collaborators, so tests construct isolated coordinators with
//! mock executors and probers.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{RwLock, Semaphore};
use tokio::task::JoinSet;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::{DispatchError, ErrorKind, Result};
use crate::executor::{
    BatchExecutor, BridgeExecutor, DeviceExecutor, SimulationEngine, SshExecutor,
};
use crate::inventory::resolver::{flatten, target_count};
use crate::inventory::{InventorySource, TargetGroup, TargetSelector};
use crate::job::{DeviceResult, Job, JobState, JobStore, TaskRequest};
use crate::normalize;
use crate::probe::{
    select_backend, BackendAvailability, BackendKind, CapabilityProber, NetworkProber,
};

struct Inner {
    config: EngineConfig,
    inventory: Arc<dyn InventorySource>,
    prober: Arc<dyn CapabilityProber>,
    direct: Arc<dyn DeviceExecutor>,
    bridge: Arc<dyn BatchExecutor>,
    simulation: SimulationEngine,
    store: RwLock<JobStore>,
}

/// Cheaply cloneable handle; all clones share one job store.
#[derive(Clone)]
pub struct JobCoordinator {
    inner: Arc<Inner>,
}

impl JobCoordinator {
    /// Coordinator with injected collaborators.
    pub fn new(
        config: EngineConfig,
        inventory: Arc<dyn InventorySource>,
        prober: Arc<dyn CapabilityProber>,
        direct: Arc<dyn DeviceExecutor>,
        bridge: Arc<dyn BatchExecutor>,
    ) -> Self {
        let max_jobs = config.max_jobs;
        Self {
            inner: Arc::new(Inner {
                config,
                inventory,
                prober,
                direct,
                bridge,
                simulation: SimulationEngine::new(),
                store: RwLock::new(JobStore::with_capacity(max_jobs)),
            }),
        }
    }

    /// Coordinator wired with the real backends.
    pub fn with_defaults(config: EngineConfig, inventory: Arc<dyn InventorySource>) -> Self {
        let prober = Arc::new(NetworkProber::new(
            config.bridge.clone(),
            config.probe_timeout,
        ));
        let direct = Arc::new(SshExecutor::new(
            config.ssh.clone(),
            config.credentials.clone(),
        ));
        let bridge = Arc::new(BridgeExecutor::new(config.bridge.clone()));
        Self::new(config, inventory, prober, direct, bridge)
    }

    /// Submit a task for asynchronous execution. Validates the request,
    /// records the pending job, and returns its identity immediately; the
    /// job is then polled via [`status`](Self::status).
    pub async fn submit(
        &self,
        task: TaskRequest,
        selector: TargetSelector,
        preference: Option<BackendKind>,
    ) -> Result<(Uuid, DateTime<Utc>)> {
        let commands = task
            .command_lines()
            .ok_or_else(|| DispatchError::UnknownTask(task.name.clone()))?;

        let job = Job::new(task, selector, preference);
        let job_id = job.id;
        let created_at = job.created_at;

        if !self.inner.store.write().await.insert(job) {
            return Err(DispatchError::StoreFull);
        }
        tracing::info!(job_id = %job_id, "job submitted");

        let coordinator = self.clone();
        tokio::spawn(async move {
            coordinator.run_job(job_id, commands).await;
        });

        Ok((job_id, created_at))
    }

    /// Snapshot of one job record. Terminal records never change, so
    /// repeated queries return identical records.
    pub async fn status(&self, id: Uuid) -> Result<Job> {
        self.inner
            .store
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(DispatchError::JobNotFound(id))
    }

    /// All job records in chronological order.
    pub async fn jobs(&self) -> Vec<Job> {
        self.inner
            .store
            .read()
            .await
            .all_jobs()
            .into_iter()
            .cloned()
            .collect()
    }

    async fn run_job(&self, job_id: Uuid, commands: Vec<String>) {
        let (task, selector, preference) = match self.status(job_id).await {
            Ok(job) => (job.task, job.selector, job.preference),
            Err(_) => return,
        };

        // A fresh snapshot per job; the inventory store owns the data.
        let snapshot = match self.inner.inventory.snapshot() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::error!(job_id = %job_id, error = %e, "snapshot read failed");
                self.fail(job_id, ErrorKind::InternalDefect).await;
                return;
            }
        };

        let groups = crate::inventory::resolve(&snapshot, &selector);
        if groups.is_empty() {
            tracing::warn!(job_id = %job_id, selector = %selector, "no matching devices");
            self.fail(job_id, ErrorKind::NoMatchingDevices).await;
            return;
        }

        // Availability is ephemeral: recomputed here, never carried over
        // from a previous job.
        let availability = self.inner.prober.probe(&groups).await;
        let backend = select_backend(availability, preference);

        let started_at = Utc::now();
        {
            let mut store = self.inner.store.write().await;
            store.append_log(
                &job_id,
                format!(
                    "probed availability: bridge={} direct_ssh={}",
                    availability.bridge, availability.direct_ssh
                ),
            );
            store.mark_running(&job_id, backend, started_at);
        }
        tracing::info!(job_id = %job_id, backend = %backend, targets = target_count(&groups), "job running");

        let (raw, parse_degraded, backend_used) = match self
            .dispatch(backend, job_id, &task, &commands, &groups, availability, started_at)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(job_id = %job_id, error = %e, "dispatch failed");
                self.fail(job_id, ErrorKind::InternalDefect).await;
                return;
            }
        };

        let targets = flatten(&groups);
        let results = normalize::normalize(&targets, raw);
        let state = normalize::terminal_state(&results);
        let simulated = backend_used == BackendKind::Simulation;
        let error_kind = parse_degraded.then_some(ErrorKind::ParseDegraded);

        self.inner.store.write().await.finalize(
            &job_id,
            state,
            results,
            error_kind,
            simulated,
            Utc::now(),
        );
        tracing::info!(job_id = %job_id, state = %state, backend = %backend_used, "job finished");
    }

    /// Run the batch on the chosen backend. Returns the raw results, the
    /// parse-degradation flag, and the backend that actually executed, which
    /// differs from the chosen one when the bridge turns out to be
    /// unavailable mid-job and the work falls through the preference order.
    #[allow(clippy::too_many_arguments)]
    async fn dispatch(
        &self,
        backend: BackendKind,
        job_id: Uuid,
        task: &TaskRequest,
        commands: &[String],
        groups: &[TargetGroup],
        availability: BackendAvailability,
        started_at: DateTime<Utc>,
    ) -> Result<(Vec<DeviceResult>, bool, BackendKind)> {
        if backend == BackendKind::Bridge {
            match self
                .inner
                .bridge
                .execute_batch(task, commands, groups, self.inner.config.bridge_timeout)
                .await
            {
                Ok(batch) => return Ok((batch.results, batch.parse_degraded, BackendKind::Bridge)),
                Err(DispatchError::BridgeUnavailable(reason)) => {
                    // Not a job failure: fall through the preference order
                    // with the bridge crossed off.
                    tracing::warn!(job_id = %job_id, reason = %reason, "bridge fell over, falling back");
                    let degraded = BackendAvailability {
                        bridge: false,
                        direct_ssh: availability.direct_ssh,
                    };
                    let fallback = select_backend(degraded, None);
                    {
                        let mut store = self.inner.store.write().await;
                        store.append_log(&job_id, format!("bridge unavailable: {}", reason));
                        store.mark_running(&job_id, fallback, started_at);
                    }
                    return self.dispatch_local(fallback, job_id, task, commands, groups).await;
                }
                Err(e) => return Err(e),
            }
        }
        self.dispatch_local(backend, job_id, task, commands, groups).await
    }

    /// Dispatch to the in-process backends (direct shell or simulation).
    async fn dispatch_local(
        &self,
        backend: BackendKind,
        job_id: Uuid,
        task: &TaskRequest,
        commands: &[String],
        groups: &[TargetGroup],
    ) -> Result<(Vec<DeviceResult>, bool, BackendKind)> {
        match backend {
            BackendKind::DirectSsh => {
                let results = self.run_direct(groups, commands).await;
                Ok((results, false, BackendKind::DirectSsh))
            }
            _ => {
                let results = self.inner.simulation.execute(task, groups, job_id)?;
                Ok((results, false, BackendKind::Simulation))
            }
        }
    }

    /// Per-device fan-out with bounded concurrency and a job-level
    /// wall-clock cap. Devices are independent units of work: a failure or
    /// timeout on one neither blocks nor cancels its siblings.
    async fn run_direct(&self, groups: &[TargetGroup], commands: &[String]) -> Vec<DeviceResult> {
        let devices = flatten(groups);
        let budget = self.inner.config.job_timeout(devices.len());
        let deadline = tokio::time::Instant::now() + budget;

        let semaphore = Arc::new(Semaphore::new(self.inner.config.max_concurrency));
        let shared_commands: Arc<Vec<String>> = Arc::new(commands.to_vec());
        let mut tasks = JoinSet::new();

        for device in devices {
            let semaphore = Arc::clone(&semaphore);
            let executor = Arc::clone(&self.inner.direct);
            let commands = Arc::clone(&shared_commands);
            let timeout = self.inner.config.device_timeout;
            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("semaphore is never closed");
                executor.execute(&device, &commands, timeout).await
            });
        }

        let mut results = Vec::new();
        loop {
            match tokio::time::timeout_at(deadline, tasks.join_next()).await {
                Ok(Some(Ok(result))) => results.push(result),
                Ok(Some(Err(e))) => {
                    // A panicked worker; the normalizer fills the gap so the
                    // device is not silently dropped.
                    tracing::error!(error = %e, "device worker crashed");
                }
                Ok(None) => break,
                Err(_) => {
                    tracing::warn!(?budget, "job budget exhausted, cancelling in-flight work");
                    tasks.abort_all();
                    break;
                }
            }
        }
        results
    }

    async fn fail(&self, job_id: Uuid, kind: ErrorKind) {
        self.inner.store.write().await.finalize(
            &job_id,
            JobState::Failed,
            Vec::new(),
            Some(kind),
            false,
            Utc::now(),
        );
    }
}

/// Poll a job until it reaches a terminal state or `wait` elapses. A small
/// convenience for embedders and tests; the gRPC surface polls remotely
/// instead.
pub async fn await_terminal(
    coordinator: &JobCoordinator,
    job_id: Uuid,
    wait: Duration,
) -> Result<Job> {
    let deadline = tokio::time::Instant::now() + wait;
    loop {
        let job = coordinator.status(job_id).await?;
        if job.state.is_terminal() {
            return Ok(job);
        }
        if tokio::time::Instant::now() >= deadline {
            return Ok(job);
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
