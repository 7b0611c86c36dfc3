use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ErrorKind;
use crate::inventory::TargetSelector;
use crate::probe::BackendKind;

/// Job lifecycle: `Pending -> Running -> {Succeeded, Partial, Failed}`.
/// Terminal states are final; the record is write-once after reaching one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    Pending,
    Running,
    Succeeded,
    Partial,
    Failed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Succeeded | JobState::Partial | JobState::Failed)
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobState::Pending => write!(f, "pending"),
            JobState::Running => write!(f, "running"),
            JobState::Succeeded => write!(f, "succeeded"),
            JobState::Partial => write!(f, "partial"),
            JobState::Failed => write!(f, "failed"),
        }
    }
}

/// Per-device outcome. `Timeout` is distinct from `Failure` so callers can
/// tell "might still be applying" from "rejected".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Success,
    Failure,
    Timeout,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Success => write!(f, "success"),
            Outcome::Failure => write!(f, "failure"),
            Outcome::Timeout => write!(f, "timeout"),
        }
    }
}

/// Result of running the task against one device. Produced by exactly one
/// executor per device per job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceResult {
    pub device_id: String,
    pub outcome: Outcome,
    pub duration_ms: u64,
    pub output: String,
    pub error_kind: Option<ErrorKind>,
    pub simulated: bool,
}

impl DeviceResult {
    pub fn success(device_id: &str, duration_ms: u64, output: String) -> Self {
        Self {
            device_id: device_id.to_string(),
            outcome: Outcome::Success,
            duration_ms,
            output,
            error_kind: None,
            simulated: false,
        }
    }

    pub fn failure(device_id: &str, duration_ms: u64, kind: ErrorKind, output: String) -> Self {
        Self {
            device_id: device_id.to_string(),
            outcome: Outcome::Failure,
            duration_ms,
            output,
            error_kind: Some(kind),
            simulated: false,
        }
    }

    pub fn timeout(device_id: &str, duration_ms: u64) -> Self {
        Self {
            device_id: device_id.to_string(),
            outcome: Outcome::Timeout,
            duration_ms,
            output: "execution timed out; the device may still be applying".to_string(),
            error_kind: Some(ErrorKind::Timeout),
            simulated: false,
        }
    }
}

/// The requested task: a name plus free-form parameters.
///
/// Task names resolve to built-in command sets; a `commands` parameter
/// (newline-separated) supplies a custom set instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRequest {
    pub name: String,
    pub params: BTreeMap<String, String>,
}

impl TaskRequest {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, key: &str, value: &str) -> Self {
        self.params.insert(key.to_string(), value.to_string());
        self
    }

    /// Command set executed on each device. `None` means the task name is
    /// unknown and no custom commands were supplied.
    pub fn command_lines(&self) -> Option<Vec<String>> {
        if let Some(custom) = self.params.get("commands") {
            let lines: Vec<String> = custom
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect();
            if !lines.is_empty() {
                return Some(lines);
            }
        }
        match self.name.as_str() {
            "connectivity-test" => Some(vec![
                "echo connection-ok $(hostname)".to_string(),
                "uptime".to_string(),
            ]),
            "system-report" => Some(vec![
                "uname -a".to_string(),
                "uptime".to_string(),
                "df -h".to_string(),
                "free -h".to_string(),
                "ip addr show".to_string(),
            ]),
            "config-backup" => Some(vec![
                "hostname".to_string(),
                "cat /etc/hostname".to_string(),
                "ip addr show".to_string(),
                "ss -tuln".to_string(),
            ]),
            _ => None,
        }
    }
}

/// A dispatch job. Created on submission, mutated only by the coordinator,
/// immutable once terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub task: TaskRequest,
    pub selector: TargetSelector,
    /// Explicit backend preference from the caller, if any.
    pub preference: Option<BackendKind>,
    pub backend: Option<BackendKind>,
    pub state: JobState,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub results: Vec<DeviceResult>,
    /// Job-level classification: the failure cause when the job failed
    /// before per-device execution, or a degradation marker when bridge
    /// output could not be structurally parsed.
    pub error_kind: Option<ErrorKind>,
    pub simulated: bool,
    /// Aggregate audit log of coordinator decisions for this job.
    pub log: Vec<String>,
}

impl Job {
    pub fn new(
        task: TaskRequest,
        selector: TargetSelector,
        preference: Option<BackendKind>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            task,
            selector,
            preference,
            backend: None,
            state: JobState::Pending,
            created_at: Utc::now(),
            started_at: None,
            ended_at: None,
            results: Vec::new(),
            error_kind: None,
            simulated: false,
            log: Vec::new(),
        }
    }
}

const DEFAULT_MAX_JOBS: usize = 10_000;

/// In-memory store of job records. The coordinator is the only writer;
/// terminal records are never modified again.
#[derive(Debug)]
pub struct JobStore {
    jobs: HashMap<Uuid, Job>,
    max_jobs: usize,
}

impl Default for JobStore {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MAX_JOBS)
    }
}

impl JobStore {
    pub fn with_capacity(max_jobs: usize) -> Self {
        Self {
            jobs: HashMap::new(),
            max_jobs,
        }
    }

    /// Insert a new job. Returns false when the store is at capacity.
    pub fn insert(&mut self, job: Job) -> bool {
        if self.jobs.len() >= self.max_jobs {
            return false;
        }
        self.jobs.insert(job.id, job);
        true
    }

    pub fn get(&self, id: &Uuid) -> Option<&Job> {
        self.jobs.get(id)
    }

    /// Mark a pending job as running. A no-op on terminal records.
    pub fn mark_running(&mut self, id: &Uuid, backend: BackendKind, started_at: DateTime<Utc>) {
        if let Some(job) = self.jobs.get_mut(id) {
            if job.state.is_terminal() {
                return;
            }
            job.state = JobState::Running;
            job.backend = Some(backend);
            job.started_at = Some(started_at);
            job.log.push(format!("dispatching via {} backend", backend));
        }
    }

    /// Append a line to a job's aggregate log. A no-op on terminal records.
    pub fn append_log(&mut self, id: &Uuid, line: impl Into<String>) {
        if let Some(job) = self.jobs.get_mut(id) {
            if !job.state.is_terminal() {
                job.log.push(line.into());
            }
        }
    }

    /// Write the terminal record. A no-op if the job already reached a
    /// terminal state.
    #[allow(clippy::too_many_arguments)]
    pub fn finalize(
        &mut self,
        id: &Uuid,
        state: JobState,
        results: Vec<DeviceResult>,
        error_kind: Option<ErrorKind>,
        simulated: bool,
        ended_at: DateTime<Utc>,
    ) {
        if let Some(job) = self.jobs.get_mut(id) {
            if job.state.is_terminal() {
                return;
            }
            job.state = state;
            job.results = results;
            job.error_kind = error_kind;
            job.simulated = simulated;
            job.ended_at = Some(ended_at);
            job.log.push(match error_kind {
                Some(kind) => format!("job {} ({})", state, kind),
                None => format!("job {}", state),
            });
        }
    }

    /// All jobs sorted chronologically by creation time.
    pub fn all_jobs(&self) -> Vec<&Job> {
        let mut jobs: Vec<&Job> = self.jobs.values().collect();
        jobs.sort_by_key(|j| j.created_at);
        jobs
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.jobs.len() >= self.max_jobs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_job() -> Job {
        Job::new(TaskRequest::new("connectivity-test"), TargetSelector::All, None)
    }

    #[test]
    fn store_rejects_inserts_at_capacity() {
        let mut store = JobStore::with_capacity(1);
        assert!(store.insert(sample_job()));
        assert!(store.is_full());
        assert!(!store.insert(sample_job()));
    }

    #[test]
    fn terminal_jobs_are_write_once() {
        let mut store = JobStore::default();
        let job = sample_job();
        let id = job.id;
        store.insert(job);

        store.mark_running(&id, BackendKind::Simulation, Utc::now());
        store.finalize(&id, JobState::Succeeded, Vec::new(), None, true, Utc::now());

        // Further transitions must not take effect.
        store.mark_running(&id, BackendKind::DirectSsh, Utc::now());
        store.finalize(
            &id,
            JobState::Failed,
            Vec::new(),
            Some(ErrorKind::InternalDefect),
            false,
            Utc::now(),
        );

        let job = store.get(&id).unwrap();
        assert_eq!(job.state, JobState::Succeeded);
        assert_eq!(job.backend, Some(BackendKind::Simulation));
        assert!(job.error_kind.is_none());
    }

    #[test]
    fn custom_commands_override_catalog() {
        let task = TaskRequest::new("connectivity-test")
            .with_param("commands", "show version\nshow ip route\n");
        assert_eq!(
            task.command_lines(),
            Some(vec!["show version".to_string(), "show ip route".to_string()])
        );
    }

    #[test]
    fn unknown_task_without_commands_is_none() {
        assert!(TaskRequest::new("reboot-everything").command_lines().is_none());
    }
}
