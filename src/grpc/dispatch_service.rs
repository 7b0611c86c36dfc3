use tonic::{Request, Response, Status};
use uuid::Uuid;

use crate::coordinator::JobCoordinator;
use crate::error::DispatchError;
use crate::inventory::TargetSelector;
use crate::job::{Job, JobState, TaskRequest};
use crate::probe::BackendKind;
use crate::proto::dispatch_service_server::DispatchService;
use crate::proto::{
    submit_task_request, Backend as ProtoBackend, DeviceResult as ProtoDeviceResult,
    GetJobStatusRequest, GetJobStatusResponse, JobState as ProtoJobState, JobSummary,
    ListJobsRequest, ListJobsResponse, SubmitTaskRequest, SubmitTaskResponse,
};

/// Client-facing dispatch API.
pub struct DispatchApi {
    coordinator: JobCoordinator,
}

impl DispatchApi {
    pub fn new(coordinator: JobCoordinator) -> Self {
        Self { coordinator }
    }
}

#[tonic::async_trait]
impl DispatchService for DispatchApi {
    async fn submit_task(
        &self,
        request: Request<SubmitTaskRequest>,
    ) -> Result<Response<SubmitTaskResponse>, Status> {
        let req = request.into_inner();

        if req.task_name.trim().is_empty() {
            return Err(Status::invalid_argument("task name cannot be empty"));
        }

        let selector = match req.selector {
            Some(submit_task_request::Selector::All(_)) | None => TargetSelector::All,
            Some(submit_task_request::Selector::DeviceIds(list)) => {
                if list.ids.is_empty() {
                    return Err(Status::invalid_argument("device id list cannot be empty"));
                }
                TargetSelector::Ids(list.ids)
            }
            Some(submit_task_request::Selector::PlatformFilter(filter)) => {
                TargetSelector::Platform(filter)
            }
        };

        let preference = proto_to_backend(req.backend_preference);

        let mut task = TaskRequest::new(&req.task_name);
        task.params = req.params.into_iter().collect();

        match self.coordinator.submit(task, selector, preference).await {
            Ok((job_id, created_at)) => {
                Ok(Response::new(SubmitTaskResponse {
                    job_id: job_id.to_string(),
                    created_at_ms: created_at.timestamp_millis(),
                }))
            }
            Err(DispatchError::UnknownTask(name)) => Err(Status::invalid_argument(format!(
                "unknown task '{}' and no custom commands supplied",
                name
            ))),
            Err(DispatchError::StoreFull) => {
                Err(Status::resource_exhausted("job store is at capacity"))
            }
            Err(e) => Err(Status::internal(e.to_string())),
        }
    }

    async fn get_job_status(
        &self,
        request: Request<GetJobStatusRequest>,
    ) -> Result<Response<GetJobStatusResponse>, Status> {
        let req = request.into_inner();
        let job_id = Uuid::parse_str(&req.job_id)
            .map_err(|_| Status::invalid_argument("invalid job id"))?;

        let job = match self.coordinator.status(job_id).await {
            Ok(job) => job,
            Err(DispatchError::JobNotFound(_)) => return Err(Status::not_found("job not found")),
            Err(e) => return Err(Status::internal(e.to_string())),
        };

        Ok(Response::new(job_to_status(&job)))
    }

    async fn list_jobs(
        &self,
        request: Request<ListJobsRequest>,
    ) -> Result<Response<ListJobsResponse>, Status> {
        let req = request.into_inner();

        let page_size = if req.page_size == 0 {
            100
        } else {
            req.page_size.min(1000)
        } as usize;

        // Offset-based token: the token is the starting index.
        let offset: usize = if req.page_token.is_empty() {
            0
        } else {
            req.page_token
                .parse()
                .map_err(|_| Status::invalid_argument("invalid page token"))?
        };

        let all_jobs = self.coordinator.jobs().await;
        let total_count = all_jobs.len() as u32;

        let jobs: Vec<JobSummary> = all_jobs
            .iter()
            .skip(offset)
            .take(page_size)
            .map(|job| JobSummary {
                job_id: job.id.to_string(),
                task_name: job.task.name.clone(),
                state: state_to_proto(job.state) as i32,
                backend_used: backend_to_proto(job.backend) as i32,
                created_at_ms: job.created_at.timestamp_millis(),
                device_count: job.results.len() as u32,
            })
            .collect();

        let next_offset = offset + jobs.len();
        let next_page_token = if next_offset < total_count as usize {
            next_offset.to_string()
        } else {
            String::new()
        };

        Ok(Response::new(ListJobsResponse {
            jobs,
            next_page_token,
            total_count,
        }))
    }
}

fn job_to_status(job: &Job) -> GetJobStatusResponse {
    GetJobStatusResponse {
        job_id: job.id.to_string(),
        state: state_to_proto(job.state) as i32,
        backend_used: backend_to_proto(job.backend) as i32,
        created_at_ms: job.created_at.timestamp_millis(),
        started_at_ms: job.started_at.map(|dt| dt.timestamp_millis()),
        ended_at_ms: job.ended_at.map(|dt| dt.timestamp_millis()),
        per_device_results: job
            .results
            .iter()
            .map(|r| ProtoDeviceResult {
                device_id: r.device_id.clone(),
                outcome: r.outcome.to_string(),
                duration_ms: r.duration_ms as i64,
                output: r.output.clone(),
                error_kind: r.error_kind.map(|k| k.as_str().to_string()).unwrap_or_default(),
                simulated: r.simulated,
            })
            .collect(),
        error_kind: job
            .error_kind
            .map(|k| k.as_str().to_string())
            .unwrap_or_default(),
        simulated: job.simulated,
    }
}

fn state_to_proto(state: JobState) -> ProtoJobState {
    match state {
        JobState::Pending => ProtoJobState::Pending,
        JobState::Running => ProtoJobState::Running,
        JobState::Succeeded => ProtoJobState::Succeeded,
        JobState::Partial => ProtoJobState::Partial,
        JobState::Failed => ProtoJobState::Failed,
    }
}

fn backend_to_proto(backend: Option<BackendKind>) -> ProtoBackend {
    match backend {
        Some(BackendKind::Bridge) => ProtoBackend::Bridge,
        Some(BackendKind::DirectSsh) => ProtoBackend::DirectSsh,
        Some(BackendKind::Simulation) => ProtoBackend::Simulation,
        None => ProtoBackend::Unspecified,
    }
}

fn proto_to_backend(value: i32) -> Option<BackendKind> {
    match ProtoBackend::try_from(value) {
        Ok(ProtoBackend::Bridge) => Some(BackendKind::Bridge),
        Ok(ProtoBackend::DirectSsh) => Some(BackendKind::DirectSsh),
        Ok(ProtoBackend::Simulation) => Some(BackendKind::Simulation),
        _ => None,
    }
}
