use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use serde::Serialize;
use tonic::transport::Channel;
use tracing_subscriber::EnvFilter;

use netdispatch::config::EngineConfig;
use netdispatch::coordinator::JobCoordinator;
use netdispatch::grpc::GrpcServer;
use netdispatch::inventory::FileInventory;
use netdispatch::proto::dispatch_service_client::DispatchServiceClient;
use netdispatch::proto::{
    submit_task_request, Backend, DeviceIdList, GetJobStatusRequest, JobState, ListJobsRequest,
    SubmitTaskRequest,
};
use netdispatch::shutdown::install_shutdown_handler;

#[derive(Parser, Debug)]
#[command(name = "netdispatch")]
#[command(version)]
#[command(about = "Automation dispatch engine for network devices")]
#[command(propagate_version = true)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Start a netdispatch server
    Server(ServerArgs),

    /// Job management commands
    Job {
        #[command(flatten)]
        client: ClientArgs,

        #[command(subcommand)]
        command: JobCommands,
    },
}

// =============================================================================
// Server Arguments
// =============================================================================

#[derive(Parser, Debug)]
struct ServerArgs {
    /// Port to listen on for gRPC
    #[arg(long, default_value = "50061")]
    port: u16,

    /// Device inventory snapshot file (YAML)
    #[arg(long, default_value = "devices.yml")]
    devices: PathBuf,

    /// Maximum simultaneous per-device executions within one job
    #[arg(long, default_value = "5")]
    concurrency: usize,

    /// Per-device execution timeout in seconds
    #[arg(long, default_value = "30")]
    device_timeout: u64,

    /// Program fronting the delegated automation runtime
    #[arg(long)]
    bridge_program: Option<String>,
}

// =============================================================================
// Client Arguments (shared by job commands)
// =============================================================================

#[derive(Parser, Debug)]
struct ClientArgs {
    /// Server address
    #[arg(long, short = 'a', default_value = "http://127.0.0.1:50061")]
    addr: String,

    /// Output format
    #[arg(long, short = 'o', default_value = "table")]
    output: OutputFormat,
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

// =============================================================================
// Job Commands
// =============================================================================

#[derive(clap::Subcommand, Debug)]
enum JobCommands {
    /// Submit a task against a set of devices
    Submit {
        /// Task name (e.g. "connectivity-test", "system-report")
        task: String,

        /// Task parameters as key=value pairs
        #[arg(long, short = 'p')]
        param: Vec<String>,

        /// Target an explicit list of device ids (comma-separated)
        #[arg(long, conflicts_with = "platform")]
        ids: Option<String>,

        /// Target devices whose platform tag contains this filter
        #[arg(long)]
        platform: Option<String>,

        /// Explicit backend preference
        #[arg(long, value_enum)]
        backend: Option<BackendArg>,
    },
    /// Get status of a specific job
    Status {
        /// The job ID (UUID)
        job_id: String,
    },
    /// List all jobs
    List {
        /// Number of jobs per page (default: 100, max: 1000)
        #[arg(long, default_value = "100")]
        page_size: u32,

        /// Fetch all pages automatically
        #[arg(long)]
        all: bool,
    },
}

#[derive(Debug, Clone, ValueEnum)]
enum BackendArg {
    Bridge,
    DirectSsh,
    Simulation,
}

impl From<BackendArg> for Backend {
    fn from(value: BackendArg) -> Self {
        match value {
            BackendArg::Bridge => Backend::Bridge,
            BackendArg::DirectSsh => Backend::DirectSsh,
            BackendArg::Simulation => Backend::Simulation,
        }
    }
}

// =============================================================================
// JSON Output Types
// =============================================================================

#[derive(Serialize)]
struct JobSubmitOutput {
    job_id: String,
    created_at_ms: i64,
}

#[derive(Serialize)]
struct DeviceResultOutput {
    device_id: String,
    outcome: String,
    duration_ms: i64,
    error_kind: Option<String>,
    simulated: bool,
    output: String,
}

#[derive(Serialize)]
struct JobStatusOutput {
    job_id: String,
    state: String,
    backend_used: String,
    created_at_ms: i64,
    started_at_ms: Option<i64>,
    ended_at_ms: Option<i64>,
    error_kind: Option<String>,
    simulated: bool,
    per_device_results: Vec<DeviceResultOutput>,
}

#[derive(Serialize)]
struct JobListItem {
    job_id: String,
    task_name: String,
    state: String,
    backend_used: String,
    device_count: u32,
    created_at_ms: i64,
}

#[derive(Serialize)]
struct JobListOutput {
    jobs: Vec<JobListItem>,
    total_count: u32,
    has_more: bool,
}

// =============================================================================
// Helper Functions
// =============================================================================

fn state_to_string(state: i32) -> String {
    match JobState::try_from(state) {
        Ok(JobState::Pending) => "PENDING".to_string(),
        Ok(JobState::Running) => "RUNNING".to_string(),
        Ok(JobState::Succeeded) => "SUCCEEDED".to_string(),
        Ok(JobState::Partial) => "PARTIAL".to_string(),
        Ok(JobState::Failed) => "FAILED".to_string(),
        _ => "UNKNOWN".to_string(),
    }
}

fn backend_to_string(backend: i32) -> String {
    match Backend::try_from(backend) {
        Ok(Backend::Bridge) => "bridge".to_string(),
        Ok(Backend::DirectSsh) => "direct_ssh".to_string(),
        Ok(Backend::Simulation) => "simulation".to_string(),
        _ => "-".to_string(),
    }
}

fn parse_params(params: &[String]) -> Result<HashMap<String, String>, String> {
    let mut map = HashMap::new();
    for pair in params {
        match pair.split_once('=') {
            Some((key, value)) if !key.is_empty() => {
                map.insert(key.to_string(), value.to_string());
            }
            _ => return Err(format!("invalid parameter '{}', expected key=value", pair)),
        }
    }
    Ok(map)
}

async fn create_client(
    args: &ClientArgs,
) -> Result<DispatchServiceClient<Channel>, Box<dyn std::error::Error>> {
    let channel = Channel::from_shared(args.addr.clone())?.connect().await?;
    Ok(DispatchServiceClient::new(channel))
}

// =============================================================================
// Server Implementation
// =============================================================================

async fn run_server(args: ServerArgs) -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut config = EngineConfig::default()
        .with_max_concurrency(args.concurrency)
        .with_device_timeout(Duration::from_secs(args.device_timeout));
    if let Some(program) = args.bridge_program {
        config.bridge.program = program;
    }

    let listen_addr: SocketAddr = format!("0.0.0.0:{}", args.port).parse()?;
    let inventory = Arc::new(FileInventory::new(&args.devices));

    tracing::info!(
        listen_addr = %listen_addr,
        devices = %args.devices.display(),
        concurrency = config.max_concurrency,
        "starting netdispatch server"
    );

    let coordinator = JobCoordinator::with_defaults(config, inventory);
    let shutdown = install_shutdown_handler();
    GrpcServer::new(listen_addr, coordinator).run(shutdown).await?;

    Ok(())
}

// =============================================================================
// Client Command Handlers
// =============================================================================

async fn handle_job_submit(
    client: &mut DispatchServiceClient<Channel>,
    task: String,
    params: Vec<String>,
    ids: Option<String>,
    platform: Option<String>,
    backend: Option<BackendArg>,
    output_format: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let params = match parse_params(&params) {
        Ok(params) => params,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };

    let selector = if let Some(ids) = ids {
        submit_task_request::Selector::DeviceIds(DeviceIdList {
            ids: ids
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        })
    } else if let Some(platform) = platform {
        submit_task_request::Selector::PlatformFilter(platform)
    } else {
        submit_task_request::Selector::All(true)
    };

    let request = SubmitTaskRequest {
        task_name: task,
        params,
        selector: Some(selector),
        backend_preference: backend.map(Backend::from).unwrap_or(Backend::Unspecified) as i32,
    };

    match client.submit_task(request).await {
        Ok(response) => {
            let resp = response.into_inner();
            match output_format {
                OutputFormat::Json => {
                    let output = JobSubmitOutput {
                        job_id: resp.job_id,
                        created_at_ms: resp.created_at_ms,
                    };
                    println!("{}", serde_json::to_string_pretty(&output)?);
                }
                OutputFormat::Table => {
                    println!("Job submitted successfully!");
                    println!("Job ID: {}", resp.job_id);
                }
            }
            Ok(())
        }
        Err(status) => {
            eprintln!("Error: task submission failed: {}", status.message());
            std::process::exit(1);
        }
    }
}

async fn handle_job_status(
    client: &mut DispatchServiceClient<Channel>,
    job_id: String,
    output_format: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let response = client
        .get_job_status(GetJobStatusRequest { job_id })
        .await?
        .into_inner();

    match output_format {
        OutputFormat::Json => {
            let output = JobStatusOutput {
                job_id: response.job_id,
                state: state_to_string(response.state),
                backend_used: backend_to_string(response.backend_used),
                created_at_ms: response.created_at_ms,
                started_at_ms: response.started_at_ms,
                ended_at_ms: response.ended_at_ms,
                error_kind: (!response.error_kind.is_empty()).then_some(response.error_kind),
                simulated: response.simulated,
                per_device_results: response
                    .per_device_results
                    .into_iter()
                    .map(|r| DeviceResultOutput {
                        device_id: r.device_id,
                        outcome: r.outcome,
                        duration_ms: r.duration_ms,
                        error_kind: (!r.error_kind.is_empty()).then_some(r.error_kind),
                        simulated: r.simulated,
                        output: r.output,
                    })
                    .collect(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Table => {
            println!("Job ID:       {}", response.job_id);
            println!("State:        {}", state_to_string(response.state));
            println!("Backend:      {}", backend_to_string(response.backend_used));
            if response.simulated {
                println!("Simulated:    yes");
            }
            if !response.error_kind.is_empty() {
                println!("Error Kind:   {}", response.error_kind);
            }
            if !response.per_device_results.is_empty() {
                println!();
                println!(
                    "{:<20} {:<10} {:>12} {:<24}",
                    "DEVICE", "OUTCOME", "DURATION(MS)", "ERROR"
                );
                println!("{}", "-".repeat(70));
                for result in &response.per_device_results {
                    let error = if result.error_kind.is_empty() {
                        "-"
                    } else {
                        &result.error_kind
                    };
                    println!(
                        "{:<20} {:<10} {:>12} {:<24}",
                        result.device_id, result.outcome, result.duration_ms, error
                    );
                }
                for result in &response.per_device_results {
                    if !result.output.is_empty() {
                        println!();
                        println!("=== {} ===", result.device_id);
                        for line in result.output.lines() {
                            println!("  {}", line);
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

async fn handle_job_list(
    client: &mut DispatchServiceClient<Channel>,
    page_size: u32,
    all: bool,
    output_format: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut all_jobs: Vec<JobListItem> = Vec::new();
    let mut total_count = 0u32;
    let mut has_more = false;

    let mut page_token = String::new();
    loop {
        let response = client
            .list_jobs(ListJobsRequest {
                page_size,
                page_token: page_token.clone(),
            })
            .await?
            .into_inner();

        total_count = response.total_count;

        for job in response.jobs {
            all_jobs.push(JobListItem {
                job_id: job.job_id,
                task_name: job.task_name,
                state: state_to_string(job.state),
                backend_used: backend_to_string(job.backend_used),
                device_count: job.device_count,
                created_at_ms: job.created_at_ms,
            });
        }

        if response.next_page_token.is_empty() || !all {
            has_more = !response.next_page_token.is_empty();
            break;
        }
        page_token = response.next_page_token;
    }

    match output_format {
        OutputFormat::Json => {
            let output = JobListOutput {
                jobs: all_jobs,
                total_count,
                has_more,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Table => {
            if all_jobs.is_empty() {
                println!("No jobs found.");
            } else {
                println!(
                    "{:<38} {:<12} {:<12} {:>8} TASK",
                    "JOB ID", "STATE", "BACKEND", "DEVICES"
                );
                println!("{}", "-".repeat(90));

                for job in &all_jobs {
                    let task_display = if job.task_name.len() > 20 {
                        format!("{}...", &job.task_name[..17])
                    } else {
                        job.task_name.clone()
                    };
                    println!(
                        "{:<38} {:<12} {:<12} {:>8} {}",
                        job.job_id, job.state, job.backend_used, job.device_count, task_display
                    );
                }
                println!();
                println!("Showing {} of {} jobs", all_jobs.len(), total_count);
                if has_more {
                    println!("(Use --all to fetch all pages)");
                }
            }
        }
    }
    Ok(())
}

// =============================================================================
// Main Entry Point
// =============================================================================

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    match args.command {
        Commands::Server(server_args) => {
            run_server(server_args).await?;
        }
        Commands::Job { client, command } => {
            let mut grpc_client = create_client(&client).await?;

            match command {
                JobCommands::Submit {
                    task,
                    param,
                    ids,
                    platform,
                    backend,
                } => {
                    handle_job_submit(
                        &mut grpc_client,
                        task,
                        param,
                        ids,
                        platform,
                        backend,
                        &client.output,
                    )
                    .await?;
                }
                JobCommands::Status { job_id } => {
                    handle_job_status(&mut grpc_client, job_id, &client.output).await?;
                }
                JobCommands::List { page_size, all } => {
                    handle_job_list(&mut grpc_client, page_size, all, &client.output).await?;
                }
            }
        }
    }

    Ok(())
}
