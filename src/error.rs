use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Machine-readable classification carried on per-device results and on
/// failed job records. Per-device kinds never abort a job; `NoMatchingDevices`
/// and `InternalDefect` are job-level and surface before any execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    AuthenticationFailure,
    ConnectivityFailure,
    CommandRejected,
    Timeout,
    BridgeUnavailable,
    ParseDegraded,
    NoMatchingDevices,
    InternalDefect,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::AuthenticationFailure => "authentication_failure",
            ErrorKind::ConnectivityFailure => "connectivity_failure",
            ErrorKind::CommandRejected => "command_rejected",
            ErrorKind::Timeout => "timeout",
            ErrorKind::BridgeUnavailable => "bridge_unavailable",
            ErrorKind::ParseDegraded => "parse_degraded",
            ErrorKind::NoMatchingDevices => "no_matching_devices",
            ErrorKind::InternalDefect => "internal_defect",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("no devices matched the target selector")]
    NoMatchingDevices,

    #[error("job not found: {0}")]
    JobNotFound(Uuid),

    #[error("job store is at capacity")]
    StoreFull,

    #[error("bridge runtime unavailable: {0}")]
    BridgeUnavailable(String),

    #[error("inventory error: {0}")]
    Inventory(String),

    #[error("unknown task and no custom command set: {0}")]
    UnknownTask(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_yaml::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, DispatchError>;
