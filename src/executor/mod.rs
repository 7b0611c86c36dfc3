//! Execution backends for dispatch jobs.
//!
//! Three strategies implement the work of running a command set against
//! targets:
//! - [`ssh::SshExecutor`]: one secure-shell session per device
//! - [`bridge::BridgeExecutor`]: a single delegated call to an external
//!   automation runtime covering a whole target-group batch
//! - [`simulation::SimulationEngine`]: deterministic synthetic results
//!
//! The coordinator depends on the [`DeviceExecutor`] and [`BatchExecutor`]
//! abstractions, not on the concrete backends, so tests can inject
//! instrumented replacements.

pub mod bridge;
pub mod encoding;
pub mod simulation;
pub mod ssh;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::inventory::{Device, TargetGroup};
use crate::job::{DeviceResult, TaskRequest};

pub use bridge::{BridgeBatch, BridgeExecutor};
pub use simulation::SimulationEngine;
pub use ssh::SshExecutor;

/// Runs one device's command set in isolation. A failure on one device must
/// never affect a sibling, so implementations hold no cross-device state.
#[async_trait]
pub trait DeviceExecutor: Send + Sync {
    /// Execute `commands` against `device`. Always returns a result; errors
    /// are recorded in the result's outcome and error kind, never raised.
    /// Exceeding `timeout` yields a `timeout` outcome, not `failure`.
    async fn execute(&self, device: &Device, commands: &[String], timeout: Duration)
        -> DeviceResult;
}

/// Runs a whole target-group batch through one delegated call. The runtime
/// behind the call manages its own fan-out, so only a batch-level timeout
/// applies.
#[async_trait]
pub trait BatchExecutor: Send + Sync {
    async fn execute_batch(
        &self,
        task: &TaskRequest,
        commands: &[String],
        groups: &[TargetGroup],
        timeout: Duration,
    ) -> Result<BridgeBatch>;
}
