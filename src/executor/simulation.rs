//! Deterministic simulation backend.
//!
//! Used only when no real backend is reachable. Results are a pure function
//! of job id and device id: the per-device seed feeds a `StdRng`, never a
//! wall clock, so test suites can assert exact output. Every result carries
//! the `simulated` marker and the normalizer never drops it.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

use crate::error::Result;
use crate::inventory::resolver::flatten;
use crate::inventory::TargetGroup;
use crate::job::{DeviceResult, Outcome, TaskRequest};

/// FNV-1a over the job and device identity; stable across runs and
/// platforms.
fn device_seed(job_id: Uuid, device_id: &str) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    let mut hash = OFFSET;
    for byte in job_id.as_bytes().iter().chain(device_id.as_bytes()) {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

#[derive(Debug, Default)]
pub struct SimulationEngine;

impl SimulationEngine {
    pub fn new() -> Self {
        Self
    }

    /// Produce one synthetic result per targeted device.
    pub fn execute(
        &self,
        task: &TaskRequest,
        groups: &[TargetGroup],
        job_id: Uuid,
    ) -> Result<Vec<DeviceResult>> {
        let devices = flatten(groups);
        let results = devices
            .iter()
            .map(|device| {
                let mut rng = StdRng::seed_from_u64(device_seed(job_id, &device.id));
                let duration_ms: u64 = rng.random_range(40..900);

                let mut output = String::new();
                output.push_str(&format!(
                    "=== SIMULATED {} REPORT ===\n",
                    task.name.to_ascii_uppercase()
                ));
                output.push_str(&format!("device: {}\n", device.id));
                output.push_str(&format!("platform: {}\n", device.platform));
                output.push_str(&format!(
                    "cpu: {}%  memory: {}%  temperature: {}C\n",
                    rng.random_range(20..60),
                    rng.random_range(40..70),
                    rng.random_range(35..55),
                ));
                for port in 1..=4u8 {
                    let up = rng.random_range(0..10) > 1;
                    output.push_str(&format!(
                        "GigabitEthernet0/{}: {}\n",
                        port,
                        if up { "up/up" } else { "down/down" }
                    ));
                }
                output.push_str("all metrics within normal parameters\n");

                DeviceResult {
                    device_id: device.id.clone(),
                    outcome: Outcome::Success,
                    duration_ms,
                    output,
                    error_kind: None,
                    simulated: true,
                }
            })
            .collect();
        Ok(results)
    }
}
