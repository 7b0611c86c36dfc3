//! Result Normalizer: one schema out, regardless of which backend ran.
//!
//! Completion order is nondeterministic, so results are keyed back to the
//! resolved target list and sorted by device id before they reach the job
//! record. Every targeted device appears exactly once: duplicates beyond the
//! first recorded attempt are dropped, and a device with no result (job
//! budget exhausted, worker panicked) is marked as a timeout rather than
//! silently omitted.

use std::collections::HashMap;

use crate::inventory::Device;
use crate::job::{DeviceResult, JobState, Outcome};

/// Map raw backend output onto the resolved target list.
///
/// `targets` must already be in normalizer order (ascending id), which is
/// what [`crate::inventory::resolver::flatten`] produces. The `simulated`
/// marker travels inside each result and is never stripped here.
pub fn normalize(targets: &[Device], raw: Vec<DeviceResult>) -> Vec<DeviceResult> {
    let mut by_id: HashMap<String, DeviceResult> = HashMap::new();
    for result in raw {
        by_id.entry(result.device_id.clone()).or_insert(result);
    }

    targets
        .iter()
        .map(|device| {
            by_id
                .remove(&device.id)
                .unwrap_or_else(|| DeviceResult::timeout(&device.id, 0))
        })
        .collect()
}

/// Terminal-state rule over a complete result set: all succeeded, some
/// succeeded, or none did.
pub fn terminal_state(results: &[DeviceResult]) -> JobState {
    let successes = results
        .iter()
        .filter(|r| r.outcome == Outcome::Success)
        .count();
    if results.is_empty() || successes == 0 {
        JobState::Failed
    } else if successes == results.len() {
        JobState::Succeeded
    } else {
        JobState::Partial
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn device(id: &str) -> Device {
        Device {
            id: id.to_string(),
            address: "10.0.0.1".to_string(),
            port: 22,
            platform: "cisco_ios_router".to_string(),
            credential_ref: "default".to_string(),
            connection_mode: Default::default(),
        }
    }

    #[test]
    fn fills_missing_devices_as_timeout() {
        let targets = vec![device("a"), device("b")];
        let raw = vec![DeviceResult::success("a", 5, "ok".to_string())];

        let normalized = normalize(&targets, raw);
        assert_eq!(normalized.len(), 2);
        assert_eq!(normalized[1].device_id, "b");
        assert_eq!(normalized[1].outcome, Outcome::Timeout);
        assert_eq!(normalized[1].error_kind, Some(ErrorKind::Timeout));
    }

    #[test]
    fn drops_duplicates_and_unknown_devices() {
        let targets = vec![device("a")];
        let raw = vec![
            DeviceResult::success("a", 5, "first".to_string()),
            DeviceResult::failure("a", 9, ErrorKind::CommandRejected, "second".to_string()),
            DeviceResult::success("ghost", 1, "not targeted".to_string()),
        ];

        let normalized = normalize(&targets, raw);
        assert_eq!(normalized.len(), 1);
        assert_eq!(normalized[0].output, "first");
    }

    #[test]
    fn preserves_simulated_marker() {
        let targets = vec![device("a")];
        let mut result = DeviceResult::success("a", 5, "ok".to_string());
        result.simulated = true;

        let normalized = normalize(&targets, vec![result]);
        assert!(normalized[0].simulated);
    }

    #[test]
    fn terminal_state_rules() {
        let ok = DeviceResult::success("a", 1, String::new());
        let bad = DeviceResult::failure("b", 1, ErrorKind::ConnectivityFailure, String::new());
        let late = DeviceResult::timeout("c", 1);

        assert_eq!(terminal_state(&[ok.clone()]), JobState::Succeeded);
        assert_eq!(terminal_state(&[ok.clone(), bad.clone()]), JobState::Partial);
        assert_eq!(terminal_state(&[ok, late.clone()]), JobState::Partial);
        assert_eq!(terminal_state(&[bad, late]), JobState::Failed);
        assert_eq!(terminal_state(&[]), JobState::Failed);
    }
}
