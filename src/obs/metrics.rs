//! Counters for gate decisions and limiter housekeeping.

// self
use crate::obs::{DecisionOutcome, GateAction};

const DECISION_TOTAL: &str = "kv_gatekeeper_decision_total";
const WINDOWS_PRUNED_TOTAL: &str = "kv_gatekeeper_windows_pruned_total";

/// Counts one gate decision, splitting denials by reason code.
pub fn record_decision(action: GateAction, outcome: DecisionOutcome) {
	#[cfg(feature = "metrics")]
	{
		let (outcome, reason) = match outcome {
			DecisionOutcome::Denied(code) => ("denied", code),
			other => (other.as_str(), "none"),
		};

		metrics::counter!(
			DECISION_TOTAL,
			"action" => action.as_str(),
			"outcome" => outcome,
			"reason" => reason
		)
		.increment(1);
	}
	#[cfg(not(feature = "metrics"))]
	{
		let _ = (DECISION_TOTAL, action, outcome);
	}
}

/// Counts rate windows evicted by a prune pass.
pub fn record_windows_pruned(count: usize) {
	#[cfg(feature = "metrics")]
	{
		if count > 0 {
			metrics::counter!(WINDOWS_PRUNED_TOTAL).increment(count as u64);
		}
	}
	#[cfg(not(feature = "metrics"))]
	{
		let _ = (WINDOWS_PRUNED_TOTAL, count);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn recorders_accept_every_outcome() {
		for outcome in [
			DecisionOutcome::Permitted,
			DecisionOutcome::Denied("RateLimitExceeded"),
			DecisionOutcome::Failed,
		] {
			record_decision(GateAction::Metadata, outcome);
		}

		record_windows_pruned(0);
		record_windows_pruned(3);
	}
}
