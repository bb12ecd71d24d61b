//! Optional observability helpers for the admission pipeline.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `kv_gatekeeper.gate` with the `action` and
//!   `stage` fields, plus debug events for every denial.
//! - Enable `metrics` to increment the `kv_gatekeeper_decision_total` counter for every
//!   decision (labels `action` and `outcome` plus the denial `reason`), and the
//!   `kv_gatekeeper_windows_pruned_total` counter for evicted rate windows.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::{_prelude::*, authorize::Operation, error::Denial};

/// Gatekeeper entry points observed by spans and metrics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GateAction {
	/// Strict create.
	Create,
	/// Create-or-overwrite.
	Put,
	/// Read.
	Read,
	/// Overwrite.
	Update,
	/// Delete.
	Delete,
	/// Store statistics.
	Metadata,
	/// Credential issuance or registration.
	Issue,
	/// Credential revocation.
	Revoke,
}
impl GateAction {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			GateAction::Create => "create",
			GateAction::Put => "put",
			GateAction::Read => "read",
			GateAction::Update => "update",
			GateAction::Delete => "delete",
			GateAction::Metadata => "metadata",
			GateAction::Issue => "issue",
			GateAction::Revoke => "revoke",
		}
	}
}
impl From<Operation> for GateAction {
	fn from(value: Operation) -> Self {
		match value {
			Operation::Create => GateAction::Create,
			Operation::Read => GateAction::Read,
			Operation::Update => GateAction::Update,
			Operation::Delete => GateAction::Delete,
		}
	}
}
impl Display for GateAction {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DecisionOutcome {
	/// The request passed every control.
	Permitted,
	/// The request was refused; carries the denial reason code.
	Denied(&'static str),
	/// Infrastructure or caller error unrelated to access control.
	Failed,
}
impl DecisionOutcome {
	/// Classifies a pipeline result.
	pub fn of<T>(result: &Result<T>) -> Self {
		match result {
			Ok(_) => Self::Permitted,
			Err(Error::Denied(denial)) => Self::Denied(denial.code()),
			Err(_) => Self::Failed,
		}
	}

	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			DecisionOutcome::Permitted => "permitted",
			DecisionOutcome::Denied(code) => code,
			DecisionOutcome::Failed => "failed",
		}
	}
}
impl From<&Denial> for DecisionOutcome {
	fn from(value: &Denial) -> Self {
		Self::Denied(value.code())
	}
}
impl Display for DecisionOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn outcomes_use_denial_codes() {
		let denied: Result<()> = Err(Denial::UnknownCredential.into());
		let failed: Result<()> =
			Err(crate::store::StoreError::Backend { message: "down".into() }.into());

		assert_eq!(DecisionOutcome::of(&Ok::<_, Error>(())).as_str(), "permitted");
		assert_eq!(DecisionOutcome::of(&denied).as_str(), "UnknownCredential");
		assert_eq!(DecisionOutcome::of(&failed), DecisionOutcome::Failed);
		assert_eq!(GateAction::from(Operation::Delete).as_str(), "delete");
	}
}
