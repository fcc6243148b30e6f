//! Optional observability helpers for client operations.
//!
//! # Feature Flags
//!
//! - `tracing` (default) emits spans named `keap_entitlements.op` with the `op` and `stage` fields,
//!   plus log events for token refreshes, 401 retries, and degraded contacts.
//! - `metrics` increments the `keap_entitlements_operation_total` counter for every
//!   attempt/success/failure, labeled by `op` + `outcome`, and
//!   `keap_entitlements_degraded_contacts_total` for each contact whose tags were unavailable.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Client operations observed by spans and counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
	/// Token acquisition or adoption.
	Authenticate,
	/// Single authenticated API call.
	Request,
	/// Contact listing, counting, or streaming.
	Contacts,
	/// Tag map loading or per-contact tag lookups.
	Tags,
	/// Single-email entitlement lookup.
	UserEntitlements,
	/// Sequential multi-email lookup.
	BatchEntitlements,
	/// Full contact-set scan.
	AllEntitlements,
}
impl OperationKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Authenticate => "authenticate",
			Self::Request => "request",
			Self::Contacts => "contacts",
			Self::Tags => "tags",
			Self::UserEntitlements => "user_entitlements",
			Self::BatchEntitlements => "batch_entitlements",
			Self::AllEntitlements => "all_entitlements",
		}
	}
}
impl Display for OperationKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationOutcome {
	/// Entry to a client operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl OperationOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Attempt => "attempt",
			Self::Success => "success",
			Self::Failure => "failure",
		}
	}
}
impl Display for OperationOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Runs `fut` inside an [`OperationSpan`] and records attempt plus final outcome.
pub(crate) async fn observe<T, Fut>(kind: OperationKind, stage: &'static str, fut: Fut) -> Result<T>
where
	Fut: Future<Output = Result<T>>,
{
	let span = OperationSpan::new(kind, stage);

	record_operation_outcome(kind, OperationOutcome::Attempt);

	let result = span.instrument(fut).await;

	match &result {
		Ok(_) => record_operation_outcome(kind, OperationOutcome::Success),
		Err(_) => record_operation_outcome(kind, OperationOutcome::Failure),
	}

	result
}
