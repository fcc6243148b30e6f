// self
use crate::obs::{OperationKind, OperationOutcome};

/// Counter incremented for every observed client operation stage.
pub const OPERATION_COUNTER: &str = "keap_entitlements_operation_total";
/// Counter incremented whenever a contact's tag lookup fails and is treated as untagged.
pub const DEGRADED_CONTACT_COUNTER: &str = "keap_entitlements_degraded_contacts_total";

/// Records an operation outcome via the global metrics recorder (when enabled).
pub fn record_operation_outcome(kind: OperationKind, outcome: OperationOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(OPERATION_COUNTER, "op" => kind.as_str(), "outcome" => outcome.as_str())
			.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Counts a contact whose tags could not be fetched, labeled by the path that degraded it
/// (`single` for entitlement lookups, `bulk` for full scans).
pub fn record_degraded_contact(path: &'static str) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(DEGRADED_CONTACT_COUNTER, "path" => path).increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = path;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn counters_are_namespaced_per_crate() {
		for name in [OPERATION_COUNTER, DEGRADED_CONTACT_COUNTER] {
			assert!(name.starts_with("keap_entitlements_"));
			assert!(name.ends_with("_total"));
		}
	}

	#[test]
	fn recording_without_a_recorder_is_a_noop() {
		record_operation_outcome(OperationKind::AllEntitlements, OperationOutcome::Failure);
		record_degraded_contact("bulk");
	}
}
