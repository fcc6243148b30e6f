//! Sequential multi-email entitlement lookup.

// self
use crate::{
	_prelude::*,
	client::KeapClient,
	entitlements::Entitlement,
	obs::{self, OperationKind},
};

/// Per-email result of a batch lookup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchOutcome {
	/// A contact matched.
	Found {
		/// Resolved entitlement.
		entitlement: Entitlement,
	},
	/// No contact matched.
	NotFound,
	/// The lookup failed; the batch continued.
	Errored {
		/// Display form of the failure.
		message: String,
	},
}

/// One batch entry, in input order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BatchEntry {
	/// Email as supplied by the caller.
	pub email: String,
	/// What happened for this email.
	#[serde(flatten)]
	pub outcome: BatchOutcome,
}
impl BatchEntry {
	/// Returns the entitlement if one was found.
	pub fn entitlement(&self) -> Option<&Entitlement> {
		match &self.outcome {
			BatchOutcome::Found { entitlement } => Some(entitlement),
			_ => None,
		}
	}
}

/// Counts over a batch; `found + not_found + errors == total`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
	/// Number of emails requested.
	pub total: usize,
	/// Emails with a matching contact.
	pub found: usize,
	/// Emails without a matching contact.
	pub not_found: usize,
	/// Emails whose lookup failed.
	pub errors: usize,
}

/// Result of [`KeapClient::get_batch_entitlements`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BatchEntitlements {
	/// One entry per requested email, in input order.
	pub results: Vec<BatchEntry>,
	/// Aggregate counts.
	pub summary: BatchSummary,
}

impl KeapClient {
	/// Resolves each email one at a time.
	///
	/// Never aborts: a failed lookup is captured in its entry and the batch moves on.
	pub async fn get_batch_entitlements<I, S>(&self, emails: I) -> Result<BatchEntitlements>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		obs::observe(OperationKind::BatchEntitlements, "get_batch_entitlements", async move {
			let mut batch = BatchEntitlements::default();

			for email in emails {
				let email = email.into();
				let outcome = match self.get_user_entitlements(&email).await {
					Ok(Some(entitlement)) => {
						batch.summary.found += 1;

						BatchOutcome::Found { entitlement }
					},
					Ok(None) => {
						batch.summary.not_found += 1;

						BatchOutcome::NotFound
					},
					Err(e) => {
						obs::batch_entry_failed(&email, &e);
						batch.summary.errors += 1;

						BatchOutcome::Errored { message: e.to_string() }
					},
				};

				batch.summary.total += 1;
				batch.results.push(BatchEntry { email, outcome });
			}

			Ok(batch)
		})
		.await
	}
}
