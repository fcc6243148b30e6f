// self
use crate::{_prelude::*, obs::OperationKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedOperation<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOperation<F> = F;

/// A span builder used by client operations.
#[derive(Clone, Debug)]
pub struct OperationSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OperationSpan {
	/// Creates a new span tagged with the provided operation kind + stage.
	pub fn new(kind: OperationKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("keap_entitlements.op", op = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOperation<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

pub(crate) fn token_obtained(expires_at: Option<OffsetDateTime>) {
	#[cfg(feature = "tracing")]
	{
		match expires_at {
			Some(at) => {
				let expires_in = (at - OffsetDateTime::now_utc()).whole_seconds();

				tracing::debug!(expires_in, "Obtained Keap access token.");
			},
			None => tracing::debug!("Adopted service account token."),
		}
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = expires_at;
	}
}

pub(crate) fn retrying_after_unauthorized(path: &str) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(path, "Keap answered 401; re-authenticating and retrying once.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = path;
	}
}

pub(crate) fn contact_tags_unavailable(contact_id: u64, error: &Error) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(contact_id, %error, "Failed to fetch contact tags; treating contact as untagged.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (contact_id, error);
	}
}

pub(crate) fn batch_entry_failed(email: &str, error: &Error) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(email, %error, "Entitlement lookup failed; continuing with the batch.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (email, error);
	}
}

pub(crate) fn contact_skipped_without_email(contact_id: u64) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(contact_id, "Skipping contact without an email address.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = contact_id;
	}
}
