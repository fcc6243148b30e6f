//! Lazy credential acquisition with a singleflight guard around refreshes.

// self
use crate::{
	_prelude::*,
	auth::{Credential, TokenSecret},
	client::{Grant, KeapClient},
	obs::{self, OperationKind},
};

impl KeapClient {
	/// Guarantees a usable bearer token, exchanging client credentials when the cached one is
	/// missing or within the expiry buffer.
	pub async fn ensure_valid(&self) -> Result<TokenSecret> {
		if let Some(token) = self.valid_token() {
			return Ok(token);
		}

		let _singleflight = self.refresh_guard.lock().await;

		// Another caller may have refreshed while this one waited.
		if let Some(token) = self.valid_token() {
			return Ok(token);
		}

		self.authenticate().await
	}

	/// Obtains a new credential unconditionally and caches it.
	///
	/// Service account clients re-adopt their configured token without any network call.
	pub async fn authenticate(&self) -> Result<TokenSecret> {
		obs::observe(OperationKind::Authenticate, "authenticate", async move {
			let credential = match &self.grant {
				Grant::ServiceAccount(token) => Credential::permanent(token.clone()),
				Grant::ClientCredentials(exchange) => exchange.exchange(&self.http_client).await?,
			};
			let token = credential.token.clone();

			obs::token_obtained(credential.expires_at());
			self.store_credential(credential);

			Ok(token)
		})
		.await
	}

	/// Drops the cached credential so the next call re-authenticates.
	///
	/// Service account credentials are permanent and are kept.
	pub fn invalidate(&self) {
		if !self.config.uses_service_account() {
			*self.credential.lock() = None;
		}
	}

	/// Returns `true` when a cached credential exists and is outside the expiry buffer.
	pub fn is_token_valid(&self) -> bool {
		self.valid_token().is_some()
	}

	fn valid_token(&self) -> Option<TokenSecret> {
		let now = OffsetDateTime::now_utc();

		self.credential
			.lock()
			.as_ref()
			.filter(|credential| credential.is_valid_at(now))
			.map(|credential| credential.token.clone())
	}
}
