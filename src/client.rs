//! The Keap client: owns configuration, transport, and the single live credential.

pub mod auth;
pub mod contacts;
pub mod gateway;
pub mod tags;

pub use contacts::*;
pub use gateway::*;

// self
use crate::{
	_prelude::*,
	auth::{Credential, TokenSecret},
	config::{ClientConfig, CredentialSource, Environment},
	http::ReqwestHttpClient,
	oauth::TokenExchange,
};

/// Authenticated client for the Keap REST API.
///
/// Calls are sequential from the caller's point of view; the only shared mutable state is the
/// cached [`Credential`], refreshed lazily on demand. Concurrent callers that find the
/// credential stale serialize on an async guard so only one of them hits the token endpoint.
pub struct KeapClient {
	config: ClientConfig,
	http_client: ReqwestHttpClient,
	grant: Grant,
	credential: Mutex<Option<Credential>>,
	refresh_guard: AsyncMutex<()>,
}
impl KeapClient {
	/// Creates a client with its own reqwest transport.
	pub fn new(config: ClientConfig) -> Result<Self> {
		Self::with_http_client(config, ReqwestHttpClient::new()?)
	}

	/// Creates a client that reuses the caller-provided transport.
	///
	/// Service account tokens are adopted here and never exchanged; client credentials are
	/// validated now but only exchanged on the first API call.
	pub fn with_http_client(config: ClientConfig, http_client: ReqwestHttpClient) -> Result<Self> {
		let (grant, credential) = match config.credentials() {
			CredentialSource::ServiceAccount(token) => (
				Grant::ServiceAccount(token.clone()),
				Some(Credential::permanent(token.clone())),
			),
			CredentialSource::ClientCredentials { client_id, client_secret } => (
				Grant::ClientCredentials(TokenExchange::new(
					config.token_url(),
					client_id,
					client_secret,
				)?),
				None,
			),
		};

		Ok(Self {
			config,
			http_client,
			grant,
			credential: Mutex::new(credential),
			refresh_guard: AsyncMutex::new(()),
		})
	}

	/// Validated configuration backing this client.
	pub fn config(&self) -> &ClientConfig {
		&self.config
	}

	/// Diagnostic snapshot of the client's authentication state.
	pub fn status(&self) -> ClientStatus {
		let credential = self.credential.lock().clone();

		ClientStatus {
			authenticated: credential.as_ref().is_some_and(Credential::is_valid),
			environment: self.config.environment(),
			read_only_mode: self.config.read_only(),
			token_expiry: credential.and_then(|c| c.expires_at()),
			base_url: self.config.base_url().to_string(),
		}
	}

	pub(crate) fn store_credential(&self, credential: Credential) {
		*self.credential.lock() = Some(credential);
	}
}
impl Debug for KeapClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("KeapClient")
			.field("environment", &self.config.environment())
			.field("base_url", &self.config.base_url().as_str())
			.field("service_account", &self.config.uses_service_account())
			.field("credential_cached", &self.credential.lock().is_some())
			.finish()
	}
}

/// How [`KeapClient::authenticate`] produces a credential.
pub(crate) enum Grant {
	ServiceAccount(TokenSecret),
	ClientCredentials(TokenExchange),
}

/// Point-in-time view of a client's authentication state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientStatus {
	/// `true` when a non-stale credential is cached.
	pub authenticated: bool,
	/// Configured environment.
	pub environment: Environment,
	/// `true` when write requests are rejected.
	pub read_only_mode: bool,
	/// Expiry of the cached credential; `None` when absent or permanent.
	#[serde(with = "time::serde::rfc3339::option")]
	pub token_expiry: Option<OffsetDateTime>,
	/// API base URL.
	pub base_url: String,
}
