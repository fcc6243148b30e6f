//! Client configuration, credential selection, and the production write policy.

// self
use crate::{_prelude::*, auth::TokenSecret, error::ConfigError};

/// Default Keap REST base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.infusionsoft.com/crm/rest/v1";
/// Default Keap OAuth token endpoint.
pub const DEFAULT_TOKEN_URL: &str = "https://api.infusionsoft.com/token";

/// Deployment environment the client runs in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
	/// Local development.
	#[default]
	Development,
	/// Pre-production staging.
	Staging,
	/// Production; writes are always disabled.
	Production,
}
impl Environment {
	/// Returns a stable label suitable for logs and status payloads.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Development => "development",
			Self::Staging => "staging",
			Self::Production => "production",
		}
	}

	/// Returns `true` for [`Environment::Production`].
	pub const fn is_production(self) -> bool {
		matches!(self, Self::Production)
	}
}
impl Display for Environment {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for Environment {
	type Err = UnknownEnvironment;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"development" | "dev" => Ok(Self::Development),
			"staging" => Ok(Self::Staging),
			"production" | "prod" => Ok(Self::Production),
			_ => Err(UnknownEnvironment(s.to_owned())),
		}
	}
}

/// Raised when an environment label cannot be parsed.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Unknown environment `{0}`.")]
pub struct UnknownEnvironment(pub String);

/// How the client obtains its bearer credential.
#[derive(Clone, Debug)]
pub enum CredentialSource {
	/// Pre-issued token adopted as-is; never refreshed.
	ServiceAccount(TokenSecret),
	/// OAuth client-credentials exchange against the token endpoint.
	ClientCredentials {
		/// OAuth client identifier.
		client_id: String,
		/// OAuth client secret.
		client_secret: TokenSecret,
	},
}
impl CredentialSource {
	/// Returns `true` for [`CredentialSource::ServiceAccount`].
	pub fn is_service_account(&self) -> bool {
		matches!(self, Self::ServiceAccount(_))
	}
}

/// Validated client configuration.
///
/// Instances only come out of [`ClientConfigBuilder::build`], so the credential source is always
/// complete and production configurations are always read-only.
#[derive(Clone, Debug)]
pub struct ClientConfig {
	credentials: CredentialSource,
	environment: Environment,
	allow_write: bool,
	base_url: Url,
	token_url: Url,
}
impl ClientConfig {
	/// Returns a builder seeded with the Keap defaults.
	pub fn builder() -> ClientConfigBuilder {
		ClientConfigBuilder::default()
	}

	/// Credential source selected during validation.
	pub fn credentials(&self) -> &CredentialSource {
		&self.credentials
	}

	/// Returns `true` when authenticating with a service account token.
	pub fn uses_service_account(&self) -> bool {
		self.credentials.is_service_account()
	}

	/// Deployment environment.
	pub fn environment(&self) -> Environment {
		self.environment
	}

	/// Effective write permission after the production override.
	pub fn allow_write(&self) -> bool {
		self.allow_write
	}

	/// Returns `true` when write requests are rejected.
	pub fn read_only(&self) -> bool {
		!self.allow_write
	}

	/// Base URL every API path is appended to.
	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	/// OAuth token endpoint.
	pub fn token_url(&self) -> &Url {
		&self.token_url
	}
}

/// Builder for [`ClientConfig`] values.
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
	/// OAuth client identifier.
	pub client_id: Option<String>,
	/// OAuth client secret.
	pub client_secret: Option<String>,
	/// Pre-issued service account token.
	pub service_account_token: Option<String>,
	/// Deployment environment.
	pub environment: Environment,
	/// Requested write permission; ignored in production.
	pub allow_write: bool,
	/// Overrides [`DEFAULT_BASE_URL`].
	pub base_url: Option<Url>,
	/// Overrides [`DEFAULT_TOKEN_URL`].
	pub token_url: Option<Url>,
}
impl ClientConfigBuilder {
	/// Sets the OAuth client identifier.
	pub fn client_id(mut self, value: impl Into<String>) -> Self {
		self.client_id = Some(value.into());

		self
	}

	/// Sets the OAuth client secret.
	pub fn client_secret(mut self, value: impl Into<String>) -> Self {
		self.client_secret = Some(value.into());

		self
	}

	/// Sets a pre-issued service account token, which takes precedence over client credentials.
	pub fn service_account_token(mut self, value: impl Into<String>) -> Self {
		self.service_account_token = Some(value.into());

		self
	}

	/// Sets the deployment environment.
	pub fn environment(mut self, environment: Environment) -> Self {
		self.environment = environment;

		self
	}

	/// Requests write access. Production configurations ignore this flag.
	pub fn allow_write(mut self, allow: bool) -> Self {
		self.allow_write = allow;

		self
	}

	/// Overrides the API base URL.
	pub fn base_url(mut self, url: Url) -> Self {
		self.base_url = Some(url);

		self
	}

	/// Overrides the OAuth token endpoint.
	pub fn token_url(mut self, url: Url) -> Self {
		self.token_url = Some(url);

		self
	}

	/// Validates the builder and produces a [`ClientConfig`].
	pub fn build(self) -> Result<ClientConfig, ConfigError> {
		let credentials = resolve_credentials(
			non_empty(self.service_account_token),
			non_empty(self.client_id),
			non_empty(self.client_secret),
		)?;
		let base_url = match self.base_url {
			Some(url) => url,
			None => parse_default("base", DEFAULT_BASE_URL)?,
		};
		let token_url = match self.token_url {
			Some(url) => url,
			None => parse_default("token", DEFAULT_TOKEN_URL)?,
		};
		let allow_write = self.allow_write && !self.environment.is_production();

		Ok(ClientConfig {
			credentials,
			environment: self.environment,
			allow_write,
			base_url,
			token_url,
		})
	}
}

fn resolve_credentials(
	service_account_token: Option<String>,
	client_id: Option<String>,
	client_secret: Option<String>,
) -> Result<CredentialSource, ConfigError> {
	if let Some(token) = service_account_token {
		return Ok(CredentialSource::ServiceAccount(TokenSecret::new(token)));
	}

	match (client_id, client_secret) {
		(Some(client_id), Some(client_secret)) => Ok(CredentialSource::ClientCredentials {
			client_id,
			client_secret: TokenSecret::new(client_secret),
		}),
		(None, None) => Err(ConfigError::MissingCredentials),
		_ => Err(ConfigError::IncompleteClientCredentials),
	}
}

fn non_empty(value: Option<String>) -> Option<String> {
	value.filter(|v| !v.trim().is_empty())
}

fn parse_default(field: &'static str, raw: &str) -> Result<Url, ConfigError> {
	Url::parse(raw).map_err(|source| ConfigError::InvalidUrl { field, source })
}
