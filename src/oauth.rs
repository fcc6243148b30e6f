//! Client-credentials exchange against the Keap token endpoint via the `oauth2` crate.

// crates.io
use oauth2::{
	AccessToken, AuthType, Client, ClientId, ClientSecret, EndpointNotSet, EndpointSet,
	HttpClientError, RefreshToken, RequestTokenError, Scope, StandardRevocableToken, TokenResponse,
	TokenUrl,
	basic::{
		BasicErrorResponse, BasicRequestTokenError, BasicRevocationErrorResponse,
		BasicTokenIntrospectionResponse, BasicTokenType,
	},
};
use serde::Deserializer;
// self
use crate::{
	_prelude::*,
	auth::{Credential, TokenSecret},
	error::{ConfigError, DecodeError, TransportError},
	http::{ReqwestHttpClient, ResponseMetadata, ResponseMetadataSlot},
};

/// Keap grants every client-credentials token the `full` scope.
const SCOPE: &str = "full";

type ConfiguredClient = Client<
	BasicErrorResponse,
	KeapTokenResponse,
	BasicTokenIntrospectionResponse,
	StandardRevocableToken,
	BasicRevocationErrorResponse,
	EndpointNotSet,
	EndpointNotSet,
	EndpointNotSet,
	EndpointNotSet,
	EndpointSet,
>;

/// Token endpoint reply. Only `access_token` is mandatory; a missing `token_type` means bearer.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub(crate) struct KeapTokenResponse {
	access_token: AccessToken,
	#[serde(default = "bearer", deserialize_with = "token_type_or_bearer")]
	token_type: BasicTokenType,
	#[serde(default)]
	expires_in: Option<i64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	refresh_token: Option<RefreshToken>,
}
impl TokenResponse for KeapTokenResponse {
	type TokenType = BasicTokenType;

	fn access_token(&self) -> &AccessToken {
		&self.access_token
	}

	fn token_type(&self) -> &BasicTokenType {
		&self.token_type
	}

	fn expires_in(&self) -> Option<std::time::Duration> {
		self.expires_in
			.and_then(|secs| u64::try_from(secs).ok())
			.map(std::time::Duration::from_secs)
	}

	fn refresh_token(&self) -> Option<&RefreshToken> {
		self.refresh_token.as_ref()
	}

	fn scopes(&self) -> Option<&Vec<Scope>> {
		None
	}
}

fn bearer() -> BasicTokenType {
	BasicTokenType::Bearer
}

fn token_type_or_bearer<'de, D>(deserializer: D) -> Result<BasicTokenType, D::Error>
where
	D: Deserializer<'de>,
{
	let token_type = Option::<String>::deserialize(deserializer)?;

	Ok(match token_type.map(|value| value.to_ascii_lowercase()).as_deref() {
		None | Some("bearer") => BasicTokenType::Bearer,
		Some("mac") => BasicTokenType::Mac,
		Some(other) => BasicTokenType::Extension(other.to_owned()),
	})
}

/// Pre-configured `client_credentials` grant for one client id/secret pair.
pub(crate) struct TokenExchange {
	oauth_client: ConfiguredClient,
}
impl TokenExchange {
	pub(crate) fn new(
		token_url: &Url,
		client_id: &str,
		client_secret: &TokenSecret,
	) -> Result<Self, ConfigError> {
		let token_url = TokenUrl::new(token_url.to_string())
			.map_err(|source| ConfigError::InvalidUrl { field: "token", source })?;
		// Keap expects the client id and secret in the form body.
		let oauth_client: ConfiguredClient = Client::new(ClientId::new(client_id.to_owned()))
			.set_client_secret(ClientSecret::new(client_secret.expose().to_owned()))
			.set_token_uri(token_url)
			.set_auth_type(AuthType::RequestBody);

		Ok(Self { oauth_client })
	}

	/// Requests a fresh access token and stamps its expiry relative to now.
	pub(crate) async fn exchange(&self, http_client: &ReqwestHttpClient) -> Result<Credential> {
		let meta = ResponseMetadataSlot::default();
		let instrumented = http_client.instrumented(meta.clone());
		let response = self
			.oauth_client
			.exchange_client_credentials()
			.add_scope(Scope::new(SCOPE.to_owned()))
			.request_async(&instrumented)
			.await
			.map_err(|err| map_request_error(meta.take(), err))?;

		map_token_response(response)
	}
}

fn map_token_response(response: KeapTokenResponse) -> Result<Credential> {
	let expires_in =
		response.expires_in.ok_or_else(|| unexpected("the expires_in field is missing"))?;

	if expires_in <= 0 {
		return Err(unexpected("the expires_in value must be positive"));
	}

	Ok(Credential::expiring_in(
		TokenSecret::new(response.access_token.secret().to_owned()),
		OffsetDateTime::now_utc(),
		Duration::seconds(expires_in),
	))
}

fn map_request_error(
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<ReqwestError>>,
) -> Error {
	let meta = meta.unwrap_or_default();
	let rejected_status = meta.is_failure().then_some(meta.status).flatten();

	match err {
		RequestTokenError::ServerResponse(response) => Error::Authentication {
			status: meta.status.unwrap_or_default(),
			body: serde_json::to_string(&response).unwrap_or_else(|_| response.to_string()),
		},
		RequestTokenError::Parse(source, body) => match rejected_status {
			Some(status) =>
				Error::Authentication { status, body: String::from_utf8_lossy(&body).into_owned() },
			None => DecodeError { context: "token response", source }.into(),
		},
		RequestTokenError::Other(message) => match rejected_status {
			Some(status) => Error::Authentication { status, body: message },
			None => unexpected(message),
		},
		RequestTokenError::Request(error) => map_transport_error(error),
	}
}

fn map_transport_error(err: HttpClientError<ReqwestError>) -> Error {
	match err {
		HttpClientError::Reqwest(inner) => Error::from(*inner),
		HttpClientError::Http(inner) => ConfigError::from(inner).into(),
		HttpClientError::Io(inner) => TransportError::Io(inner).into(),
		HttpClientError::Other(message) => TransportError::network(OtherTransportError(message)).into(),
		_ => TransportError::network(OtherTransportError("unknown transport failure".into())).into(),
	}
}

fn unexpected(message: impl Into<String>) -> Error {
	Error::UnexpectedResponse { message: message.into() }
}

#[derive(Debug, ThisError)]
#[error("{0}")]
struct OtherTransportError(String);
