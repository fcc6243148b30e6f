//! Client-level error types shared across authentication, transport, and assembly.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn StdError + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Response body could not be decoded.
	#[error(transparent)]
	Decode(#[from] DecodeError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Token endpoint rejected the client credentials.
	#[error("Token endpoint rejected the credentials with status {status}: {body}.")]
	Authentication {
		/// HTTP status returned by the token endpoint.
		status: u16,
		/// Raw response body.
		body: String,
	},
	/// CRM answered with a non-success status.
	#[error("Keap API request failed with status {status}: {body}.")]
	Api {
		/// HTTP status returned by the CRM.
		status: u16,
		/// Raw response body.
		body: String,
	},
	/// A write was attempted while the client is in read-only mode.
	#[error("Refusing {method} {path} because the client is read-only.")]
	ReadOnly {
		/// HTTP method of the rejected request.
		method: String,
		/// API path of the rejected request.
		path: String,
	},
	/// Token endpoint answered successfully but the payload is unusable.
	#[error("Token endpoint returned an unexpected response: {message}.")]
	UnexpectedResponse {
		/// Human-readable reason.
		message: String,
	},
}
impl Error {
	/// Returns the HTTP status carried by authentication and API failures.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Authentication { status, .. } | Self::Api { status, .. } => Some(*status),
			_ => None,
		}
	}

	/// Returns `true` when the CRM answered `401 Unauthorized`.
	pub fn is_unauthorized(&self) -> bool {
		matches!(self, Self::Api { status: 401, .. })
	}
}

/// Configuration and validation failures raised while building a client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Neither a service account token nor client credentials were supplied.
	#[error("Either a service account token or a client id and secret pair is required.")]
	MissingCredentials,
	/// Only one half of the client id/secret pair was supplied.
	#[error("Client credentials require both a client id and a client secret.")]
	IncompleteClientCredentials,
	/// A configured URL cannot be used.
	#[error("The {field} URL is invalid.")]
	InvalidUrl {
		/// Which configuration field failed validation.
		field: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}

/// Malformed JSON returned by the CRM or the token endpoint.
#[derive(Debug, ThisError)]
#[error("Failed to decode {context} at `{}`.", .source.path())]
pub struct DecodeError {
	/// Which payload was being decoded.
	pub context: &'static str,
	/// Structured parsing failure including the JSON path.
	#[source]
	pub source: serde_path_to_error::Error<serde_json::Error>,
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling Keap.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling Keap.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
impl From<ReqwestError> for Error {
	fn from(e: ReqwestError) -> Self {
		if e.is_builder() {
			return ConfigError::http_client_build(e).into();
		}

		TransportError::from(e).into()
	}
}
