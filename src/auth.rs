//! Bearer credential state: redacted secrets plus the expiry window that decides when a cached
//! token must be replaced.

// self
use crate::_prelude::*;

/// Tokens expiring within this window are treated as already expired so in-flight requests never
/// race the real expiry.
pub const EXPIRY_BUFFER: Duration = Duration::minutes(5);

/// Redacted secret wrapper keeping tokens and client secrets out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl From<String> for TokenSecret {
	fn from(value: String) -> Self {
		Self(value)
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("TokenSecret(<redacted>)")
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// How long a [`Credential`] stays usable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CredentialLifetime {
	/// Expires at the given instant (minus [`EXPIRY_BUFFER`]).
	Expiring(OffsetDateTime),
	/// Service account tokens are adopted permanently and never refreshed.
	Permanent,
}

/// The single live bearer credential owned by a client.
#[derive(Clone, Debug)]
pub struct Credential {
	/// Bearer token value.
	pub token: TokenSecret,
	/// Expiry policy for the token.
	pub lifetime: CredentialLifetime,
}
impl Credential {
	/// Creates a credential from its parts.
	pub fn new(token: TokenSecret, lifetime: CredentialLifetime) -> Self {
		Self { token, lifetime }
	}

	/// Wraps a pre-issued service account token.
	pub fn permanent(token: TokenSecret) -> Self {
		Self::new(token, CredentialLifetime::Permanent)
	}

	/// Builds a credential that expires `expires_in` after `issued_at`.
	pub fn expiring_in(token: TokenSecret, issued_at: OffsetDateTime, expires_in: Duration) -> Self {
		Self::new(token, CredentialLifetime::Expiring(issued_at + expires_in))
	}

	/// Absolute expiry instant; `None` for permanent credentials.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		match self.lifetime {
			CredentialLifetime::Expiring(at) => Some(at),
			CredentialLifetime::Permanent => None,
		}
	}

	/// Returns `true` if the credential is usable at `now`, honoring [`EXPIRY_BUFFER`].
	pub fn is_valid_at(&self, now: OffsetDateTime) -> bool {
		match self.lifetime {
			CredentialLifetime::Expiring(at) => at - now > EXPIRY_BUFFER,
			CredentialLifetime::Permanent => true,
		}
	}

	/// Checks validity against the current UTC clock.
	pub fn is_valid(&self) -> bool {
		self.is_valid_at(OffsetDateTime::now_utc())
	}
}
