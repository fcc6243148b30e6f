//! Authenticated request gateway: bearer injection, the single 401 retry, and status mapping.

// crates.io
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	client::KeapClient,
	error::{ConfigError, DecodeError},
	obs::{self, OperationKind},
};

const JSON: &str = "application/json";

/// Parameters for one call through [`KeapClient::authed_request`].
#[derive(Clone, Debug, Default)]
pub struct ApiRequest {
	/// HTTP method; defaults to `GET`.
	pub method: Method,
	/// Query pairs, URL-encoded in order.
	pub query: Vec<(String, String)>,
	/// Optional JSON body.
	pub body: Option<serde_json::Value>,
}
impl ApiRequest {
	/// A `GET` request with no query.
	pub fn get() -> Self {
		Self::default()
	}

	/// A `POST` request carrying `body` as JSON.
	pub fn post(body: serde_json::Value) -> Self {
		Self { method: Method::POST, query: Vec::new(), body: Some(body) }
	}

	/// Appends a query pair.
	pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
		self.query.push((key.into(), value.to_string()));

		self
	}

	/// Returns `true` if the request can mutate remote state.
	pub fn is_write(&self) -> bool {
		![Method::GET, Method::HEAD, Method::OPTIONS].contains(&self.method)
	}
}

/// Successful (2xx) response body.
#[derive(Clone, Debug)]
pub struct ApiResponse {
	/// HTTP status.
	pub status: StatusCode,
	/// Raw body bytes.
	pub body: Vec<u8>,
}
impl ApiResponse {
	/// Decodes the body as JSON, reporting the failing path on error.
	pub fn json<T>(&self, context: &'static str) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let de = &mut serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(de).map_err(|source| DecodeError { context, source }.into())
	}
}

impl KeapClient {
	/// Sends an authenticated request to `base_url + path`.
	///
	/// A `401` in OAuth mode invalidates the cached token, re-authenticates, and retries exactly
	/// once; a second `401` is returned as [`Error::Api`]. Service account clients never retry.
	/// Non-GET requests fail with [`Error::ReadOnly`] unless writes are allowed.
	pub async fn authed_request(&self, path: &str, request: ApiRequest) -> Result<ApiResponse> {
		obs::observe(OperationKind::Request, "authed_request", async move {
			if request.is_write() && self.config.read_only() {
				return Err(Error::ReadOnly { method: request.method.to_string(), path: path.into() });
			}

			let url = self.endpoint(path, &request.query)?;
			let token = self.ensure_valid().await?;
			let response = self.send(&url, &request, &token).await?;

			// Service account tokens are not expected to expire, so a 401 is final.
			if response.status() != StatusCode::UNAUTHORIZED || self.config.uses_service_account() {
				return finish(response).await;
			}

			obs::retrying_after_unauthorized(path);
			self.invalidate();

			let token = self.ensure_valid().await?;
			let response = self.send(&url, &request, &token).await?;

			finish(response).await
		})
		.await
	}

	/// `GET` helper decoding the JSON body into `T`.
	pub(crate) async fn get_json<T>(
		&self,
		path: &str,
		request: ApiRequest,
		context: &'static str,
	) -> Result<T>
	where
		T: DeserializeOwned,
	{
		self.authed_request(path, request).await?.json(context)
	}

	pub(crate) fn endpoint(&self, path: &str, query: &[(String, String)]) -> Result<Url> {
		let base = self.config.base_url().as_str().trim_end_matches('/');
		let mut url = Url::parse(&format!("{base}{path}"))
			.map_err(|source| ConfigError::InvalidUrl { field: "request", source })?;

		if !query.is_empty() {
			url.query_pairs_mut().extend_pairs(query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
		}

		Ok(url)
	}

	async fn send(
		&self,
		url: &Url,
		request: &ApiRequest,
		token: &TokenSecret,
	) -> Result<reqwest::Response> {
		let mut builder = self
			.http_client
			.request(request.method.clone(), url.clone())
			.bearer_auth(token.expose())
			.header(CONTENT_TYPE, JSON)
			.header(ACCEPT, JSON);

		if let Some(body) = &request.body {
			builder = builder.body(body.to_string());
		}

		Ok(builder.send().await?)
	}
}

async fn finish(response: reqwest::Response) -> Result<ApiResponse> {
	let status = response.status();
	let body = response.bytes().await?.to_vec();

	if status.is_success() {
		Ok(ApiResponse { status, body })
	} else {
		Err(Error::Api { status: status.as_u16(), body: String::from_utf8_lossy(&body).into_owned() })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::config::ClientConfig;

	fn client(base: &str) -> KeapClient {
		let config = ClientConfig::builder()
			.service_account_token("sa-token")
			.base_url(Url::parse(base).expect("Test base URL should parse."))
			.build()
			.expect("Test configuration should build.");

		KeapClient::new(config).expect("Test client should build.")
	}

	#[test]
	fn endpoint_joins_base_path_and_encoded_query() {
		let client = client("https://api.example.com/crm/rest/v1/");
		let url = client
			.endpoint("/contacts", &[
				("email".into(), "jane+vip@example.com".into()),
				("limit".into(), "1".into()),
			])
			.expect("Endpoint should build.");

		assert_eq!(
			url.as_str(),
			"https://api.example.com/crm/rest/v1/contacts?email=jane%2Bvip%40example.com&limit=1"
		);

		let bare = client.endpoint("/tags", &[]).expect("Endpoint should build.");

		assert_eq!(bare.as_str(), "https://api.example.com/crm/rest/v1/tags");
	}

	#[test]
	fn write_detection_follows_method() {
		assert!(!ApiRequest::get().is_write());
		assert!(ApiRequest::post(serde_json::json!({})).is_write());
		assert!(ApiRequest { method: Method::DELETE, ..ApiRequest::default() }.is_write());
	}

	#[tokio::test]
	async fn read_only_clients_reject_writes_before_any_io() {
		let client = client("http://127.0.0.1:9/crm/rest/v1");
		let err = client
			.authed_request("/contacts/1/tags", ApiRequest::post(serde_json::json!({ "tagIds": [1] })))
			.await
			.expect_err("Writes must be rejected in read-only mode.");

		assert!(matches!(err, Error::ReadOnly { ref method, .. } if method == "POST"));
	}
}
