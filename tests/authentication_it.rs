// crates.io
use httpmock::prelude::*;
use serde_json::json;
// self
use keap_entitlements::{_preludet::*, client::ListContactsOptions};

const CONTACTS_PATH: &str = "/crm/rest/v1/contacts";

fn token_body(token: &str) -> String {
	format!("{{\"access_token\":\"{token}\",\"token_type\":\"bearer\",\"expires_in\":86400}}")
}

fn empty_page() -> serde_json::Value {
	json!({ "contacts": [], "count": 0 })
}

#[tokio::test]
async fn token_is_fetched_lazily_and_reused() {
	let server = MockServer::start_async().await;
	let client = build_oauth_test_client(&server.base_url());
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body(token_body("lazy"));
		})
		.await;
	let contacts_mock = server
		.mock_async(|when, then| {
			when.method(GET).path(CONTACTS_PATH).header("authorization", "Bearer lazy");
			then.status(200).json_body(empty_page());
		})
		.await;

	assert!(!client.status().authenticated);

	token_mock.assert_calls_async(0).await;

	client
		.list_contacts(ListContactsOptions::default())
		.await
		.expect("First listing should succeed.");
	client
		.list_contacts(ListContactsOptions::default())
		.await
		.expect("Second listing should reuse the cached token.");

	token_mock.assert_calls_async(1).await;
	contacts_mock.assert_calls_async(2).await;

	let status = client.status();

	assert!(status.authenticated);
	assert!(status.token_expiry.is_some());
}

#[tokio::test]
async fn rejected_client_credentials_surface_as_authentication_error() {
	let server = MockServer::start_async().await;
	let client = build_oauth_test_client(&server.base_url());
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(401)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_client\",\"error_description\":\"Invalid client\"}");
		})
		.await;
	let err = client.ensure_valid().await.expect_err("Rejected credentials must fail.");

	match err {
		Error::Authentication { status, body } => {
			assert_eq!(status, 401);
			assert!(body.contains("invalid_client"));
		},
		other => panic!("Expected an authentication error, got {other:?}."),
	}

	token_mock.assert_async().await;
	assert!(!client.is_token_valid());
}

#[tokio::test]
async fn unauthorized_response_triggers_single_reauthentication() {
	let server = MockServer::start_async().await;
	let client = build_oauth_test_client(&server.base_url());

	seed_credential(&client, "stale", OffsetDateTime::now_utc() + Duration::hours(1));

	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body(token_body("fresh"));
		})
		.await;
	let stale_mock = server
		.mock_async(|when, then| {
			when.method(GET).path(CONTACTS_PATH).header("authorization", "Bearer stale");
			then.status(401).body("token revoked");
		})
		.await;
	let fresh_mock = server
		.mock_async(|when, then| {
			when.method(GET).path(CONTACTS_PATH).header("authorization", "Bearer fresh");
			then.status(200).json_body(json!({ "contacts": [], "count": 12 }));
		})
		.await;
	let count = client.count_contacts().await.expect("Retried request should succeed.");

	assert_eq!(count, 12);

	token_mock.assert_calls_async(1).await;
	stale_mock.assert_calls_async(1).await;
	fresh_mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn second_unauthorized_response_is_terminal() {
	let server = MockServer::start_async().await;
	let client = build_oauth_test_client(&server.base_url());
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body(token_body("denied"));
		})
		.await;
	let contacts_mock = server
		.mock_async(|when, then| {
			when.method(GET).path(CONTACTS_PATH);
			then.status(401).body("still unauthorized");
		})
		.await;
	let err = client.count_contacts().await.expect_err("A second 401 must fail.");

	assert!(err.is_unauthorized());
	assert!(matches!(err, Error::Api { ref body, .. } if body == "still unauthorized"));

	// One token for the first attempt, exactly one more for the retry.
	token_mock.assert_calls_async(2).await;
	contacts_mock.assert_calls_async(2).await;
}

#[tokio::test]
async fn service_account_never_exchanges_or_retries() {
	let server = MockServer::start_async().await;
	let client = build_service_account_test_client(&server.base_url(), "sa-token");
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body(token_body("unused"));
		})
		.await;
	let contacts_mock = server
		.mock_async(|when, then| {
			when.method(GET).path(CONTACTS_PATH).header("authorization", "Bearer sa-token");
			then.status(401).body("service account disabled");
		})
		.await;

	assert!(client.status().authenticated);
	assert_eq!(client.status().token_expiry, None);

	let err = client.count_contacts().await.expect_err("A 401 must surface immediately.");

	assert!(matches!(err, Error::Api { status: 401, .. }));

	token_mock.assert_calls_async(0).await;
	contacts_mock.assert_calls_async(1).await;
	assert!(client.is_token_valid());
}

#[tokio::test]
async fn rate_limited_responses_are_plain_api_errors() {
	let server = MockServer::start_async().await;
	let client = build_service_account_test_client(&server.base_url(), "sa-token");
	let contacts_mock = server
		.mock_async(|when, then| {
			when.method(GET).path(CONTACTS_PATH);
			then.status(429).header("retry-after", "30").body("quota exceeded");
		})
		.await;
	let err = client.count_contacts().await.expect_err("429 must not be retried.");

	assert_eq!(err.status(), Some(429));

	contacts_mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn writes_are_allowed_outside_production_only() {
	let server = MockServer::start_async().await;
	let config = test_config_builder(&server.base_url())
		.service_account_token("sa-token")
		.allow_write(true)
		.build()
		.expect("Writable configuration should build.");
	let client = keap_entitlements::client::KeapClient::new(config)
		.expect("Writable client should build.");
	let apply_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/crm/rest/v1/contacts/7/tags");
			then.status(200).json_body(json!({}));
		})
		.await;

	client.apply_tags(7, &[11, 12]).await.expect("Writes should be allowed in development.");
	apply_mock.assert_async().await;

	let production = test_config_builder(&server.base_url())
		.service_account_token("sa-token")
		.environment(keap_entitlements::config::Environment::Production)
		.allow_write(true)
		.build()
		.expect("Production configuration should build.");
	let client = keap_entitlements::client::KeapClient::new(production)
		.expect("Production client should build.");
	let err = client.apply_tags(7, &[11]).await.expect_err("Production must stay read-only.");

	assert!(matches!(err, Error::ReadOnly { .. }));

	apply_mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn minimal_token_body_is_accepted() {
	let server = MockServer::start_async().await;
	let client = build_oauth_test_client(&server.base_url());
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"abc\",\"expires_in\":3600}");
		})
		.await;
	let token = client.ensure_valid().await.expect("A body without token_type should work.");

	assert_eq!(token.expose(), "abc");
	assert!(client.is_token_valid());

	token_mock.assert_async().await;
}

#[tokio::test]
async fn concurrent_callers_share_one_refresh_inside_expiry_buffer() {
	let server = MockServer::start_async().await;
	let client = build_oauth_test_client(&server.base_url());

	// Still unexpired, but inside the five minute buffer.
	seed_credential(&client, "aging", OffsetDateTime::now_utc() + Duration::seconds(200));

	assert!(!client.is_token_valid());

	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body(token_body("renewed"))
				.delay(std::time::Duration::from_millis(50));
		})
		.await;
	let (first, second) = tokio::join!(client.ensure_valid(), client.ensure_valid());
	let first = first.expect("First caller should obtain a token.");
	let second = second.expect("Second caller should obtain a token.");

	assert_eq!(first.expose(), "renewed");
	assert_eq!(second.expose(), "renewed");

	token_mock.assert_calls_async(1).await;
}
