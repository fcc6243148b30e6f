//! Demonstrates resolving entitlements against a mocked Keap API using the client-credentials
//! exchange, then running a batch lookup and a bounded bulk scan.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde_json::json;
use url::Url;
// self
use keap_entitlements::{
	client::KeapClient,
	config::{ClientConfig, Environment},
	entitlements::AllEntitlementsOptions,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"token_type\":\"bearer\",\"expires_in\":86400}",
			);
		})
		.await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/crm/rest/v1/contacts").query_param("email", "ada@example.com");
			then.status(200).json_body(json!({
				"contacts": [{
					"id": 1,
					"given_name": "Ada",
					"family_name": "Lovelace",
					"email_addresses": [{ "email": "ada@example.com", "field": "EMAIL1" }],
				}],
			}));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/crm/rest/v1/contacts").query_param("email", "nobody@example.com");
			then.status(200).json_body(json!({ "contacts": [] }));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/crm/rest/v1/contacts").query_param("offset", "0");
			then.status(200).json_body(json!({
				"contacts": [{
					"id": 1,
					"email_addresses": [{ "email": "ada@example.com", "field": "EMAIL1" }],
				}],
				"count": 1,
			}));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/crm/rest/v1/contacts/1/tags");
			then.status(200).json_body(json!({
				"tags": [{ "tag": { "id": 10, "name": "Premium" }, "date_applied": null }],
			}));
		})
		.await;

	let config = ClientConfig::builder()
		.client_id("demo-client")
		.client_secret("demo-secret")
		.environment(Environment::Development)
		.base_url(Url::parse(&server.url("/crm/rest/v1"))?)
		.token_url(Url::parse(&server.url("/token"))?)
		.build()?;
	let client = KeapClient::new(config)?;

	if let Some(entitlement) = client.get_user_entitlements("ada@example.com").await? {
		println!("{} has tags {:?}.", entitlement.name, entitlement.tags);
	}

	let batch = client.get_batch_entitlements(["ada@example.com", "nobody@example.com"]).await?;

	println!("Batch summary: {}.", serde_json::to_string(&batch.summary)?);

	let all = client
		.get_all_entitlements(AllEntitlementsOptions { limit: Some(10), ..Default::default() })
		.await?;

	println!("Distinct tags: {:?}.", all.tag_names);
	println!("Client status: {}.", serde_json::to_string(&client.status())?);

	token_mock.assert_async().await;

	Ok(())
}
