//! Tag-based entitlements for Keap CRM contacts, resolved by email from stateless auth hooks.
//!
//! [`client::KeapClient`] authenticates lazily (OAuth client credentials or a pre-issued service
//! account token), pages the remote contact and tag collections, and assembles per-contact
//! [`entitlements::Entitlement`] views for single, batch, and bulk lookups.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod client;
pub mod config;
pub mod entitlements;
pub mod error;
pub mod http;
pub mod model;
pub mod obs;

mod oauth;

#[doc(hidden)]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::{Credential, CredentialLifetime, TokenSecret},
		client::KeapClient,
		config::{ClientConfig, ClientConfigBuilder},
	};

	/// Client id used by test configurations.
	pub const TEST_CLIENT_ID: &str = "test-client";
	/// Client secret used by test configurations.
	pub const TEST_CLIENT_SECRET: &str = "test-secret";

	/// Seeds a builder with the mock server's `/token` endpoint and `/crm/rest/v1` base URL.
	pub fn test_config_builder(server_base: &str) -> ClientConfigBuilder {
		let base = server_base.trim_end_matches('/');

		ClientConfig::builder()
			.base_url(
				Url::parse(&format!("{base}/crm/rest/v1"))
					.expect("Mock base URL should parse successfully."),
			)
			.token_url(
				Url::parse(&format!("{base}/token"))
					.expect("Mock token URL should parse successfully."),
			)
	}

	/// Builds a client that authenticates through the client-credentials exchange.
	pub fn build_oauth_test_client(server_base: &str) -> KeapClient {
		let config = test_config_builder(server_base)
			.client_id(TEST_CLIENT_ID)
			.client_secret(TEST_CLIENT_SECRET)
			.build()
			.expect("OAuth test configuration should be valid.");

		KeapClient::new(config).expect("OAuth test client should build.")
	}

	/// Builds a client that adopts the provided service account token.
	pub fn build_service_account_test_client(server_base: &str, token: &str) -> KeapClient {
		let config = test_config_builder(server_base)
			.service_account_token(token)
			.build()
			.expect("Service account test configuration should be valid.");

		KeapClient::new(config).expect("Service account test client should build.")
	}

	/// Installs a cached credential so tests can exercise stale-token paths.
	pub fn seed_credential(client: &KeapClient, token: &str, expires_at: OffsetDateTime) {
		client.store_credential(Credential::new(
			TokenSecret::new(token),
			CredentialLifetime::Expiring(expires_at),
		));
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, BTreeSet},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::Mutex;
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError, Method, StatusCode};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _, tokio as _};
