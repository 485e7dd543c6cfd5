//! Request-scoped identity verification, OAuth credential exchange, and cache-coherent
//! AppFolder document sync for companion app backends.
//!
//! The crate verifies inbound bearer credentials, redeems one-time authorization codes for
//! user credentials, mints app-level service tokens, and keeps a small per-user JSON document in
//! step between a shared cache and the user's private application folder in a remote document
//! store.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod cache;
pub mod config;
pub mod drive;
pub mod error;
pub mod flows;
pub mod http;
pub mod obs;
pub mod store;
pub mod sync;
pub mod token_source;
pub mod verify;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		config::{AppConfig, AppConfigBuilder},
		flows::Broker,
		http::ReqwestHttpClient,
		verify::KeySet,
	};

	/// Client identifier used by mock-backed fixtures.
	pub const TEST_CLIENT_ID: &str = "client-it.apps.example.com";
	/// Client secret used by mock-backed fixtures.
	pub const TEST_CLIENT_SECRET: &str = "secret-it";
	/// Key identifier of the RSA fixture key published in [`TEST_JWKS`].
	pub const TEST_KEY_ID: &str = "fixture-key";
	/// PKCS#8 RSA private key used to sign identity tokens and service-account assertions.
	pub const TEST_PRIVATE_KEY_PEM: &str = include_str!("../tests/fixtures/service_account.pem");
	/// JWKS document publishing the public half of [`TEST_PRIVATE_KEY_PEM`].
	pub const TEST_JWKS: &str = include_str!("../tests/fixtures/jwks.json");
	/// Issuer stamped into fixture identity tokens.
	pub const TEST_ISSUER: &str = "https://accounts.google.com";

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Returns the fixture key set.
	pub fn test_key_set() -> KeySet {
		KeySet::from_jwks_json(TEST_JWKS).expect("Fixture JWKS should parse.")
	}

	/// Returns a config builder whose every endpoint points at `base` (an `httpmock` server URL).
	pub fn test_config_builder(base: &str) -> AppConfigBuilder {
		let url = |path: &str| {
			Url::parse(&format!("{base}{path}")).expect("Mock endpoint URL should parse.")
		};

		AppConfig::builder(TEST_CLIENT_ID)
			.client_secret(TEST_CLIENT_SECRET)
			.token_endpoint(url("/token"))
			.token_info_endpoint(url("/tokeninfo"))
			.certs_endpoint(url("/certs"))
			.issuer(TEST_ISSUER)
			.drive_files_endpoint(url("/drive/v2/files"))
			.drive_upload_endpoint(url("/upload/drive/v2/files"))
			.drive_filename("user_data.json")
			.app_only_token_endpoint(url("/oauth2/token"))
	}

	/// Constructs a [`Broker`] whose endpoints all point at `base`, verifying identity tokens
	/// against the fixture key set.
	pub fn build_reqwest_test_broker(base: &str) -> Broker {
		let config = test_config_builder(base).build().expect("Test config should validate.");

		Broker::with_http_client(Arc::new(config), test_key_set(), test_reqwest_http_client())
	}

	/// Signs an RS256 identity token with the fixture key.
	pub fn sign_id_token(subject: &str, audience: &str, issuer: &str, ttl: Duration) -> String {
		let now = OffsetDateTime::now_utc();
		let claims = serde_json::json!({
			"iss": issuer,
			"aud": audience,
			"sub": subject,
			"iat": now.unix_timestamp(),
			"exp": (now + ttl).unix_timestamp(),
		});
		let mut header = jsonwebtoken::Header::new(jsonwebtoken::Algorithm::RS256);

		header.kid = Some(TEST_KEY_ID.into());

		let key = jsonwebtoken::EncodingKey::from_rsa_pem(TEST_PRIVATE_KEY_PEM.as_bytes())
			.expect("Fixture private key should parse.");

		jsonwebtoken::encode(&header, &claims, &key).expect("Fixture token should sign.")
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError, StatusCode};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
#[cfg(test)] use {appfolder_sync as _, color_eyre as _, httpmock as _};
