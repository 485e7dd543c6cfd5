//! Process-wide immutable configuration injected at startup.
//!
//! [`AppConfig`] carries the application's OAuth client, identity-provider endpoints, accepted
//! identity-token issuers, remote document store endpoints, and the secret material for the
//! app-level token sources. It is validated once by [`AppConfigBuilder::build`] and then shared
//! read-only as `Arc<AppConfig>`; nothing in the crate reads configuration from globals.

/// Builder API for assembling validated configuration.
pub mod builder;

pub use builder::*;

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Application OAuth client registered with the identity provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
	/// Client identifier; identity tokens must carry it as audience.
	pub id: String,
	/// Client secret used by the code exchange and refresh grants.
	pub secret: TokenSecret,
}

/// Identity-provider endpoints.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityEndpoints {
	/// Token endpoint (code exchange, refresh, service-account grants).
	pub token: Url,
	/// Access-token introspection endpoint.
	pub token_info: Url,
	/// JWKS endpoint publishing identity-token signing keys.
	pub certs: Url,
}

/// Remote document store settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveConfig {
	/// Files listing endpoint.
	pub files: Url,
	/// Multipart upload endpoint.
	pub upload: Url,
	/// Well-known title of the per-user document inside the application folder.
	pub filename: String,
}

/// Service-account credentials for app-level calls.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceAccountConfig {
	/// Service account email used as the assertion issuer.
	pub email: String,
	/// PEM-encoded RSA private key.
	pub private_key: TokenSecret,
}

/// App-only (client-credentials) settings for a third-party API.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppOnlyConfig {
	/// Consumer key.
	pub key: String,
	/// Consumer secret.
	pub secret: TokenSecret,
	/// Token endpoint for the client-credentials grant.
	pub token_url: Url,
}

/// Validated configuration shared by every component.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
	/// Application OAuth client.
	pub client: ClientConfig,
	/// Identity-provider endpoints.
	pub endpoints: IdentityEndpoints,
	/// Accepted `iss` values for identity tokens.
	pub issuers: Vec<String>,
	/// Remote document store settings.
	pub drive: DriveConfig,
	/// Service-account credentials; empty fields are rejected when a token is requested.
	#[serde(default)]
	pub service_account: ServiceAccountConfig,
	/// App-only credentials; empty fields are rejected when a token is requested.
	pub app_only: AppOnlyConfig,
}
impl AppConfig {
	/// Creates a new builder for the provided client identifier.
	pub fn builder(client_id: impl Into<String>) -> AppConfigBuilder {
		AppConfigBuilder::new(client_id)
	}

	/// Validates a deserialized configuration.
	pub fn validated(self) -> Result<Self, ConfigValidationError> {
		self.validate()?;

		Ok(self)
	}
}
