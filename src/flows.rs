//! Request-scoped flows exposed through the [`Broker`] facade.

pub mod exchange;

pub use exchange::*;

// self
use crate::{
	_prelude::*,
	auth::{UserCredentials, VerifiedIdentity},
	cache::AppDataCache,
	config::AppConfig,
	error::ConfigError,
	http::ReqwestHttpClient,
	obs::{self, FlowKind},
	store::CredentialStore,
	sync::AppFolderSync,
	token_source::{ClientCredentialsSource, ServiceAccountSource, UserTokenSource},
	verify::{KeySet, TokenVerifier},
};

/// Coordinates verification, code exchange, and token-source construction for one application.
///
/// The broker owns the shared configuration, the HTTP transport, and the bearer verifier so
/// individual flows can focus on their own request logic. Cloning is cheap; every field is
/// reference-counted or a handle.
#[derive(Clone, Debug)]
pub struct Broker {
	/// Immutable process-wide configuration.
	pub config: Arc<AppConfig>,
	/// HTTP client wrapper used for every outbound request.
	pub http_client: ReqwestHttpClient,
	/// Bearer credential verifier.
	pub verifier: TokenVerifier,
}
impl Broker {
	/// Creates a broker with a default reqwest transport.
	pub fn new(config: Arc<AppConfig>, keys: KeySet) -> Result<Self> {
		let client = ReqwestClient::builder().build().map_err(ConfigError::http_client_build)?;

		Ok(Self::with_http_client(config, keys, ReqwestHttpClient::with_client(client)))
	}

	/// Creates a broker that reuses the caller-provided transport.
	pub fn with_http_client(
		config: Arc<AppConfig>,
		keys: KeySet,
		http_client: ReqwestHttpClient,
	) -> Self {
		let verifier = TokenVerifier::new(config.clone(), keys, http_client.clone());

		Self { config, http_client, verifier }
	}

	/// Verifies the `Authorization` header of an inbound request.
	pub async fn authenticate(&self, header: Option<&str>) -> Result<VerifiedIdentity> {
		obs::observe(FlowKind::Authenticate, "authenticate", self.verifier.authenticate(header))
			.await
	}

	/// App-only token source backed by the configured consumer key and secret.
	pub fn client_credentials_source(&self) -> Result<ClientCredentialsSource> {
		ClientCredentialsSource::new(&self.config.app_only, self.http_client.clone())
	}

	/// Service-account token source for `scopes`.
	pub fn service_account_source<I, S>(&self, scopes: I) -> Result<ServiceAccountSource>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		ServiceAccountSource::new(
			&self.config.service_account,
			scopes,
			self.config.endpoints.token.clone(),
			self.http_client.clone(),
		)
	}

	/// Token source acting on behalf of the user who owns `credentials`.
	pub fn user_token_source(&self, credentials: UserCredentials) -> UserTokenSource {
		UserTokenSource::new(self.config.clone(), credentials, self.http_client.clone())
	}

	/// AppFolder sync service sharing this broker's configuration and transport.
	pub fn app_folder_sync(
		&self,
		cache: Arc<dyn AppDataCache>,
		credentials: Arc<dyn CredentialStore>,
	) -> AppFolderSync {
		AppFolderSync::new(self.config.clone(), self.http_client.clone(), cache, credentials)
	}
}
