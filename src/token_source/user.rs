// crates.io
use oauth2::{
	ClientId, ClientSecret, EndpointNotSet, EndpointSet, HttpClientError, RefreshToken,
	RequestTokenError, TokenResponse, TokenUrl,
	basic::{BasicClient, BasicRequestTokenError, BasicTokenResponse},
};
// self
use crate::{
	_prelude::*,
	auth::{AccessToken, TokenSecret, UserCredentials},
	config::AppConfig,
	error::{ConfigError, TransportError},
	http::{ReqwestHttpClient, ResponseMetadata, ResponseMetadataSlot},
	obs::{self, FlowKind},
	token_source::{TokenFuture, TokenSource},
};

type RefreshClient =
	BasicClient<EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

const OPERATION: &str = "refresh";

/// Access tokens expiring within this window are refreshed before use.
pub const USER_TOKEN_LEEWAY: Duration = Duration::seconds(60);

/// Token source acting on behalf of one user.
///
/// The user's current access token is returned while it is valid; otherwise a `refresh_token`
/// grant is performed and the rotated credentials replace the held ones. Callers persist them by
/// checking [`UserTokenSource::refreshed`] once they are done with the source.
#[derive(Debug)]
pub struct UserTokenSource {
	config: Arc<AppConfig>,
	http_client: ReqwestHttpClient,
	state: Mutex<UserTokenState>,
}
#[derive(Debug)]
struct UserTokenState {
	credentials: UserCredentials,
	refreshed: bool,
}
impl UserTokenSource {
	/// Creates a source holding `credentials`.
	pub fn new(
		config: Arc<AppConfig>,
		credentials: UserCredentials,
		http_client: ReqwestHttpClient,
	) -> Self {
		Self {
			config,
			http_client,
			state: Mutex::new(UserTokenState { credentials, refreshed: false }),
		}
	}

	/// Currently held credentials.
	pub fn credentials(&self) -> UserCredentials {
		self.state.lock().credentials.clone()
	}

	/// Returns the rotated credentials if a refresh happened since construction.
	pub fn refreshed(&self) -> Option<UserCredentials> {
		let state = self.state.lock();

		state.refreshed.then(|| state.credentials.clone())
	}

	async fn current_or_refresh(&self) -> Result<AccessToken> {
		let current = self.credentials();

		if !current.is_expired_at(OffsetDateTime::now_utc(), USER_TOKEN_LEEWAY) {
			return Ok(AccessToken::new(current.access_token).with_expires_at(current.expiry));
		}

		let rotated = obs::observe(FlowKind::Refresh, "refresh", self.refresh(&current)).await?;
		let token = AccessToken::new(rotated.access_token.clone()).with_expires_at(rotated.expiry);
		let mut state = self.state.lock();

		state.credentials = rotated;
		state.refreshed = true;

		Ok(token)
	}

	async fn refresh(&self, current: &UserCredentials) -> Result<UserCredentials> {
		let refresh_token = current
			.refresh_token
			.as_ref()
			.filter(|secret| !secret.is_empty())
			.ok_or(ConfigError::MissingRefreshToken)?;
		let client = self.oauth_client();
		let meta = ResponseMetadataSlot::default();
		let instrumented = self.http_client.instrumented(meta.clone());
		let refresh_secret = RefreshToken::new(refresh_token.expose().to_owned());
		let response = client
			.exchange_refresh_token(&refresh_secret)
			.request_async(&instrumented)
			.await
			.map_err(|err| map_request_error(meta.take(), err))?;

		map_refresh_response(current, response)
	}

	fn oauth_client(&self) -> RefreshClient {
		BasicClient::new(ClientId::new(self.config.client.id.clone()))
			.set_client_secret(ClientSecret::new(self.config.client.secret.expose().to_owned()))
			.set_token_uri(TokenUrl::from_url(self.config.endpoints.token.clone()))
	}
}
impl TokenSource for UserTokenSource {
	fn token(&self) -> TokenFuture<'_> {
		Box::pin(self.current_or_refresh())
	}
}

fn map_refresh_response(
	current: &UserCredentials,
	response: BasicTokenResponse,
) -> Result<UserCredentials> {
	let expires_in = response.expires_in().ok_or(ConfigError::MissingExpiresIn)?;
	let expires_in = Duration::try_from(expires_in).map_err(|_| ConfigError::ExpiresInOutOfRange)?;
	let expiry = OffsetDateTime::now_utc()
		.checked_add(expires_in)
		.ok_or(ConfigError::ExpiresInOutOfRange)?;
	let access_token = response.access_token().secret().to_owned();

	if access_token.is_empty() {
		return Err(Error::EmptyAccessToken { source_kind: OPERATION });
	}

	let refresh_token = response.refresh_token().map(|token| TokenSecret::new(token.secret()));

	Ok(current.with_refreshed(access_token, expiry, refresh_token))
}

fn map_request_error(
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<ReqwestError>>,
) -> Error {
	let status = meta.and_then(|meta| meta.status);

	match err {
		RequestTokenError::ServerResponse(response) => {
			let message = match response.error_description() {
				Some(description) => format!("{}: {description}", response.error().as_ref()),
				None => response.error().as_ref().to_owned(),
			};

			tracing::error!(?status, %message, "Refresh token grant was rejected.");

			TransportError::TokenEndpoint { message, status }.into()
		},
		RequestTokenError::Request(error) => TransportError::network(OPERATION, error).into(),
		RequestTokenError::Parse(source, _body) => Error::Decode { operation: OPERATION, source },
		RequestTokenError::Other(message) => TransportError::TokenEndpoint { message, status }.into(),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{_preludet::*, auth::UserId};

	fn source(expiry: OffsetDateTime, refresh_token: Option<TokenSecret>) -> UserTokenSource {
		let config = test_config_builder("http://127.0.0.1:1")
			.build()
			.expect("Test config should validate.");
		let credentials = UserCredentials::new(
			UserId::new("user-1").expect("User fixture should be valid."),
			expiry,
			"access-current",
			refresh_token,
		);

		UserTokenSource::new(Arc::new(config), credentials, test_reqwest_http_client())
	}

	#[tokio::test]
	async fn valid_tokens_are_returned_without_refresh() {
		let source = source(OffsetDateTime::now_utc() + Duration::hours(1), None);
		let token = source.token().await.expect("Unexpired token should be returned.");

		assert_eq!(token.secret.expose(), "access-current");
		assert!(source.refreshed().is_none());
	}

	#[tokio::test]
	async fn expired_tokens_without_refresh_secret_fail() {
		let source = source(OffsetDateTime::now_utc() + Duration::seconds(30), None);
		let err = source.token().await.expect_err("Refresh must require a refresh token.");

		assert!(matches!(err, Error::Config(ConfigError::MissingRefreshToken)));
	}
}
