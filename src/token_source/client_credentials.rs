// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	config::AppOnlyConfig,
	error::ConfigError,
	http::ReqwestHttpClient,
	obs::{self, FlowKind},
	token_source::{GrantResponse, TokenFuture, TokenSource},
};

/// App-only token source using the `client_credentials` grant with HTTP Basic authentication.
#[derive(Clone, Debug)]
pub struct ClientCredentialsSource {
	authorization: TokenSecret,
	token_url: Url,
	http_client: ReqwestHttpClient,
}
impl ClientCredentialsSource {
	/// Creates a source from app-only credentials.
	///
	/// An empty key or secret is rejected here, before any network call is made.
	pub fn new(config: &AppOnlyConfig, http_client: ReqwestHttpClient) -> Result<Self> {
		if config.key.is_empty() || config.secret.is_empty() {
			return Err(ConfigError::MissingAppCredentials.into());
		}

		let basic = STANDARD.encode(format!("{}:{}", config.key, config.secret.expose()));

		Ok(Self {
			authorization: TokenSecret::new(format!("Basic {basic}")),
			token_url: config.token_url.clone(),
			http_client,
		})
	}

	async fn request_token(&self) -> Result<crate::auth::AccessToken> {
		const OPERATION: &str = "client_credentials";

		let request = self
			.http_client
			.post(self.token_url.clone())
			.header(reqwest::header::AUTHORIZATION, self.authorization.expose())
			.form(&[("grant_type", "client_credentials")]);
		let (status, body) = self.http_client.send(OPERATION, request).await?;

		if status != StatusCode::OK {
			return Err(Error::Remote { operation: OPERATION, status: status.as_u16() });
		}

		crate::error::decode_json::<GrantResponse>(OPERATION, &body)?.into_access_token(OPERATION)
	}
}
impl TokenSource for ClientCredentialsSource {
	fn token(&self) -> TokenFuture<'_> {
		Box::pin(obs::observe(FlowKind::ClientCredentials, "token", self.request_token()))
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet::*;

	fn app_only(key: &str, secret: &str) -> AppOnlyConfig {
		AppOnlyConfig {
			key: key.into(),
			secret: secret.into(),
			token_url: Url::parse("https://api.example.com/oauth2/token")
				.expect("Token URL fixture should parse."),
		}
	}

	#[test]
	fn empty_key_or_secret_is_rejected() {
		for (key, secret) in [("", "secret"), ("key", ""), ("", "")] {
			assert!(matches!(
				ClientCredentialsSource::new(&app_only(key, secret), test_reqwest_http_client()),
				Err(Error::Config(ConfigError::MissingAppCredentials))
			));
		}
	}

	#[test]
	fn authorization_header_uses_basic_scheme() {
		let source = ClientCredentialsSource::new(&app_only("key", "secret"), test_reqwest_http_client())
			.expect("Complete app-only credentials should build a source.");

		assert_eq!(source.authorization.expose(), "Basic a2V5OnNlY3JldA==");
	}
}
