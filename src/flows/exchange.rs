//! One-time authorization code exchange.
//!
//! The browser client hands the backend a single-use code (obtained with the `postmessage`
//! redirect). [`Broker::exchange_code`] redeems it for user credentials and then re-verifies the
//! returned tokens so credentials are only released for the user already verified on the
//! request.

// self
use crate::{
	_prelude::*,
	auth::{TokenSecret, UserCredentials, VerificationMethod, VerifiedIdentity},
	error::ConfigError,
	flows::Broker,
	http,
	obs::{self, FlowKind},
};

const REDIRECT_URI: &str = "postmessage";

#[derive(Debug, Deserialize)]
struct CodeExchangeResponse {
	#[serde(default)]
	access_token: String,
	#[serde(default)]
	refresh_token: String,
	#[serde(default)]
	id_token: String,
	#[serde(default)]
	expires_in: i64,
}

impl Broker {
	/// Exchanges a one-time authorization `code` for credentials belonging to `identity`.
	///
	/// The exchange is never retried. A non-success answer from the token endpoint is logged with
	/// its body and surfaced as [`Error::Remote`]; tokens issued to any user other than
	/// `identity` yield [`Error::IdentityMismatch`].
	pub async fn exchange_code(
		&self,
		identity: &VerifiedIdentity,
		code: &str,
	) -> Result<UserCredentials> {
		obs::observe(FlowKind::CodeExchange, "exchange_code", async move {
			const OPERATION: &str = "exchange_code";

			let request = self.http_client.post(self.config.endpoints.token.clone()).form(&[
				("code", code),
				("client_id", self.config.client.id.as_str()),
				("client_secret", self.config.client.secret.expose()),
				("redirect_uri", REDIRECT_URI),
				("grant_type", "authorization_code"),
			]);
			let (status, body) = self.http_client.send(OPERATION, request).await?;

			if !status.is_success() {
				tracing::error!(
					status = status.as_u16(),
					body = %http::body_preview(&body),
					"Authorization code exchange was rejected."
				);

				return Err(Error::Remote { operation: OPERATION, status: status.as_u16() });
			}

			let response: CodeExchangeResponse = crate::error::decode_json(OPERATION, &body)?;
			let (method, token) = if response.id_token.is_empty() {
				(VerificationMethod::AccessToken, response.access_token.as_str())
			} else {
				(VerificationMethod::IdToken, response.id_token.as_str())
			};
			let user_id = self.verifier.verify_with(method, token).await.map_err(|err| match err {
				Error::InvalidCredential { .. } => err,
				other => Error::invalid_credential(format!("exchanged {method} rejected: {other}")),
			})?;

			if &user_id != identity.user_id() {
				tracing::warn!(
					target: "security",
					expected = %identity.user_id(),
					actual = %user_id,
					"Exchanged credentials belong to a different user."
				);

				return Err(Error::IdentityMismatch {
					expected: identity.user_id().to_string(),
					actual: user_id.to_string(),
				});
			}

			let expires_in = Duration::seconds(response.expires_in);
			let expiry = OffsetDateTime::now_utc()
				.checked_add(expires_in)
				.ok_or(ConfigError::ExpiresInOutOfRange)?;
			let refresh_token = Some(response.refresh_token)
				.filter(|secret| !secret.is_empty())
				.map(TokenSecret::new);

			Ok(UserCredentials::new(user_id, expiry, response.access_token, refresh_token))
		})
		.await
	}
}
