// crates.io
use jsonwebtoken::{Algorithm, EncodingKey, Header};
// self
use crate::{
	_prelude::*,
	auth::{AccessToken, TokenSecret},
	config::ServiceAccountConfig,
	error::ConfigError,
	http::ReqwestHttpClient,
	obs::{self, FlowKind},
	token_source::{GrantResponse, TokenFuture, TokenSource},
};

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_TTL: Duration = Duration::hours(1);

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
	iss: &'a str,
	scope: &'a str,
	aud: &'a str,
	iat: i64,
	exp: i64,
}

/// Service-account token source using a signed JWT assertion.
///
/// Construction only checks that an email and private key are present. The key is parsed and
/// the assertion signed on every [`TokenSource::token`] call.
#[derive(Clone, Debug)]
pub struct ServiceAccountSource {
	email: String,
	private_key: TokenSecret,
	scope: String,
	token_url: Url,
	http_client: ReqwestHttpClient,
}
impl ServiceAccountSource {
	/// Creates a source for `scopes`, minting tokens at `token_url`.
	pub fn new<I, S>(
		config: &ServiceAccountConfig,
		scopes: I,
		token_url: Url,
		http_client: ReqwestHttpClient,
	) -> Result<Self>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		if config.email.is_empty() || config.private_key.is_empty() {
			return Err(ConfigError::MissingServiceAccount.into());
		}

		let scope = scopes.into_iter().map(Into::into).collect::<Vec<_>>().join(" ");

		Ok(Self {
			email: config.email.clone(),
			private_key: config.private_key.clone(),
			scope,
			token_url,
			http_client,
		})
	}

	/// Signs a fresh assertion issued at `issued_at`.
	pub fn sign_assertion(&self, issued_at: OffsetDateTime) -> Result<String> {
		let key = EncodingKey::from_rsa_pem(self.private_key.expose().as_bytes())
			.map_err(ConfigError::InvalidServiceAccountKey)?;
		let claims = AssertionClaims {
			iss: &self.email,
			scope: &self.scope,
			aud: self.token_url.as_str(),
			iat: issued_at.unix_timestamp(),
			exp: (issued_at + ASSERTION_TTL).unix_timestamp(),
		};

		jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &key)
			.map_err(|err| ConfigError::InvalidServiceAccountKey(err).into())
	}

	async fn request_token(&self) -> Result<AccessToken> {
		const OPERATION: &str = "service_account";

		let assertion = self.sign_assertion(OffsetDateTime::now_utc())?;
		let request = self
			.http_client
			.post(self.token_url.clone())
			.form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())]);
		let (status, body) = self.http_client.send(OPERATION, request).await?;

		if !status.is_success() {
			return Err(Error::Remote { operation: OPERATION, status: status.as_u16() });
		}

		crate::error::decode_json::<GrantResponse>(OPERATION, &body)?.into_access_token(OPERATION)
	}
}
impl TokenSource for ServiceAccountSource {
	fn token(&self) -> TokenFuture<'_> {
		Box::pin(obs::observe(FlowKind::ServiceAccount, "token", self.request_token()))
	}
}
