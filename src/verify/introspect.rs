// self
use crate::{_prelude::*, auth::UserId, config::AppConfig, http::ReqwestHttpClient};

#[derive(Debug, Deserialize)]
struct TokenInfo {
	#[serde(default)]
	issued_to: String,
	#[serde(default)]
	user_id: String,
	#[serde(default)]
	expires_in: i64,
}

/// Verifies opaque access tokens through the identity provider's token-info endpoint.
#[derive(Clone, Debug)]
pub struct Introspector {
	config: Arc<AppConfig>,
	http_client: ReqwestHttpClient,
}
impl Introspector {
	/// Creates an introspector bound to the configured client.
	pub fn new(config: Arc<AppConfig>, http_client: ReqwestHttpClient) -> Self {
		Self { config, http_client }
	}

	/// Introspects `token` and returns the user it was issued for.
	///
	/// The endpoint must answer `200 OK` with a token issued to this application's client that
	/// has not yet expired.
	pub async fn verify(&self, token: &str) -> Result<UserId> {
		const OPERATION: &str = "tokeninfo";

		let request = self
			.http_client
			.post(self.config.endpoints.token_info.clone())
			.form(&[("access_token", token)]);
		let (status, body) = self.http_client.send(OPERATION, request).await?;

		if status != StatusCode::OK {
			return Err(Error::invalid_credential(format!("token info endpoint answered {status}")));
		}

		let info: TokenInfo = crate::error::decode_json(OPERATION, &body)?;

		if info.issued_to != self.config.client.id {
			return Err(Error::invalid_credential(format!(
				"access token issued to {:?}, not this client",
				info.issued_to
			)));
		}
		if info.expires_in <= 0 {
			return Err(Error::invalid_credential("access token expired"));
		}

		UserId::new(&info.user_id)
			.map_err(|err| Error::invalid_credential(format!("token info user id: {err}")))
	}
}
