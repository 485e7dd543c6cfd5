// crates.io
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
// self
use crate::{_prelude::*, auth::UserId, config::AppConfig, verify::KeySet};

#[derive(Debug, Deserialize)]
struct IdTokenClaims {
	sub: String,
}

/// Offline verifier for RS256 identity tokens.
///
/// A token is accepted only when its `kid` names a key in the [`KeySet`], its signature checks
/// out, `aud` equals the configured client id, `iss` is one of the configured issuers, `exp` lies
/// in the future, and `sub` is a valid user identifier.
#[derive(Clone, Debug)]
pub struct IdTokenVerifier {
	config: Arc<AppConfig>,
	keys: KeySet,
}
impl IdTokenVerifier {
	/// Creates a verifier bound to the configured client and issuers.
	pub fn new(config: Arc<AppConfig>, keys: KeySet) -> Self {
		Self { config, keys }
	}

	/// Verifies `token` and returns its subject.
	pub fn verify(&self, token: &str) -> Result<UserId> {
		let header = jsonwebtoken::decode_header(token)
			.map_err(|err| Error::invalid_credential(format!("malformed identity token: {err}")))?;
		let kid = header
			.kid
			.ok_or_else(|| Error::invalid_credential("identity token has no key id"))?;
		let jwk = self
			.keys
			.find(&kid)
			.ok_or_else(|| Error::invalid_credential(format!("unknown signing key {kid}")))?;
		let key = DecodingKey::from_jwk(jwk)
			.map_err(|err| Error::invalid_credential(format!("unusable signing key: {err}")))?;
		let mut validation = Validation::new(Algorithm::RS256);

		validation.set_audience(&[self.config.client.id.as_str()]);
		validation.set_issuer(&self.config.issuers);

		let data = jsonwebtoken::decode::<IdTokenClaims>(token, &key, &validation)
			.map_err(|err| Error::invalid_credential(format!("identity token rejected: {err}")))?;

		UserId::new(data.claims.sub)
			.map_err(|err| Error::invalid_credential(format!("identity token subject: {err}")))
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet::*;

	fn verifier() -> IdTokenVerifier {
		let config = test_config_builder("http://127.0.0.1:1")
			.build()
			.expect("Test config should validate.");

		IdTokenVerifier::new(Arc::new(config), test_key_set())
	}

	#[test]
	fn accepts_valid_tokens() {
		let token = sign_id_token("user-42", TEST_CLIENT_ID, TEST_ISSUER, Duration::minutes(5));
		let user = verifier().verify(&token).expect("Valid identity token should verify.");

		assert_eq!(user.as_ref(), "user-42");
	}

	#[test]
	fn rejects_wrong_audience_issuer_and_expiry() {
		let verifier = verifier();
		let cases = [
			sign_id_token("user-42", "someone-else", TEST_ISSUER, Duration::minutes(5)),
			sign_id_token("user-42", TEST_CLIENT_ID, "https://evil.example.com", Duration::minutes(5)),
			sign_id_token("user-42", TEST_CLIENT_ID, TEST_ISSUER, Duration::minutes(-10)),
		];

		for token in cases {
			assert!(matches!(verifier.verify(&token), Err(Error::InvalidCredential { .. })));
		}
	}

	#[test]
	fn rejects_opaque_and_unknown_key_tokens() {
		let verifier = IdTokenVerifier::new(verifier().config, KeySet::default());
		let token = sign_id_token("user-42", TEST_CLIENT_ID, TEST_ISSUER, Duration::minutes(5));

		assert!(matches!(verifier.verify(&token), Err(Error::InvalidCredential { .. })));
		assert!(matches!(verifier.verify("ya29.opaque"), Err(Error::InvalidCredential { .. })));
	}
}
