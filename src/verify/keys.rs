// crates.io
use jsonwebtoken::jwk::{Jwk, JwkSet};
// self
use crate::{_prelude::*, error::ConfigError, http::ReqwestHttpClient};

/// Immutable set of identity-token signing keys.
///
/// Keys are loaded once (typically at startup via [`KeySet::fetch`]) and shared read-only, so
/// identity-token verification never needs an outbound call. Rotating keys means building a new
/// set and a new verifier.
#[derive(Clone, Debug)]
pub struct KeySet(Arc<JwkSet>);
impl KeySet {
	/// Wraps an already-parsed JWKS document.
	pub fn new(keys: JwkSet) -> Self {
		Self(Arc::new(keys))
	}

	/// Parses a JWKS JSON document.
	pub fn from_jwks_json(json: &str) -> Result<Self, ConfigError> {
		serde_json::from_str(json).map(Self::new).map_err(ConfigError::InvalidKeySet)
	}

	/// Downloads the JWKS document published at `certs_url`.
	pub async fn fetch(http_client: &ReqwestHttpClient, certs_url: &Url) -> Result<Self> {
		const OPERATION: &str = "certs";

		let (status, body) = http_client.send(OPERATION, http_client.get(certs_url.clone())).await?;

		if !status.is_success() {
			return Err(Error::Remote { operation: OPERATION, status: status.as_u16() });
		}

		let keys: JwkSet = crate::error::decode_json(OPERATION, &body)?;

		tracing::info!(keys = keys.keys.len(), "Loaded identity token signing keys.");

		Ok(Self::new(keys))
	}

	/// Looks up a key by its `kid`.
	pub fn find(&self, kid: &str) -> Option<&Jwk> {
		self.0.find(kid)
	}

	/// Number of keys in the set.
	pub fn len(&self) -> usize {
		self.0.keys.len()
	}

	/// Returns `true` when the set holds no keys.
	pub fn is_empty(&self) -> bool {
		self.0.keys.is_empty()
	}
}
impl Default for KeySet {
	fn default() -> Self {
		Self::new(JwkSet { keys: Vec::new() })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet::TEST_JWKS;

	#[test]
	fn parses_fixture_and_finds_key() {
		let keys = KeySet::from_jwks_json(TEST_JWKS).expect("Fixture JWKS should parse.");

		assert_eq!(keys.len(), 1);
		assert!(keys.find("fixture-key").is_some());
		assert!(keys.find("rotated-away").is_none());
	}

	#[test]
	fn rejects_malformed_documents() {
		assert!(matches!(KeySet::from_jwks_json("{\"keys\":42}"), Err(ConfigError::InvalidKeySet(_))));
		assert!(KeySet::default().is_empty());
	}
}
