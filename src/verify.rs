//! Bearer credential verification.
//!
//! [`TokenVerifier`] turns a raw `Authorization` header into a [`VerifiedIdentity`]. The token is
//! tried against each [`VerificationMethod`] in [`VerificationMethod::ORDERED`]: the signed
//! identity token arm first (offline, no network), then opaque access-token introspection. The
//! first arm that succeeds wins; if none does, every failure is folded into
//! [`Error::InvalidCredential`] so no partial trust is ever granted.

mod id_token;
mod introspect;
mod keys;

pub use id_token::*;
pub use introspect::*;
pub use keys::*;

// self
use crate::{
	_prelude::*,
	auth::{UserId, VerificationMethod, VerifiedIdentity},
	config::AppConfig,
	http::ReqwestHttpClient,
};

const BEARER_PREFIX: &str = "bearer ";

/// Extracts the token from an `Authorization` header value.
///
/// A missing or empty header, or one without the case-insensitive `bearer ` scheme prefix,
/// yields [`Error::MissingCredential`].
pub fn parse_bearer(header: Option<&str>) -> Result<&str> {
	let header = header.filter(|value| !value.is_empty()).ok_or(Error::MissingCredential)?;

	match header.get(..BEARER_PREFIX.len()) {
		Some(scheme) if scheme.eq_ignore_ascii_case(BEARER_PREFIX) =>
			Ok(&header[BEARER_PREFIX.len()..]),
		_ => Err(Error::MissingCredential),
	}
}

/// Verifies bearer credentials against the configured identity provider.
#[derive(Clone, Debug)]
pub struct TokenVerifier {
	id_tokens: IdTokenVerifier,
	introspector: Introspector,
}
impl TokenVerifier {
	/// Creates a verifier from shared configuration, the provider's signing keys, and the
	/// transport used for introspection.
	pub fn new(config: Arc<AppConfig>, keys: KeySet, http_client: ReqwestHttpClient) -> Self {
		Self {
			id_tokens: IdTokenVerifier::new(config.clone(), keys),
			introspector: Introspector::new(config, http_client),
		}
	}

	/// Parses the header and verifies the carried token.
	pub async fn authenticate(&self, header: Option<&str>) -> Result<VerifiedIdentity> {
		let token = parse_bearer(header)?;

		self.verify(token).await
	}

	/// Verifies `token`, trying each verification arm in order.
	pub async fn verify(&self, token: &str) -> Result<VerifiedIdentity> {
		let mut reasons = Vec::with_capacity(VerificationMethod::ORDERED.len());

		for method in VerificationMethod::ORDERED {
			match self.verify_with(method, token).await {
				Ok(user_id) => return Ok(VerifiedIdentity::new(user_id, method)),
				Err(err) => {
					tracing::debug!(method = method.as_str(), error = %err, "Verification arm failed.");

					reasons.push(format!("{method}: {err}"));
				},
			}
		}

		Err(Error::invalid_credential(reasons.join("; ")))
	}

	/// Verifies `token` using a single arm.
	pub async fn verify_with(&self, method: VerificationMethod, token: &str) -> Result<UserId> {
		match method {
			VerificationMethod::IdToken => self.id_tokens.verify(token),
			VerificationMethod::AccessToken => self.introspector.verify(token).await,
		}
	}
}
