//! Token sources minting bearer tokens for outbound calls.
//!
//! Every source implements [`TokenSource`], the capability the rest of the crate depends on:
//!
//! - [`ClientCredentialsSource`] performs an app-only `client_credentials` grant.
//! - [`ServiceAccountSource`] signs an RS256 JWT assertion and trades it for a token.
//! - [`UserTokenSource`] hands out a user's access token, refreshing it when it expires.

mod client_credentials;
mod service_account;
mod user;

pub use client_credentials::*;
pub use service_account::*;
pub use user::*;

// self
use crate::{_prelude::*, auth::AccessToken, error::ConfigError};

/// Boxed future returned by [`TokenSource::token`].
pub type TokenFuture<'a> = Pin<Box<dyn Future<Output = Result<AccessToken>> + 'a + Send>>;

/// Capability that yields a bearer token on demand.
pub trait TokenSource
where
	Self: Send + Sync,
{
	/// Returns a token usable for the next outbound request.
	fn token(&self) -> TokenFuture<'_>;
}

#[derive(Debug, Deserialize)]
struct GrantResponse {
	#[serde(default)]
	access_token: String,
	#[serde(default)]
	expires_in: Option<i64>,
}
impl GrantResponse {
	fn into_access_token(self, source_kind: &'static str) -> Result<AccessToken> {
		if self.access_token.is_empty() {
			return Err(Error::EmptyAccessToken { source_kind });
		}

		let token = AccessToken::new(self.access_token);

		Ok(match self.expires_in.filter(|seconds| *seconds > 0) {
			Some(seconds) => {
				let expires_at = OffsetDateTime::now_utc()
					.checked_add(Duration::seconds(seconds))
					.ok_or(ConfigError::ExpiresInOutOfRange)?;

				token.with_expires_at(expires_at)
			},
			None => token,
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn grant_response_requires_access_token() {
		let empty = GrantResponse { access_token: String::new(), expires_in: Some(3600) };

		assert!(matches!(
			empty.into_access_token("client_credentials"),
			Err(Error::EmptyAccessToken { source_kind: "client_credentials" })
		));

		let token = GrantResponse { access_token: "t".into(), expires_in: None }
			.into_access_token("service_account")
			.expect("Non-empty token should be accepted.");

		assert_eq!(token.secret.expose(), "t");
		assert!(token.expires_at.is_none());
	}

	#[test]
	fn grant_response_rejects_unrepresentable_expiry() {
		let huge = GrantResponse { access_token: "t".into(), expires_in: Some(i64::MAX) };

		assert!(matches!(
			huge.into_access_token("client_credentials"),
			Err(Error::Config(ConfigError::ExpiresInOutOfRange))
		));
	}
}
