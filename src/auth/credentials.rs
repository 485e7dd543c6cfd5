//! User OAuth credentials produced by the code exchange or loaded from storage.

// self
use crate::{
	_prelude::*,
	auth::{TokenSecret, UserId},
};

/// Access/refresh token pair owned by a single request scope.
///
/// Credentials are never written to the shared cache; persisting them is the job of a
/// [`CredentialStore`](crate::store::CredentialStore).
#[derive(Clone, PartialEq, Eq)]
pub struct UserCredentials {
	/// User the tokens were issued to.
	pub user_id: UserId,
	/// Instant after which the access token is no longer accepted.
	pub expiry: OffsetDateTime,
	/// Access token secret.
	pub access_token: TokenSecret,
	/// Refresh token secret, when the provider issued one.
	pub refresh_token: Option<TokenSecret>,
}
impl UserCredentials {
	/// Creates credentials from their parts.
	pub fn new(
		user_id: UserId,
		expiry: OffsetDateTime,
		access_token: impl Into<TokenSecret>,
		refresh_token: Option<TokenSecret>,
	) -> Self {
		Self { user_id, expiry, access_token: access_token.into(), refresh_token }
	}

	/// Returns `true` if the access token is expired at `instant`, treating the final `leeway`
	/// before expiry as already expired.
	pub fn is_expired_at(&self, instant: OffsetDateTime, leeway: Duration) -> bool {
		instant + leeway >= self.expiry
	}

	/// Returns rotated credentials for the same user.
	///
	/// The existing refresh token is kept when the provider did not rotate it.
	pub fn with_refreshed(
		&self,
		access_token: impl Into<TokenSecret>,
		expiry: OffsetDateTime,
		refresh_token: Option<TokenSecret>,
	) -> Self {
		Self {
			user_id: self.user_id.clone(),
			expiry,
			access_token: access_token.into(),
			refresh_token: refresh_token.or_else(|| self.refresh_token.clone()),
		}
	}
}
impl Debug for UserCredentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("UserCredentials")
			.field("user_id", &self.user_id)
			.field("expiry", &self.expiry)
			.field("access_token", &"<redacted>")
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn credentials(expiry: OffsetDateTime) -> UserCredentials {
		UserCredentials::new(
			UserId::new("user-1").expect("User fixture should be valid."),
			expiry,
			"access-1",
			Some(TokenSecret::new("refresh-1")),
		)
	}

	#[test]
	fn expiry_honors_leeway() {
		let now = OffsetDateTime::now_utc();
		let creds = credentials(now + Duration::seconds(30));

		assert!(!creds.is_expired_at(now, Duration::ZERO));
		assert!(creds.is_expired_at(now, Duration::seconds(60)));
		assert!(creds.is_expired_at(now + Duration::seconds(30), Duration::ZERO));
	}

	#[test]
	fn refresh_keeps_existing_refresh_token() {
		let now = OffsetDateTime::now_utc();
		let rotated = credentials(now).with_refreshed("access-2", now + Duration::hours(1), None);

		assert_eq!(rotated.access_token.expose(), "access-2");
		assert_eq!(rotated.refresh_token.as_ref().map(TokenSecret::expose), Some("refresh-1"));
	}

	#[test]
	fn debug_redacts_secrets() {
		let rendered = format!("{:?}", credentials(OffsetDateTime::UNIX_EPOCH));

		assert!(!rendered.contains("access-1"));
		assert!(!rendered.contains("refresh-1"));
		assert!(rendered.contains("User(user-1)"));
	}
}
