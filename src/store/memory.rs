//! Thread-safe in-memory [`CredentialStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::{UserCredentials, UserId},
	store::{CredentialStore, StoreFuture},
};

type CredentialMap = Arc<RwLock<HashMap<UserId, UserCredentials>>>;

/// Credential store that keeps records in-process.
#[derive(Clone, Debug, Default)]
pub struct MemoryCredentialStore(CredentialMap);
impl MemoryCredentialStore {
	/// Number of users with stored credentials.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when no credentials are stored.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}
}
impl CredentialStore for MemoryCredentialStore {
	fn fetch<'a>(&'a self, user: &'a UserId) -> StoreFuture<'a, Option<UserCredentials>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.read().get(user).cloned()) })
	}

	fn save(&self, credentials: UserCredentials) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			map.write().insert(credentials.user_id.clone(), credentials);

			Ok(())
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::store::require_credentials;

	fn credentials(user: &str, access: &str) -> UserCredentials {
		UserCredentials::new(
			UserId::new(user).expect("User fixture should be valid."),
			OffsetDateTime::now_utc() + Duration::hours(1),
			access,
			None,
		)
	}

	#[tokio::test]
	async fn save_replaces_previous_credentials() {
		let store = MemoryCredentialStore::default();

		store.save(credentials("user-1", "first")).await.expect("Save should succeed.");
		store.save(credentials("user-1", "second")).await.expect("Save should succeed.");

		let user = UserId::new("user-1").expect("User fixture should be valid.");
		let stored = require_credentials(&store, &user).await.expect("Credentials should exist.");

		assert_eq!(stored.access_token.expose(), "second");
		assert_eq!(store.len(), 1);
	}

	#[tokio::test]
	async fn missing_credentials_are_reported() {
		let store = MemoryCredentialStore::default();
		let user = UserId::new("nobody").expect("User fixture should be valid.");
		let err = require_credentials(&store, &user).await.expect_err("Lookup must fail.");

		assert!(matches!(err, Error::CredentialsNotFound { user } if user == "nobody"));
	}
}
