//! Credential persistence contract and the built-in in-memory store.

pub mod memory;

pub use memory::MemoryCredentialStore;

// self
use crate::{
	_prelude::*,
	auth::{UserCredentials, UserId},
};

/// Boxed future returned by [`CredentialStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend holding per-user OAuth credentials.
pub trait CredentialStore
where
	Self: Send + Sync,
{
	/// Fetches the credentials stored for `user`, if any.
	fn fetch<'a>(&'a self, user: &'a UserId) -> StoreFuture<'a, Option<UserCredentials>>;

	/// Persists or replaces the credentials for their user.
	fn save(&self, credentials: UserCredentials) -> StoreFuture<'_, ()>;
}

/// Error type produced by [`CredentialStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Looks up `user`'s credentials, treating absence as [`Error::CredentialsNotFound`].
pub async fn require_credentials(
	store: &dyn CredentialStore,
	user: &UserId,
) -> Result<UserCredentials> {
	store
		.fetch(user)
		.await?
		.ok_or_else(|| Error::CredentialsNotFound { user: user.to_string() })
}
