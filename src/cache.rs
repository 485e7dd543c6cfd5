//! Shared cache in front of the remote document store.
//!
//! [`CacheGateway`] reads and writes a user's serialized [`AppFolderDocument`] through an
//! injected [`AppDataCache`] backend. Reads never fail: backend errors and undecodable bytes are
//! logged and reported as a miss. Writes are retried a bounded number of times and the final
//! error is returned so callers can decide whether it matters.

pub mod memory;

pub use memory::MemoryCache;

// std
use std::time::Duration as StdDuration;
// self
use crate::{_prelude::*, auth::UserId, sync::AppFolderDocument};

/// How long a cached document stays valid.
pub const APP_DATA_TTL: StdDuration = StdDuration::from_secs(4 * 60 * 60);
/// Number of `set` attempts made by [`CacheGateway::store`].
pub const STORE_ATTEMPTS: usize = 3;

/// Boxed future returned by [`AppDataCache`] operations.
pub type CacheFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, CacheError>> + 'a + Send>>;

/// Key/value backend with per-entry expiry.
pub trait AppDataCache
where
	Self: Send + Sync,
{
	/// Returns the bytes stored under `key`, or `None` when absent or expired.
	fn get<'a>(&'a self, key: &'a str) -> CacheFuture<'a, Option<Vec<u8>>>;

	/// Stores `value` under `key` for `ttl`.
	fn set<'a>(&'a self, key: &'a str, value: Vec<u8>, ttl: StdDuration) -> CacheFuture<'a, ()>;
}

/// Transient failure reported by an [`AppDataCache`] backend.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum CacheError {
	/// Backend-level failure.
	#[error("Cache backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
	/// The document could not be serialized for caching.
	#[error("Cache payload could not be serialized: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
}

/// Typed access to cached AppFolder documents.
#[derive(Clone)]
pub struct CacheGateway {
	backend: Arc<dyn AppDataCache>,
}
impl CacheGateway {
	/// Wraps a cache backend.
	pub fn new(backend: Arc<dyn AppDataCache>) -> Self {
		Self { backend }
	}

	/// Returns the cached document for `user`, or `None` on a miss.
	pub async fn fetch(&self, user: &UserId) -> Option<AppFolderDocument> {
		let key = user.cache_key();
		let bytes = match self.backend.get(&key).await {
			Ok(Some(bytes)) => bytes,
			Ok(None) => return None,
			Err(err) => {
				tracing::warn!(%user, error = %err, "Cache read failed; treating as a miss.");

				return None;
			},
		};

		match serde_json::from_slice(&bytes) {
			Ok(document) => Some(document),
			Err(err) => {
				tracing::warn!(%user, error = %err, "Cached document is undecodable; treating as a miss.");

				None
			},
		}
	}

	/// Caches `document` for `user`, retrying up to [`STORE_ATTEMPTS`] times.
	pub async fn store(&self, user: &UserId, document: &AppFolderDocument) -> Result<(), CacheError> {
		let key = user.cache_key();
		let payload = serde_json::to_vec(document)
			.map_err(|err| CacheError::Serialization { message: err.to_string() })?;
		let mut last_error = None;

		for attempt in 1..=STORE_ATTEMPTS {
			match self.backend.set(&key, payload.clone(), APP_DATA_TTL).await {
				Ok(()) => return Ok(()),
				Err(err) => {
					tracing::warn!(%user, attempt, error = %err, "Cache write failed.");

					last_error = Some(err);
				},
			}
		}

		tracing::error!(%user, attempts = STORE_ATTEMPTS, "Cache write giving up.");

		Err(last_error.unwrap_or(CacheError::Backend { message: "no attempt was made".into() }))
	}
}
impl Debug for CacheGateway {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CacheGateway").finish_non_exhaustive()
	}
}
