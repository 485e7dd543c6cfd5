//! In-process [`AppDataCache`] honouring per-entry expiry.

// std
use std::time::{Duration as StdDuration, Instant};
// self
use crate::{
	_prelude::*,
	cache::{AppDataCache, CacheFuture},
};

type EntryMap = Arc<RwLock<HashMap<String, (Vec<u8>, Instant)>>>;

/// Cache backend for tests and local development.
#[derive(Clone, Debug, Default)]
pub struct MemoryCache(EntryMap);
impl MemoryCache {
	/// Number of stored entries, expired ones included.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when no entries are stored.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}
}
impl AppDataCache for MemoryCache {
	fn get<'a>(&'a self, key: &'a str) -> CacheFuture<'a, Option<Vec<u8>>> {
		let map = self.0.clone();

		Box::pin(async move {
			let now = Instant::now();

			Ok(map
				.read()
				.get(key)
				.filter(|(_, expires_at)| *expires_at > now)
				.map(|(value, _)| value.clone()))
		})
	}

	fn set<'a>(&'a self, key: &'a str, value: Vec<u8>, ttl: StdDuration) -> CacheFuture<'a, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			map.write().insert(key.to_owned(), (value, Instant::now() + ttl));

			Ok(())
		})
	}
}
