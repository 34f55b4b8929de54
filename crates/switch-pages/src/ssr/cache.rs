//! Rendered-document cache.
//!
//! Stores fully rendered HTML strings under caller-supplied keys
//! (typically the request path). Entries carry their creation timestamp
//! and expire after the cache's TTL or on manual purge, never by
//! content hashing. A hit serves the stored string verbatim, skipping
//! the traversal entirely.

use std::collections::HashMap;
use std::time::{Duration, SystemTime};

use parking_lot::RwLock;

struct CacheEntry {
	html: String,
	created_at: SystemTime,
}

impl CacheEntry {
	fn new(html: String) -> Self {
		Self {
			html,
			created_at: SystemTime::now(),
		}
	}

	fn is_expired(&self, ttl: Duration) -> bool {
		match self.created_at.elapsed() {
			Ok(age) => age > ttl,
			// Clock went backwards; keep the entry.
			Err(_) => false,
		}
	}
}

/// A TTL cache of rendered documents.
pub struct RenderCache {
	entries: RwLock<HashMap<String, CacheEntry>>,
	ttl: Duration,
}

impl std::fmt::Debug for RenderCache {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RenderCache")
			.field("entries", &self.entries.read().len())
			.field("ttl", &self.ttl)
			.finish()
	}
}

impl RenderCache {
	/// Creates a cache whose entries live for `ttl`.
	pub fn new(ttl: Duration) -> Self {
		Self {
			entries: RwLock::new(HashMap::new()),
			ttl,
		}
	}

	/// Creates a cache with a TTL in whole seconds.
	pub fn with_ttl_seconds(ttl_seconds: u64) -> Self {
		Self::new(Duration::from_secs(ttl_seconds))
	}

	/// Reads a cached document. Expired entries miss (and stay until
	/// [`RenderCache::purge_expired`] or replacement).
	pub fn get(&self, key: &str) -> Option<String> {
		let entries = self.entries.read();
		let entry = entries.get(key)?;
		if entry.is_expired(self.ttl) {
			return None;
		}
		Some(entry.html.clone())
	}

	/// Stores a rendered document, stamping it with the current time.
	pub fn put(&self, key: impl Into<String>, html: impl Into<String>) {
		self.entries
			.write()
			.insert(key.into(), CacheEntry::new(html.into()));
	}

	/// Removes one entry.
	pub fn purge(&self, key: &str) -> bool {
		self.entries.write().remove(key).is_some()
	}

	/// Removes every expired entry.
	pub fn purge_expired(&self) {
		let ttl = self.ttl;
		self.entries.write().retain(|_, entry| !entry.is_expired(ttl));
	}

	/// Removes everything.
	pub fn clear(&self) {
		self.entries.write().clear();
	}

	/// Number of stored entries, expired ones included.
	pub fn len(&self) -> usize {
		self.entries.read().len()
	}

	/// Whether the cache holds no entries at all.
	pub fn is_empty(&self) -> bool {
		self.entries.read().is_empty()
	}
}
