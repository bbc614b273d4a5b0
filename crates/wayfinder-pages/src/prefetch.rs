//! Prefetch cache keyed by canonical URL.
//!
//! Each URL resolves through exactly one shared future. Hovering a link,
//! clicking it and calling `prefetch` programmatically all await the same
//! preload, so at most one data request is made per URL.
//!
//! A new entry is polled once as it is created, so its preload starts (and
//! issues its first data request) before anyone awaits it. Later steps run
//! when the entry is awaited or spawned by the host.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use futures::FutureExt;
use futures::future::{LocalBoxFuture, Shared};
use tracing::debug;
use url::Url;

use crate::fetch::request_key;
use crate::preload::PreloadOutcome;

/// A preload future that may be awaited by any number of callers.
pub type SharedPreload = Shared<LocalBoxFuture<'static, PreloadOutcome>>;

/// Cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PrefetchStatistics {
	/// Lookups answered by an existing entry.
	pub hits: u64,
	/// Lookups that created an entry.
	pub misses: u64,
	/// Current number of entries.
	pub entry_count: usize,
}

impl PrefetchStatistics {
	/// Calculates the hit rate (0.0 to 1.0).
	pub fn hit_rate(&self) -> f64 {
		let total = self.hits + self.misses;
		if total == 0 {
			0.0
		} else {
			self.hits as f64 / total as f64
		}
	}
}

/// Canonical cache key: path plus non-empty query, without fragment.
pub fn canonical_key(url: &Url) -> String {
	request_key(url)
}

/// Single-resolution cache of preload futures.
///
/// Entries are never evicted by the engine; callers may
/// [`invalidate`](Self::invalidate) or [`clear`](Self::clear).
#[derive(Default)]
pub struct PrefetchCache {
	entries: RefCell<HashMap<String, SharedPreload>>,
	hits: Cell<u64>,
	misses: Cell<u64>,
}

impl std::fmt::Debug for PrefetchCache {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("PrefetchCache")
			.field("entries", &self.len())
			.field("hits", &self.hits.get())
			.field("misses", &self.misses.get())
			.finish()
	}
}

impl PrefetchCache {
	/// Creates an empty cache.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the entry for `url`, creating it with `factory` if absent.
	///
	/// `factory` runs at most once per key while the entry exists. A newly
	/// created entry is polled once before it is returned.
	pub fn get_or_create<F>(&self, url: &Url, factory: F) -> SharedPreload
	where
		F: FnOnce() -> LocalBoxFuture<'static, PreloadOutcome>,
	{
		let key = canonical_key(url);
		if let Some(existing) = self.entries.borrow().get(&key) {
			self.hits.set(self.hits.get() + 1);
			debug!(key = %key, "prefetch cache hit");
			return existing.clone();
		}

		self.misses.set(self.misses.get() + 1);
		debug!(key = %key, "prefetch cache miss");
		let shared = factory().shared();
		self.entries.borrow_mut().insert(key, shared.clone());
		if shared.clone().now_or_never().is_some() {
			debug!("preload resolved on first poll");
		}
		shared
	}

	/// Stores an already resolved outcome for `url`.
	pub fn seed(&self, url: &Url, outcome: PreloadOutcome) {
		let shared = futures::future::ready(outcome).boxed_local().shared();
		self.entries
			.borrow_mut()
			.insert(canonical_key(url), shared);
	}

	/// Returns whether `url` has an entry.
	pub fn contains(&self, url: &Url) -> bool {
		self.entries.borrow().contains_key(&canonical_key(url))
	}

	/// Removes the entry for `url`, returning whether one existed.
	pub fn invalidate(&self, url: &Url) -> bool {
		self.entries
			.borrow_mut()
			.remove(&canonical_key(url))
			.is_some()
	}

	/// Removes every entry.
	pub fn clear(&self) {
		self.entries.borrow_mut().clear();
	}

	/// Returns the number of entries.
	pub fn len(&self) -> usize {
		self.entries.borrow().len()
	}

	/// Returns whether the cache is empty.
	pub fn is_empty(&self) -> bool {
		self.entries.borrow().is_empty()
	}

	/// Returns hit/miss statistics.
	pub fn statistics(&self) -> PrefetchStatistics {
		PrefetchStatistics {
			hits: self.hits.get(),
			misses: self.misses.get(),
			entry_count: self.len(),
		}
	}
}
