// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-process read cache for grant tables.
//!
//! Entries are invalidated synchronously after a committed write. Every
//! invalidation bumps a generation counter; a loader records the generation
//! before reading storage and only populates the cache if no invalidation
//! happened in between, so a read that raced a write cannot reinstate
//! pre-write data.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

pub struct KeyedCache<K, V> {
	entries: RwLock<HashMap<K, Arc<V>>>,
	generation: AtomicU64,
	enabled: bool,
}

impl<K, V> KeyedCache<K, V>
where
	K: Eq + Hash + Copy,
{
	pub fn new(enabled: bool) -> Self {
		Self {
			entries: RwLock::new(HashMap::new()),
			generation: AtomicU64::new(0),
			enabled,
		}
	}

	pub fn is_enabled(&self) -> bool {
		self.enabled
	}

	pub fn get(&self, key: &K) -> Option<Arc<V>> {
		if !self.enabled {
			return None;
		}
		self.entries.read().get(key).cloned()
	}

	/// Read before loading from storage; pass to [`Self::insert_if_current`].
	pub fn generation(&self) -> u64 {
		self.generation.load(Ordering::Acquire)
	}

	/// Caches `value` unless the cache was invalidated after `generation`
	/// was observed. Returns whether the value was stored.
	pub fn insert_if_current(&self, key: K, value: Arc<V>, generation: u64) -> bool {
		if !self.enabled {
			return false;
		}
		let mut entries = self.entries.write();
		// Checked under the write lock: invalidate() bumps the counter while
		// holding the same lock.
		if self.generation.load(Ordering::Acquire) != generation {
			return false;
		}
		entries.insert(key, value);
		true
	}

	pub fn invalidate(&self, key: &K) {
		let mut entries = self.entries.write();
		self.generation.fetch_add(1, Ordering::AcqRel);
		entries.remove(key);
	}

	pub fn clear(&self) {
		let mut entries = self.entries.write();
		self.generation.fetch_add(1, Ordering::AcqRel);
		entries.clear();
	}

	pub fn len(&self) -> usize {
		self.entries.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.read().is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_insert_and_get() {
		let cache: KeyedCache<u32, String> = KeyedCache::new(true);
		let generation = cache.generation();
		assert!(cache.insert_if_current(1, Arc::new("one".to_string()), generation));
		assert_eq!(cache.get(&1).as_deref().map(String::as_str), Some("one"));
		assert!(cache.get(&2).is_none());
	}

	#[test]
	fn test_invalidate_removes_entry() {
		let cache: KeyedCache<u32, u32> = KeyedCache::new(true);
		cache.insert_if_current(1, Arc::new(10), cache.generation());
		cache.invalidate(&1);
		assert!(cache.get(&1).is_none());
	}

	#[test]
	fn test_stale_load_is_not_cached() {
		let cache: KeyedCache<u32, u32> = KeyedCache::new(true);

		// A reader starts loading, then a writer commits and invalidates
		// before the reader finishes.
		let generation = cache.generation();
		cache.invalidate(&1);

		assert!(!cache.insert_if_current(1, Arc::new(10), generation));
		assert!(cache.get(&1).is_none());
	}

	#[test]
	fn test_disabled_cache_stores_nothing() {
		let cache: KeyedCache<u32, u32> = KeyedCache::new(false);
		assert!(!cache.insert_if_current(1, Arc::new(10), cache.generation()));
		assert!(cache.get(&1).is_none());
		assert!(cache.is_empty());
	}

	#[test]
	fn test_clear() {
		let cache: KeyedCache<u32, u32> = KeyedCache::new(true);
		cache.insert_if_current(1, Arc::new(10), cache.generation());
		cache.insert_if_current(2, Arc::new(20), cache.generation());
		assert_eq!(cache.len(), 2);
		cache.clear();
		assert!(cache.is_empty());
	}
}
