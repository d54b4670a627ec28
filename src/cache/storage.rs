//! Cache storage trait and in-memory implementation.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A single cached entry, stored as serialized JSON.
#[derive(Debug, Clone)]
pub struct CachedEntry {
  pub value: Value,
  /// When the entry was written
  pub cached_at: DateTime<Utc>,
}

/// Trait for cache storage backends.
pub trait CacheStorage: Send + Sync {
  /// Get an entry by key.
  fn get(&self, key: &str) -> Option<CachedEntry>;

  /// Store an entry, replacing any previous value.
  fn store(&self, key: &str, value: Value);

  /// Remove an entry. Returns whether one existed.
  fn remove(&self, key: &str) -> bool;

  /// Remove every entry whose key starts with `prefix`. Returns how many.
  fn remove_prefix(&self, prefix: &str) -> usize;
}

/// Storage implementation that doesn't cache anything.
/// Used when caching is disabled - all operations are no-ops.
pub struct NoopStorage;

impl CacheStorage for NoopStorage {
  fn get(&self, _key: &str) -> Option<CachedEntry> {
    None // Always miss
  }

  fn store(&self, _key: &str, _value: Value) {}

  fn remove(&self, _key: &str) -> bool {
    false
  }

  fn remove_prefix(&self, _prefix: &str) -> usize {
    0
  }
}

/// Session-scoped cache held in memory.
#[derive(Default)]
pub struct MemoryStorage {
  entries: Mutex<HashMap<String, CachedEntry>>,
}

impl MemoryStorage {
  pub fn new() -> Self {
    Self::default()
  }

  fn entries(&self) -> MutexGuard<'_, HashMap<String, CachedEntry>> {
    // Entries are replaced whole, so a poisoned map is still consistent
    self.entries.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

impl CacheStorage for MemoryStorage {
  fn get(&self, key: &str) -> Option<CachedEntry> {
    self.entries().get(key).cloned()
  }

  fn store(&self, key: &str, value: Value) {
    self.entries().insert(
      key.to_string(),
      CachedEntry {
        value,
        cached_at: Utc::now(),
      },
    );
  }

  fn remove(&self, key: &str) -> bool {
    self.entries().remove(key).is_some()
  }

  fn remove_prefix(&self, prefix: &str) -> usize {
    let mut entries = self.entries();
    let before = entries.len();
    entries.retain(|key, _| !key.starts_with(prefix));
    before - entries.len()
  }
}
