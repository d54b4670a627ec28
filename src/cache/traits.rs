//! Core traits and types for the caching system.

use chrono::{DateTime, Utc};

/// Identifies one cached query.
///
/// Keys are `(kind, parameter)` pairs flattened to a string that starts with
/// `"{kind}:"`, which is what kind-wide invalidation matches on.
pub trait QueryKey {
  /// Entity kind (e.g., "students", "student")
  fn kind(&self) -> &'static str;

  /// Identifying parameters, without the kind prefix
  fn params(&self) -> String;

  /// Full storage key
  fn cache_key(&self) -> String {
    format!("{}:{}", self.kind(), self.params())
  }
}

/// Result from a cache operation, including data and metadata about the source.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  /// The actual data
  pub data: T,
  /// Where the data came from
  pub source: CacheSource,
  /// When the data was cached (if from cache)
  pub cached_at: Option<DateTime<Utc>>,
}

impl<T> CacheResult<T> {
  /// Create a new cache result from fresh network data.
  pub fn from_network(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Network,
      cached_at: None,
    }
  }

  /// Create a new cache result from cached data.
  pub fn from_cache(data: T, cached_at: DateTime<Utc>, is_stale: bool) -> Self {
    Self {
      data,
      source: if is_stale {
        CacheSource::CacheStale
      } else {
        CacheSource::CacheFresh
      },
      cached_at: Some(cached_at),
    }
  }
}

/// Indicates where cached data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Fresh data from network
  Network,
  /// Data from cache, still inside its stale window
  CacheFresh,
  /// Data from cache, past its stale window (only returned by peeks)
  CacheStale,
}
