//! Cache layer that orchestrates caching logic with network fetching.

use chrono::{Duration, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::storage::CacheStorage;
use super::traits::{CacheResult, QueryKey};

type SharedFetch<E> = Shared<BoxFuture<'static, Result<Value, E>>>;

struct InFlight<E> {
  id: u64,
  fetch: SharedFetch<E>,
}

type InFlightMap<E> = Arc<Mutex<HashMap<String, InFlight<E>>>>;

/// Cache layer that manages caching logic and network fetching.
///
/// This is the single owner of cached query state for an application
/// session. Values are kept as JSON so one store can hold every query type.
/// Concurrent fetches of the same key share one network call, and writes
/// (`set`, `invalidate`) abandon whatever fetch is in flight for the key so
/// its late result is never stored.
pub struct CacheLayer<E> {
  storage: Arc<dyn CacheStorage>,
  in_flight: InFlightMap<E>,
  next_fetch_id: Arc<AtomicU64>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
  mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<E> CacheLayer<E>
where
  E: Clone + Display + Send + Sync + From<serde_json::Error> + 'static,
{
  /// Create a new cache layer with the given storage backend.
  pub fn new(storage: impl CacheStorage + 'static) -> Self {
    Self {
      storage: Arc::new(storage),
      in_flight: Arc::new(Mutex::new(HashMap::new())),
      next_fetch_id: Arc::new(AtomicU64::new(0)),
    }
  }

  /// Check if cached data is stale based on cached_at timestamp.
  fn is_stale(cached_at: chrono::DateTime<Utc>, stale_time: Duration) -> bool {
    Utc::now() - cached_at > stale_time
  }

  /// Fetch with a cache-first strategy.
  ///
  /// 1. Check cache - if fresh, return immediately
  /// 2. If another fetch for the key is running, wait for its result
  /// 3. Otherwise call `fetcher` and store a successful result
  ///
  /// Failures are returned as-is and never cached.
  pub async fn fetch<K, T, F, Fut>(
    &self,
    key: &K,
    stale_time: Duration,
    fetcher: F,
  ) -> Result<CacheResult<T>, E>
  where
    K: QueryKey,
    T: Serialize + DeserializeOwned + Send + 'static,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
  {
    let key = key.cache_key();

    if let Some(entry) = self.storage.get(&key) {
      if !Self::is_stale(entry.cached_at, stale_time) {
        tracing::trace!(%key, "cache hit");
        let data = serde_json::from_value(entry.value)?;
        return Ok(CacheResult::from_cache(data, entry.cached_at, false));
      }
      tracing::trace!(%key, "cache stale");
    }

    let value = self.join_or_start(&key, fetcher).await?;
    Ok(CacheResult::from_network(serde_json::from_value(value)?))
  }

  /// Warm the cache for a key. Errors are logged, never returned.
  pub async fn prefetch<K, T, F, Fut>(&self, key: &K, stale_time: Duration, fetcher: F)
  where
    K: QueryKey,
    T: Serialize + DeserializeOwned + Send + 'static,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
  {
    if let Err(e) = self.fetch::<K, T, F, Fut>(key, stale_time, fetcher).await {
      tracing::debug!(key = %key.cache_key(), error = %e, "prefetch failed");
    }
  }

  /// Peek at a cached value without fetching.
  pub fn get<K, T>(&self, key: &K, stale_time: Duration) -> Result<Option<CacheResult<T>>, E>
  where
    K: QueryKey,
    T: DeserializeOwned,
  {
    match self.storage.get(&key.cache_key()) {
      Some(entry) => {
        let is_stale = Self::is_stale(entry.cached_at, stale_time);
        let data = serde_json::from_value(entry.value)?;
        Ok(Some(CacheResult::from_cache(data, entry.cached_at, is_stale)))
      }
      None => Ok(None),
    }
  }

  /// Write a value directly, superseding any fetch in flight for the key.
  pub fn set<K, T>(&self, key: &K, data: &T) -> Result<(), E>
  where
    K: QueryKey,
    T: Serialize,
  {
    let key = key.cache_key();
    let value = serde_json::to_value(data)?;
    lock(&self.in_flight).remove(&key);
    self.storage.store(&key, value);
    tracing::debug!(%key, "cache set");
    Ok(())
  }

  /// Evict one entry; the next read refetches.
  pub fn invalidate<K: QueryKey>(&self, key: &K) {
    let key = key.cache_key();
    lock(&self.in_flight).remove(&key);
    let removed = self.storage.remove(&key);
    tracing::debug!(%key, removed, "cache invalidate");
  }

  /// Evict every entry of one kind (e.g., all list pages).
  pub fn invalidate_kind(&self, kind: &str) {
    let prefix = format!("{}:", kind);
    lock(&self.in_flight).retain(|key, _| !key.starts_with(&prefix));
    let removed = self.storage.remove_prefix(&prefix);
    tracing::debug!(kind, removed, "cache invalidate kind");
  }

  fn join_or_start<T, F, Fut>(&self, key: &str, fetcher: F) -> SharedFetch<E>
  where
    T: Serialize + Send + 'static,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
  {
    let mut in_flight = lock(&self.in_flight);

    if let Some(existing) = in_flight.get(key) {
      tracing::trace!(key, "joining in-flight fetch");
      return existing.fetch.clone();
    }

    let id = self.next_fetch_id.fetch_add(1, Ordering::Relaxed);
    let pending = fetcher();
    let storage = Arc::clone(&self.storage);
    let registry = Arc::clone(&self.in_flight);
    let owned_key = key.to_string();

    let fetch = async move {
      let result = pending
        .await
        .and_then(|data| serde_json::to_value(&data).map_err(E::from));

      {
        let mut in_flight = lock(&registry);
        // Only the fetch still registered for the key may write it back
        if in_flight.get(&owned_key).is_some_and(|f| f.id == id) {
          in_flight.remove(&owned_key);
          if let Ok(value) = &result {
            storage.store(&owned_key, value.clone());
          }
        }
      }

      result
    }
    .boxed()
    .shared();

    in_flight.insert(
      key.to_string(),
      InFlight {
        id,
        fetch: fetch.clone(),
      },
    );

    fetch
  }
}

impl<E> Clone for CacheLayer<E> {
  fn clone(&self) -> Self {
    Self {
      storage: Arc::clone(&self.storage),
      in_flight: Arc::clone(&self.in_flight),
      next_fetch_id: Arc::clone(&self.next_fetch_id),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::ApiError;
  use crate::cache::{CacheSource, MemoryStorage, NoopStorage};
  use std::sync::atomic::AtomicUsize;

  struct Key(&'static str, u32);

  impl QueryKey for Key {
    fn kind(&self) -> &'static str {
      self.0
    }

    fn params(&self) -> String {
      self.1.to_string()
    }
  }

  fn cache() -> CacheLayer<ApiError> {
    CacheLayer::new(MemoryStorage::new())
  }

  /// Fetcher that counts its calls and returns `value`
  fn counting(
    calls: &Arc<AtomicUsize>,
    value: u32,
  ) -> impl FnOnce() -> BoxFuture<'static, Result<u32, ApiError>> {
    let calls = Arc::clone(calls);
    move || {
      async move {
        calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        Ok(value)
      }
      .boxed()
    }
  }

  #[tokio::test]
  async fn test_fresh_entry_skips_network() {
    let cache = cache();
    let calls = Arc::new(AtomicUsize::new(0));
    let key = Key("student", 7);

    let first = cache
      .fetch(&key, Duration::seconds(10), counting(&calls, 1))
      .await
      .unwrap();
    let second = cache
      .fetch(&key, Duration::seconds(10), counting(&calls, 2))
      .await
      .unwrap();

    assert_eq!(first.source, CacheSource::Network);
    assert_eq!(second.source, CacheSource::CacheFresh);
    assert_eq!(second.data, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_stale_entry_refetches() {
    let cache = cache();
    let calls = Arc::new(AtomicUsize::new(0));
    let key = Key("students", 1);

    cache
      .fetch(&key, Duration::zero(), counting(&calls, 1))
      .await
      .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = cache
      .fetch(&key, Duration::zero(), counting(&calls, 2))
      .await
      .unwrap();

    assert_eq!(second.data, 2);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_concurrent_fetches_coalesce() {
    let cache = cache();
    let calls = Arc::new(AtomicUsize::new(0));
    let key = Key("student", 3);

    let (a, b) = tokio::join!(
      cache.fetch(&key, Duration::seconds(10), counting(&calls, 5)),
      cache.fetch(&key, Duration::seconds(10), counting(&calls, 6)),
    );

    assert_eq!(a.unwrap().data, 5);
    assert_eq!(b.unwrap().data, 5);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_invalidate_forces_refetch() {
    let cache = cache();
    let calls = Arc::new(AtomicUsize::new(0));
    let key = Key("student", 1);

    cache
      .fetch(&key, Duration::seconds(10), counting(&calls, 1))
      .await
      .unwrap();
    cache.invalidate(&key);
    let again = cache
      .fetch(&key, Duration::seconds(10), counting(&calls, 2))
      .await
      .unwrap();

    assert_eq!(again.source, CacheSource::Network);
    assert_eq!(again.data, 2);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_invalidated_in_flight_result_is_not_stored() {
    let cache = cache();
    let calls = Arc::new(AtomicUsize::new(0));

    let pending = {
      let cache = cache.clone();
      let fetcher = counting(&calls, 1);
      tokio::spawn(async move {
        cache
          .fetch(&Key("student", 9), Duration::seconds(10), fetcher)
          .await
      })
    };

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    cache.invalidate(&Key("student", 9));

    // The caller still gets its answer
    assert_eq!(pending.await.unwrap().unwrap().data, 1);
    let cached: Option<CacheResult<u32>> = cache
      .get(&Key("student", 9), Duration::seconds(10))
      .unwrap();
    assert!(cached.is_none());
  }

  #[tokio::test]
  async fn test_errors_are_not_cached() {
    let cache = cache();
    let key = Key("student", 4);

    let err = cache
      .fetch(&key, Duration::seconds(10), || async {
        Err::<u32, _>(ApiError::NotFound)
      })
      .await
      .unwrap_err();
    assert!(matches!(err, ApiError::NotFound));

    let ok = cache
      .fetch(&key, Duration::seconds(10), || async { Ok::<u32, ApiError>(4) })
      .await
      .unwrap();
    assert_eq!(ok.source, CacheSource::Network);
  }

  #[tokio::test]
  async fn test_set_is_served_without_network() {
    let cache = cache();
    let calls = Arc::new(AtomicUsize::new(0));
    let key = Key("student", 2);

    cache.set(&key, &99u32).unwrap();
    let result = cache
      .fetch(&key, Duration::seconds(10), counting(&calls, 1))
      .await
      .unwrap();

    assert_eq!(result.data, 99);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn test_invalidate_kind_leaves_other_kinds() {
    let cache = cache();
    cache.set(&Key("students", 1), &1u32).unwrap();
    cache.set(&Key("students", 2), &2u32).unwrap();
    cache.set(&Key("student", 1), &3u32).unwrap();

    cache.invalidate_kind("students");

    let ten = Duration::seconds(10);
    assert!(cache.get::<_, u32>(&Key("students", 1), ten).unwrap().is_none());
    assert!(cache.get::<_, u32>(&Key("students", 2), ten).unwrap().is_none());
    assert_eq!(
      cache.get::<_, u32>(&Key("student", 1), ten).unwrap().map(|r| r.data),
      Some(3)
    );
  }

  #[tokio::test]
  async fn test_prefetch_warms_cache() {
    let cache = cache();
    let calls = Arc::new(AtomicUsize::new(0));
    let key = Key("student", 7);

    cache
      .prefetch(&key, Duration::seconds(10), counting(&calls, 7))
      .await;
    let result = cache
      .fetch(&key, Duration::seconds(10), counting(&calls, 8))
      .await
      .unwrap();

    assert_eq!(result.data, 7);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_prefetch_swallows_errors() {
    let cache = cache();
    cache
      .prefetch(&Key("student", 1), Duration::seconds(10), || async {
        Err::<u32, _>(ApiError::Timeout)
      })
      .await;
  }

  #[tokio::test]
  async fn test_noop_storage_always_fetches() {
    let cache: CacheLayer<ApiError> = CacheLayer::new(NoopStorage);
    let calls = Arc::new(AtomicUsize::new(0));
    let key = Key("student", 1);

    cache
      .fetch(&key, Duration::seconds(10), counting(&calls, 1))
      .await
      .unwrap();
    cache
      .fetch(&key, Duration::seconds(10), counting(&calls, 1))
      .await
      .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }
}
