//! Cached students client that wraps StudentApi with transparent caching.

use chrono::Duration;

use crate::cache::{CacheLayer, CacheSource, MemoryStorage, NoopStorage};
use crate::config::Config;

use super::cache::{StudentQueryKey, STUDENTS_KIND};
use super::error::ApiError;
use super::students::StudentApi;
use super::types::{Student, StudentForm, StudentId, StudentPage, StudentPatch};

/// Stale window for a configured number of seconds; out of range means "never stale"
fn stale_window(secs: u64) -> Duration {
  i64::try_from(secs)
    .ok()
    .and_then(Duration::try_seconds)
    .unwrap_or(Duration::MAX)
}

/// Students client with transparent caching support.
///
/// This wraps the underlying StudentApi and provides the same API, but
/// serves reads from the session cache and applies the invalidation rules
/// after each successful write.
#[derive(Clone)]
pub struct CachedStudentApi {
  inner: StudentApi,
  cache: CacheLayer<ApiError>,
  page_limit: u32,
  record_stale: Duration,
  list_stale: Duration,
}

impl CachedStudentApi {
  /// Create a new cached students client.
  pub fn new(config: &Config) -> Result<Self, ApiError> {
    let inner = StudentApi::new(&config.api)?;
    let cache = if config.cache.enabled {
      CacheLayer::new(MemoryStorage::new())
    } else {
      CacheLayer::new(NoopStorage)
    };

    Ok(Self {
      inner,
      cache,
      page_limit: config.page_limit,
      record_stale: stale_window(config.cache.record_stale_secs),
      list_stale: stale_window(config.cache.list_stale_secs),
    })
  }

  pub fn page_limit(&self) -> u32 {
    self.page_limit
  }

  pub fn base_url(&self) -> &str {
    self.inner.base_url()
  }

  fn page_key(&self, page: u32) -> StudentQueryKey {
    StudentQueryKey::Students {
      page,
      limit: self.page_limit,
    }
  }

  fn record_key(id: &StudentId) -> StudentQueryKey {
    StudentQueryKey::Student { id: id.clone() }
  }

  /// Get one page of students with caching.
  pub async fn list_students(&self, page: u32) -> Result<StudentPage, ApiError> {
    let inner = self.inner.clone();
    let limit = self.page_limit;

    let result = self
      .cache
      .fetch(&self.page_key(page), self.list_stale, move || async move {
        inner.list_students(page, limit).await
      })
      .await?;

    Ok(result.data)
  }

  /// Drop a cached listing page so the next read goes to the network.
  pub fn invalidate_page(&self, page: u32) {
    self.cache.invalidate(&self.page_key(page));
  }

  /// Get a single student with caching.
  pub async fn get_student(&self, id: &StudentId) -> Result<Student, ApiError> {
    let inner = self.inner.clone();
    let owned_id = id.clone();

    let result = self
      .cache
      .fetch(&Self::record_key(id), self.record_stale, move || async move {
        inner.get_student(&owned_id).await
      })
      .await?;

    Ok(result.data)
  }

  /// Cached record if one is still inside its stale window.
  pub fn cached_student(&self, id: &StudentId) -> Option<Student> {
    match self.cache.get::<_, Student>(&Self::record_key(id), self.record_stale) {
      Ok(Some(result)) if result.source == CacheSource::CacheFresh => {
        tracing::trace!(%id, cached_at = ?result.cached_at, "record served from cache");
        Some(result.data)
      }
      Ok(_) => None,
      Err(e) => {
        tracing::warn!(%id, error = %e, "discarding unreadable cache entry");
        None
      }
    }
  }

  /// Warm the cache for a student (e.g., when its row is hovered).
  pub async fn prefetch_student(&self, id: &StudentId) {
    let inner = self.inner.clone();
    let owned_id = id.clone();

    self
      .cache
      .prefetch(&Self::record_key(id), self.record_stale, move || async move {
        inner.get_student(&owned_id).await
      })
      .await;
  }

  /// Create a student (write operation, invalidates every listing page).
  pub async fn add_student(&self, form: &StudentForm) -> Result<Student, ApiError> {
    let created = self.inner.add_student(form).await?;
    self.cache.invalidate_kind(STUDENTS_KIND);
    Ok(created)
  }

  /// Update a student and write the returned record straight into the cache.
  pub async fn update_student(
    &self,
    id: &StudentId,
    patch: &StudentPatch,
  ) -> Result<Student, ApiError> {
    let updated = self.inner.update_student(id, patch).await?;
    self.cache.set(&Self::record_key(id), &updated)?;
    self.cache.invalidate_kind(STUDENTS_KIND);
    Ok(updated)
  }

  /// Delete a student shown on `page`, evicting that page and the record.
  pub async fn delete_student(&self, id: &StudentId, page: u32) -> Result<(), ApiError> {
    self.inner.delete_student(id).await?;
    self.cache.invalidate(&self.page_key(page));
    self.cache.invalidate(&Self::record_key(id));
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::{sample_form, test_config, FakeServer};

  fn count(server: &FakeServer, request: &str) -> usize {
    server.requests().iter().filter(|r| *r == request).count()
  }

  #[test]
  fn test_stale_window_saturates() {
    assert_eq!(stale_window(10), Duration::seconds(10));
    assert_eq!(stale_window(10_000_000_000_000_000), Duration::MAX);
    assert_eq!(stale_window(u64::MAX), Duration::MAX);
  }

  #[tokio::test]
  async fn test_huge_stale_window_keeps_records() {
    let server = FakeServer::start_with(2).await;
    let mut config = test_config(&server);
    config.cache.record_stale_secs = 10_000_000_000_000_000;
    let api = CachedStudentApi::new(&config).unwrap();
    let id = StudentId::from(1);

    api.get_student(&id).await.unwrap();
    api.get_student(&id).await.unwrap();
    assert_eq!(count(&server, "GET /students/1"), 1);
  }

  #[tokio::test]
  async fn test_prefetch_then_open_hits_cache() {
    let server = FakeServer::start_with(10).await;
    let api = CachedStudentApi::new(&test_config(&server)).unwrap();
    let id = StudentId::from(7);

    api.prefetch_student(&id).await;
    let student = api.get_student(&id).await.unwrap();

    assert_eq!(student.id, id);
    assert_eq!(count(&server, "GET /students/7"), 1);
    assert!(api.cached_student(&id).is_some());
  }

  #[tokio::test]
  async fn test_update_refreshes_record_without_refetch() {
    let server = FakeServer::start_with(3).await;
    let api = CachedStudentApi::new(&test_config(&server)).unwrap();
    let id = StudentId::from(1);

    api.get_student(&id).await.unwrap();
    let mut form = StudentForm::from(api.get_student(&id).await.unwrap());
    form.country = "Peru".into();
    api.update_student(&id, &form.into()).await.unwrap();

    let after = api.get_student(&id).await.unwrap();
    assert_eq!(after.country, "Peru");
    assert_eq!(count(&server, "GET /students/1"), 1);
  }

  #[tokio::test]
  async fn test_delete_evicts_page_and_record() {
    let server = FakeServer::start_with(3).await;
    let mut config = test_config(&server);
    config.cache.list_stale_secs = 60;
    let api = CachedStudentApi::new(&config).unwrap();
    let id = StudentId::from(2);

    api.list_students(1).await.unwrap();
    api.get_student(&id).await.unwrap();
    api.delete_student(&id, 1).await.unwrap();

    let page = api.list_students(1).await.unwrap();
    assert!(page.students.iter().all(|s| s.id != id));
    assert_eq!(count(&server, "GET /students?_page=1&_limit=10"), 2);
    assert!(api.cached_student(&id).is_none());
  }

  #[tokio::test]
  async fn test_add_invalidates_listing() {
    let server = FakeServer::start_with(1).await;
    let mut config = test_config(&server);
    config.cache.list_stale_secs = 60;
    let api = CachedStudentApi::new(&config).unwrap();

    assert_eq!(api.list_students(1).await.unwrap().total_count, 1);
    api.add_student(&sample_form("fresh@school.edu")).await.unwrap();
    assert_eq!(api.list_students(1).await.unwrap().total_count, 2);
  }

  #[tokio::test]
  async fn test_disabled_cache_always_fetches() {
    let server = FakeServer::start_with(3).await;
    let mut config = test_config(&server);
    config.cache.enabled = false;
    let api = CachedStudentApi::new(&config).unwrap();
    let id = StudentId::from(3);

    api.prefetch_student(&id).await;
    api.get_student(&id).await.unwrap();
    assert_eq!(count(&server, "GET /students/3"), 2);
  }
}
