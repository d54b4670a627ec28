use serde_json::Value;
use std::time::Duration;

use super::error::ApiError;
use super::http::HttpClient;
use super::types::{Student, StudentForm, StudentId, StudentPage, StudentPatch};
use crate::config::ApiConfig;

/// Header carrying the total number of records behind a paged listing
pub const TOTAL_COUNT_HEADER: &str = "x-total-count";

/// Students API client
#[derive(Clone, Debug)]
pub struct StudentApi {
  http: HttpClient,
  create_path: String,
}

impl StudentApi {
  pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
    let http = HttpClient::new(&config.base_url, Duration::from_secs(config.timeout_secs))?;
    Ok(Self {
      http,
      create_path: config.create_path.clone(),
    })
  }

  pub fn base_url(&self) -> &str {
    self.http.base_url().as_str()
  }

  /// Get one page of students
  pub async fn list_students(&self, page: u32, limit: u32) -> Result<StudentPage, ApiError> {
    let response = self
      .http
      .get::<Vec<Student>>(
        "students",
        &[("_page", page.to_string()), ("_limit", limit.to_string())],
      )
      .await?;

    let total_count = response.header_u64(TOTAL_COUNT_HEADER).unwrap_or(0);

    Ok(StudentPage {
      students: response.data,
      total_count,
    })
  }

  /// Get a single student by id
  pub async fn get_student(&self, id: &StudentId) -> Result<Student, ApiError> {
    let response = self.http.get(&format!("students/{}", id), &[]).await?;
    Ok(response.data)
  }

  /// Create a student; the server assigns the id
  pub async fn add_student(&self, form: &StudentForm) -> Result<Student, ApiError> {
    let response = self.http.post(&self.create_path, form).await?;
    Ok(response.data)
  }

  /// Update any subset of a student's fields
  pub async fn update_student(
    &self,
    id: &StudentId,
    patch: &StudentPatch,
  ) -> Result<Student, ApiError> {
    let response = self.http.patch(&format!("students/{}", id), patch).await?;
    Ok(response.data)
  }

  /// Delete a student. Deleting an id that is already gone succeeds.
  pub async fn delete_student(&self, id: &StudentId) -> Result<(), ApiError> {
    match self
      .http
      .delete::<Value>(&format!("students/{}", id))
      .await
    {
      Ok(_) => Ok(()),
      Err(ApiError::NotFound) => {
        tracing::debug!(%id, "student already deleted");
        Ok(())
      }
      Err(e) => Err(e),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::{sample_form, FakeServer};

  fn api(server: &FakeServer) -> StudentApi {
    StudentApi::new(&ApiConfig {
      base_url: server.base_url(),
      timeout_secs: 5,
      create_path: "students".into(),
    })
    .unwrap()
  }

  #[tokio::test]
  async fn test_pages_are_disjoint_and_counts_agree() {
    let server = FakeServer::start_with(23).await;
    let api = api(&server);

    let first = api.list_students(1, 10).await.unwrap();
    let total_pages = first.total_pages(10);
    assert_eq!(total_pages, 3);

    let mut seen = Vec::new();
    for page in 1..=total_pages {
      let result = api.list_students(page, 10).await.unwrap();
      assert_eq!(result.total_count, 23);
      seen.extend(result.students.into_iter().map(|s| s.id));
    }

    assert_eq!(seen.len(), 23);
    seen.sort();
    seen.dedup();
    assert_eq!(seen.len(), 23);
  }

  #[tokio::test]
  async fn test_add_then_list() {
    let server = FakeServer::start_with(2).await;
    let api = api(&server);

    let created = api.add_student(&sample_form("new@school.edu")).await.unwrap();

    let page = api.list_students(1, 10).await.unwrap();
    let matches = page.students.iter().filter(|s| s.id == created.id).count();
    assert_eq!(matches, 1);
    assert_eq!(page.total_count, 3);
  }

  #[tokio::test]
  async fn test_add_validation_error() {
    let server = FakeServer::start_with(0).await;
    let api = api(&server);

    let err = api.add_student(&sample_form("not-an-email")).await.unwrap_err();
    assert_eq!(err.field_errors().and_then(|f| f.get("email")), Some("invalid"));
  }

  #[tokio::test]
  async fn test_custom_create_path() {
    let server = FakeServer::start_with(0).await;
    let api = StudentApi::new(&ApiConfig {
      base_url: server.base_url(),
      timeout_secs: 5,
      create_path: "students/add".into(),
    })
    .unwrap();

    api.add_student(&sample_form("a@b.c")).await.unwrap();
    assert_eq!(server.requests(), vec!["POST /students/add".to_string()]);
  }

  #[tokio::test]
  async fn test_update_round_trip() {
    let server = FakeServer::start_with(3).await;
    let api = api(&server);
    let id = StudentId::from(2);

    let patch = StudentPatch {
      country: Some("Iceland".into()),
      ..Default::default()
    };
    let updated = api.update_student(&id, &patch).await.unwrap();
    assert_eq!(updated.country, "Iceland");

    let fetched = api.get_student(&id).await.unwrap();
    assert_eq!(fetched.country, "Iceland");
    assert!(!server.requests().iter().any(|r| r.starts_with("GET /students?")));
  }

  #[tokio::test]
  async fn test_get_missing_is_not_found() {
    let server = FakeServer::start_with(1).await;
    let err = api(&server).get_student(&StudentId::from(42)).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound));
  }

  #[tokio::test]
  async fn test_delete_is_idempotent() {
    let server = FakeServer::start_with(3).await;
    let api = api(&server);
    let id = StudentId::from(1);

    api.delete_student(&id).await.unwrap();
    api.delete_student(&id).await.unwrap();

    let page = api.list_students(1, 10).await.unwrap();
    assert!(page.students.iter().all(|s| s.id != id));
    assert_eq!(page.total_count, 2);
  }
}
