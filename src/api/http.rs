//! Thin JSON-over-HTTP adapter around reqwest.

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use url::Url;

use super::error::ApiError;

/// Decoded body plus the response headers it came with
#[derive(Debug, Clone)]
pub struct HttpResponse<T> {
  pub data: T,
  pub headers: HeaderMap,
}

impl<T> HttpResponse<T> {
  /// Read a header as an integer
  pub fn header_u64(&self, name: &str) -> Option<u64> {
    self
      .headers
      .get(name)
      .and_then(|v| v.to_str().ok())
      .and_then(|v| v.trim().parse().ok())
  }
}

/// HTTP client bound to one base URL
#[derive(Clone, Debug)]
pub struct HttpClient {
  client: reqwest::Client,
  base_url: Url,
}

impl HttpClient {
  pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
    let mut base_url =
      Url::parse(base_url).map_err(|e| ApiError::Network(format!("invalid base url: {}", e)))?;

    // Keep any path prefix when joining relative paths onto the base
    if !base_url.path().ends_with('/') {
      let path = format!("{}/", base_url.path());
      base_url.set_path(&path);
    }

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    let client = reqwest::Client::builder()
      .timeout(timeout)
      .default_headers(headers)
      .build()
      .map_err(ApiError::from)?;

    Ok(Self { client, base_url })
  }

  pub fn base_url(&self) -> &Url {
    &self.base_url
  }

  fn url(&self, path: &str) -> Result<Url, ApiError> {
    self
      .base_url
      .join(path.trim_start_matches('/'))
      .map_err(|e| ApiError::Network(format!("invalid path {}: {}", path, e)))
  }

  pub async fn get<T: DeserializeOwned>(
    &self,
    path: &str,
    params: &[(&str, String)],
  ) -> Result<HttpResponse<T>, ApiError> {
    let request = self.client.request(Method::GET, self.url(path)?).query(params);
    self.send(request).await
  }

  pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
    &self,
    path: &str,
    body: &B,
  ) -> Result<HttpResponse<T>, ApiError> {
    let request = self.client.request(Method::POST, self.url(path)?).json(body);
    self.send(request).await
  }

  pub async fn patch<B: Serialize + ?Sized, T: DeserializeOwned>(
    &self,
    path: &str,
    body: &B,
  ) -> Result<HttpResponse<T>, ApiError> {
    let request = self.client.request(Method::PATCH, self.url(path)?).json(body);
    self.send(request).await
  }

  pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<HttpResponse<T>, ApiError> {
    let request = self.client.request(Method::DELETE, self.url(path)?);
    self.send(request).await
  }

  async fn send<T: DeserializeOwned>(
    &self,
    request: RequestBuilder,
  ) -> Result<HttpResponse<T>, ApiError> {
    let (client, request) = request.build_split();
    let request = request.map_err(ApiError::from)?;
    let method = request.method().clone();
    let url = request.url().clone();

    let response = client.execute(request).await.map_err(|e| {
      tracing::warn!(%method, %url, error = %e, "request failed");
      ApiError::from(e)
    })?;

    let status = response.status();
    let headers = response.headers().clone();
    let body = response.bytes().await.map_err(ApiError::from)?;
    tracing::debug!(%method, %url, status = status.as_u16(), bytes = body.len(), "response");

    if !status.is_success() {
      let payload = serde_json::from_slice::<Value>(&body).ok();
      let err = ApiError::from_status(status.as_u16(), payload);
      if let ApiError::Server { .. } = err {
        tracing::error!(%method, %url, status = status.as_u16(), "server error");
      }
      return Err(err);
    }

    let data = if body.iter().all(u8::is_ascii_whitespace) {
      serde_json::from_value(Value::Null)?
    } else {
      serde_json::from_slice(&body)?
    };

    Ok(HttpResponse { data, headers })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::FakeServer;
  use serde_json::json;

  #[tokio::test]
  async fn test_get_returns_body_and_headers() {
    let server = FakeServer::start_with(3).await;
    let http = HttpClient::new(&server.base_url(), Duration::from_secs(5)).unwrap();

    let res: HttpResponse<Vec<Value>> = http
      .get("students", &[("_page", "1".into()), ("_limit", "2".into())])
      .await
      .unwrap();

    assert_eq!(res.data.len(), 2);
    assert_eq!(res.header_u64("x-total-count"), Some(3));
    assert_eq!(
      server.requests(),
      vec!["GET /students?_page=1&_limit=2".to_string()]
    );
  }

  #[tokio::test]
  async fn test_base_url_prefix_is_kept() {
    let http = HttpClient::new("http://localhost:4000/api", Duration::from_secs(1)).unwrap();
    assert_eq!(
      http.url("/students/3").unwrap().as_str(),
      "http://localhost:4000/api/students/3"
    );
  }

  #[tokio::test]
  async fn test_status_errors() {
    let server = FakeServer::start_with(1).await;
    let http = HttpClient::new(&server.base_url(), Duration::from_secs(5)).unwrap();

    let missing = http.get::<Value>("students/999", &[]).await.unwrap_err();
    assert!(matches!(missing, ApiError::NotFound));

    let boom = http.get::<Value>("boom", &[]).await.unwrap_err();
    assert!(matches!(boom, ApiError::Server { status: 500, .. }));

    let invalid = http
      .post::<_, Value>("students", &json!({ "email": "nope" }))
      .await
      .unwrap_err();
    assert_eq!(
      invalid.field_errors().and_then(|f| f.get("email")),
      Some("invalid")
    );
  }

  #[tokio::test]
  async fn test_timeout() {
    let server = FakeServer::start_with(0).await;
    let http = HttpClient::new(&server.base_url(), Duration::from_millis(50)).unwrap();

    let err = http.get::<Value>("slow", &[]).await.unwrap_err();
    assert!(matches!(err, ApiError::Timeout));
  }

  #[tokio::test]
  async fn test_connection_refused_is_network_error() {
    // Bind then drop to get a port nothing listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let http = HttpClient::new(&format!("http://{}", addr), Duration::from_secs(2)).unwrap();
    let err = http.get::<Value>("students", &[]).await.unwrap_err();
    assert!(matches!(err, ApiError::Network(_)));
  }
}
