//! Error taxonomy for calls against the students API.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Per-field validation messages returned with a 422 response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
  pub fn new() -> Self {
    Self::default()
  }

  /// Message for a field, if the server (or local validation) reported one
  pub fn get(&self, field: &str) -> Option<&str> {
    self.0.get(field).map(String::as_str)
  }

  pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
    self.0.insert(field.into(), message.into());
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self.0.iter().map(|(field, message)| (field.as_str(), message.as_str()))
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  /// Parse the `{ "error": { field: message } }` payload shape.
  /// Non-string messages are rendered as their JSON text.
  pub fn from_payload(payload: Option<&Value>) -> Self {
    #[derive(Deserialize)]
    struct Payload {
      #[serde(default)]
      error: BTreeMap<String, Value>,
    }

    let Some(payload) = payload else {
      return Self::default();
    };

    match Payload::deserialize(payload) {
      Ok(parsed) => Self(
        parsed
          .error
          .into_iter()
          .map(|(field, message)| {
            let text = match message {
              Value::String(s) => s,
              other => other.to_string(),
            };
            (field, text)
          })
          .collect(),
      ),
      Err(_) => Self::default(),
    }
  }
}

/// Failure of a request against the API.
///
/// Clone so one in-flight result can be handed to every coalesced caller.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
  #[error("request timed out")]
  Timeout,

  #[error("network error: {0}")]
  Network(String),

  #[error("not found")]
  NotFound,

  #[error("validation failed")]
  Validation(FieldErrors),

  #[error("server error ({status})")]
  Server { status: u16, payload: Option<Value> },

  #[error("request failed ({status})")]
  Request { status: u16, payload: Option<Value> },

  #[error("invalid response: {0}")]
  Decode(String),
}

impl ApiError {
  /// Classify a non-2xx response.
  pub fn from_status(status: u16, payload: Option<Value>) -> Self {
    match status {
      404 => ApiError::NotFound,
      422 => ApiError::Validation(FieldErrors::from_payload(payload.as_ref())),
      500..=599 => ApiError::Server { status, payload },
      _ => ApiError::Request { status, payload },
    }
  }

  /// HTTP status behind this error, when there was a response at all
  pub fn status(&self) -> Option<u16> {
    match self {
      ApiError::NotFound => Some(404),
      ApiError::Validation(_) => Some(422),
      ApiError::Server { status, .. } | ApiError::Request { status, .. } => Some(*status),
      ApiError::Timeout | ApiError::Network(_) | ApiError::Decode(_) => None,
    }
  }

  pub fn field_errors(&self) -> Option<&FieldErrors> {
    match self {
      ApiError::Validation(errors) => Some(errors),
      _ => None,
    }
  }
}

impl From<reqwest::Error> for ApiError {
  fn from(err: reqwest::Error) -> Self {
    if err.is_timeout() {
      ApiError::Timeout
    } else if err.is_decode() {
      ApiError::Decode(err.to_string())
    } else {
      ApiError::Network(err.to_string())
    }
  }
}

impl From<serde_json::Error> for ApiError {
  fn from(err: serde_json::Error) -> Self {
    ApiError::Decode(err.to_string())
  }
}
