//! URL-like routes and the mapping from paths to screens.
//!
//! Paths look like web routes (`/students?page=2`, `/students/7`) so they can
//! be typed into the command palette or passed with `--route`.

use crate::api::StudentId;
use std::fmt;

/// Whether the student form creates a new record or edits an existing one
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
  Create,
  Edit(StudentId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
  Dashboard,
  Students { page: u32 },
  StudentAdd,
  StudentEdit { id: StudentId },
  About,
  NotFound { path: String },
}

impl Route {
  /// Parse a path with optional query string.
  ///
  /// `/students/add` wins over `/students/:id`. A missing or unusable `page`
  /// parameter falls back to 1.
  pub fn parse(input: &str) -> Route {
    let input = input.trim();
    let (path, query) = match input.split_once('?') {
      Some((path, query)) => (path, query),
      None => (input, ""),
    };

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
      [] => Route::Dashboard,
      ["students"] => Route::Students {
        page: page_param(query),
      },
      ["students", "add"] => Route::StudentAdd,
      ["students", id] => Route::StudentEdit {
        id: StudentId::new(*id),
      },
      ["about"] => Route::About,
      _ => Route::NotFound {
        path: input.to_string(),
      },
    }
  }

  /// Canonical path for this route
  pub fn to_path(&self) -> String {
    match self {
      Route::Dashboard => "/".to_string(),
      Route::Students { page } => format!("/students?page={}", page),
      Route::StudentAdd => "/students/add".to_string(),
      Route::StudentEdit { id } => format!("/students/{}", id),
      Route::About => "/about".to_string(),
      Route::NotFound { path } => path.clone(),
    }
  }

  /// Form mode for the form routes, `None` for every other screen
  pub fn form_mode(&self) -> Option<FormMode> {
    match self {
      Route::StudentAdd => Some(FormMode::Create),
      Route::StudentEdit { id } => Some(FormMode::Edit(id.clone())),
      _ => None,
    }
  }
}

impl fmt::Display for Route {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.to_path())
  }
}

fn page_param(query: &str) -> u32 {
  url::form_urlencoded::parse(query.as_bytes())
    .find(|(key, _)| key == "page")
    .and_then(|(_, value)| value.trim().parse::<u32>().ok())
    .filter(|page| *page >= 1)
    .unwrap_or(1)
}
