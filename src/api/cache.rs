//! Cache keys for student queries.

use crate::cache::QueryKey;

use super::types::StudentId;

pub const STUDENTS_KIND: &str = "students";
pub const STUDENT_KIND: &str = "student";

/// Query key types for the students API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StudentQueryKey {
  /// One page of the student listing
  Students { page: u32, limit: u32 },
  /// A single student record
  Student { id: StudentId },
}

impl QueryKey for StudentQueryKey {
  fn kind(&self) -> &'static str {
    match self {
      Self::Students { .. } => STUDENTS_KIND,
      Self::Student { .. } => STUDENT_KIND,
    }
  }

  fn params(&self) -> String {
    match self {
      Self::Students { page, limit } => format!("{}:{}", page, limit),
      Self::Student { id } => id.as_str().to_string(),
    }
  }
}
