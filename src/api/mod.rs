pub mod cache;
pub mod cached_client;
pub mod error;
pub mod http;
pub mod students;
pub mod types;

pub use cached_client::CachedStudentApi;
pub use error::{ApiError, FieldErrors};
pub use types::{FormField, Gender, Student, StudentForm, StudentId, StudentPage, StudentPatch};
