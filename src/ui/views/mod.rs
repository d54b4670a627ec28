mod about;
mod dashboard;
mod not_found;
mod student_form;
mod student_list;

pub use about::AboutView;
pub use dashboard::DashboardView;
pub use not_found::NotFoundView;
pub use student_form::StudentFormView;
pub use student_list::StudentListView;
