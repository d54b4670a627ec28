mod command_input;
mod input;
mod key_result;
mod pagination;
mod toast;

pub use command_input::{CommandEvent, CommandInput};
pub use input::{InputResult, TextInput};
pub use key_result::KeyResult;
pub use pagination::Pagination;
pub use toast::{Notifier, Toasts};
