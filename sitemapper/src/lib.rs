pub mod commands;
pub mod handlers;

pub use commands::command_argument_builder;
pub use handlers::{OutputTarget, exit_code, handle_generate};
