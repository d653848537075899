//! Interactive chat module
//!
//! Provides a readline-based interactive chat interface driving the
//! chat session controller.

mod command;
mod repl;

pub use command::ReplCommand;
pub use repl::ChatRepl;
