//! Presentation layer for conductor
//!
//! CLI argument definitions, status reporting, console output, and the
//! interactive chat REPL.

pub mod cli;
pub mod output;
pub mod progress;
pub mod repl;

pub use cli::Cli;
pub use output::ConsoleFormatter;
pub use progress::{SimpleStatus, StatusReporter};
pub use repl::ChatRepl;
