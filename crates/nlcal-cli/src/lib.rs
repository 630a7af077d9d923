//! The `nlcal` command-line assistant.
//!
//! [`session::Session`] turns one message into a calendar action;
//! [`repl`] drives it interactively.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod repl;
pub mod secret;
pub mod session;

pub use cli::Cli;
pub use error::{CliError, CliResult};
pub use session::Session;
