//! CLI module for docwire
//!
//! Provides command-line interface for:
//! - compile: One-shot compilation of a JSON request
//! - explain: One-shot explain of a JSON request

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{compile, execute, explain, run, run_command, CliConfig, Compiled};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{parse_request, read_request, write_error, write_response, Request};
