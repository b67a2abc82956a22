//! CLI module for aerograph
//!
//! Provides command-line interface for:
//! - describe: Resolve schema entries from one node of an in-process cluster
//! - check: Validate a cluster description and print its group layout

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{check_value, describe_value, envelope, execute, load_config, run, run_command};
pub use errors::{CliError, CliResult};
pub use io::{error_response, response, write_envelope};
