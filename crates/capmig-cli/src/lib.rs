//! capmig CLI library: argument parsing, command dispatch, and error
//! presentation

pub mod commands;
pub mod error;
pub mod router;

pub use error::{CliError, CliResult};
pub use router::{route, Cli, Commands};
