//! # relink-cli
//!
//! Command-line consumer for the `relink` client: watch an endpoint and
//! print its traffic, send a single message and print the reply, or write a
//! sample settings file.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod error;

pub use cli::{Cli, Commands, DEFAULT_ENDPOINT};
pub use error::CliError;
