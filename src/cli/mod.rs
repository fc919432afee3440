//! Command-line interface: flag parsing and process entry dispatch.

pub mod args;
pub mod init;

pub use args::{Cli, Command};
