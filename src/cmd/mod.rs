//! Command line entry point.

pub mod cli;

pub use cli::{run_cli, Cli, Cmd, SpamArgs};
