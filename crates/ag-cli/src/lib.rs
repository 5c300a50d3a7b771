//! Agenda CLI library.
//!
//! Argument definitions, configuration, and the subcommands behind the
//! `agenda` binary.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, HarvestArgs, ResolveArgs};
pub use config::Config;
