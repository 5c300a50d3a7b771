//! CLI subcommand implementations.

pub mod harvest;
pub mod resolve;
pub mod util;
