//! CLI Commands
//!
//! Handlers behind the `lexbrief` subcommands. Each returns data the binary
//! wraps in a `CommandResponse` and prints as JSON.

pub mod prefs;
pub mod run;

pub use prefs::*;
pub use run::*;
