//! Storage Layer
//!
//! Handles all data persistence: the runtime config file and stored
//! preference overrides.

pub mod config;
pub mod preferences;

pub use config::*;
pub use preferences::*;
