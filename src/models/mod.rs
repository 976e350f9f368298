//! Data Models
//!
//! Runtime settings and the CLI response envelope.

pub mod response;
pub mod settings;

pub use response::*;
pub use settings::*;
