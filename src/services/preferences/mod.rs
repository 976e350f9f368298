//! Preferences
//!
//! Typed preference snapshot, the resolver that builds it from stored
//! overrides, and the store contract for persisting those overrides.

pub mod resolver;
pub mod store;
pub mod types;

pub use resolver::{reset, resolve, resolve_with_report};
pub use store::{InMemoryPreferenceStore, PreferenceStore};
pub use types::{CitationFormat, OutputFormat, PreferenceSet, Verbosity};
