//! Lexbrief Core
//!
//! Foundational error taxonomy and task result types for the lexbrief
//! workspace. This crate has zero dependencies on application-level code
//! (providers, storage, CLI, etc.).
//!
//! ## Module Organization
//!
//! - `content` - What counts as real content in model output (`has_content`, `citation_strings`)
//! - `error` - Pipeline error taxonomy (`PipelineError`, `ErrorKind`, `PipelineResult`)
//! - `task` - Task identity and per-request results (`TaskId`, `TaskResult`, `ResultBag`)
//!
//! ## Design Principles
//!
//! 1. **Zero external dependencies beyond serde/thiserror** - keeps build times minimal
//! 2. **Closed task set** - tasks are an enum, never a string-keyed registry
//! 3. **Unidirectional dependency** - this crate depends on nothing else in the workspace

pub mod content;
pub mod error;
pub mod task;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{ErrorKind, PipelineError, PipelineResult, ProviderFailure};

// ── Content Rules ──────────────────────────────────────────────────────
pub use content::{citation_strings, has_content, value_text, NOT_FOUND};

// ── Task Types ─────────────────────────────────────────────────────────
pub use task::{ResultBag, TaskId, TaskResult, TaskStatus, UPSTREAM_FAILED, UPSTREAM_MISSING};
