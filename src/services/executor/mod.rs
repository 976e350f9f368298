//! Task Executor
//!
//! Sequential task execution, payload validation and citation normalization.

pub mod citation;
pub mod executor;
pub mod payload;

pub use citation::{CitationKind, CitationNormalizer, NormalizedCitation};
pub use executor::{TaskExecutor, DEFAULT_MAX_DOCUMENT_CHARS, RETRY_TEMPERATURE};
pub use payload::{validate_payload, FieldSchema, ValidatedPayload, BRIEF_SCHEMA, EXTRACTION_SCHEMA};
