//! Model Gateway
//!
//! Provider ordering, liveness filtering, per-call timeouts, fallback, and
//! parsing of model output into JSON.

pub mod fallback;
pub mod gateway;
pub mod liveness;
pub mod parse;

pub use fallback::{FailureReason, FallbackAttempt, FallbackExecutionLog, ProviderFallbackChain};
pub use gateway::{ModelGateway, ModelRequest, ModelResponse, ProviderHint};
pub use liveness::LivenessCache;
pub use parse::{extract_json_object, parse_json_object, read_confidence};
