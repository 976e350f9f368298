//! HTTP Client Factory
//!
//! Provides a factory function for building the reqwest client shared by the
//! HTTP-backed providers.

use std::time::Duration;

use crate::types::ProviderError;

/// Build a `reqwest::Client` with a connect timeout.
///
/// Per-request timeouts are applied by each call, so the client itself only
/// bounds connection setup. Proxy environment variables are ignored.
pub fn build_http_client(connect_timeout: Duration) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .connect_timeout(connect_timeout)
        .no_proxy()
        .build()
        .map_err(|e| ProviderError::Other {
            message: format!("failed to build HTTP client: {}", e),
        })
}
