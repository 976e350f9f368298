//! Integration Tests Module
//!
//! End-to-end tests for the lexbrief pipeline. Model providers are replaced
//! by in-process mocks, except the Gemini tests which talk HTTP to wiremock.

// Shared mock providers and fixtures
mod support;

// Full pipeline runs: planning, execution, failure propagation
mod pipeline_test;

// Provider fallback and liveness
mod gateway_test;

// Static task table and rule-based planning
mod planner_test;

// Preference resolution, preference and config files
mod preferences_test;

// Gemini HTTP provider against wiremock
mod gemini_test;
