// =============================================================================
// HTTP API
// =============================================================================
//
// Stateless JSON service over the APR pipeline.

pub mod rest;

pub use rest::router;
