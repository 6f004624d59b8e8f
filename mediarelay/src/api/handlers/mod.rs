//! HTTP request handlers.
//!
//! - [`health`]: liveness check
//! - [`relay`]: authorization and dispatch of relay requests

pub mod health;
pub mod relay;
