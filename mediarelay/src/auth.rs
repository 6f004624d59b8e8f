//! Shared-secret authorization for the upload endpoint.
//!
//! Whoever holds the secret may relay content; the `Authorization` header carries it verbatim,
//! with no scheme prefix.

use axum::http::{HeaderMap, header::AUTHORIZATION};

use crate::config::Config;
use crate::errors::{Error, Result};

/// Check the request headers against the configured secret.
///
/// Development mode skips the check entirely. Otherwise a missing secret is a server-side
/// misconfiguration, and a missing or different header is rejected.
pub fn authorize(config: &Config, headers: &HeaderMap) -> Result<()> {
    if config.dev_mode {
        return Ok(());
    }

    let Some(secret) = config.auth.as_deref().filter(|secret| !secret.is_empty()) else {
        return Err(Error::Misconfigured {
            what: "AUTH is not set".to_string(),
        });
    };

    let provided = headers.get(AUTHORIZATION).map(|value| value.as_bytes()).unwrap_or_default();
    if provided.is_empty() || !constant_time_eq(provided, secret.as_bytes()) {
        return Err(Error::Unauthorized);
    }

    Ok(())
}

/// Constant-time byte comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
