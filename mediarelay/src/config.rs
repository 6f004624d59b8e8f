//! Application configuration management.
//!
//! Configuration is loaded once at startup and never mutated afterwards. Sources are merged in
//! the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - optional, default `config.yaml`, or `-f` / `MEDIARELAY_CONFIG`
//! 2. **Prefixed environment variables** - `MEDIARELAY_PORT=8080`, nested values with double
//!    underscores, e.g. `MEDIARELAY_LIMITS__FETCH_TIMEOUT=10s`
//! 3. **Deployment environment variables** - `STORAGE_ZONE_NAME`, `AUTH`, `BUNNY_API_PASS` and
//!    `PORT`, as set in the `.env` files of existing deployments
//!
//! ## Example
//!
//! ```yaml
//! port: 3000
//! storage_zone_name: my-zone
//! public_base_url: https://cdn.cdev.shop
//! limits:
//!   max_payload_size: 52428800
//!   fetch_timeout: 15s
//!   upload_timeout: 1m
//! ```
//!
//! `port` and `storage_zone_name` must be supplied by one of the sources or the process refuses to
//! start. `auth` and `bunny_api_pass` are optional: a deployment missing them still starts, and
//! requests that need them fail with a 500.

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::errors::Error;

/// Environment variable names used by existing deployments.
const DEPLOYMENT_ENV_VARS: &[&str] = &["STORAGE_ZONE_NAME", "AUTH", "BUNNY_API_PASS", "PORT"];

/// Simple CLI args - config file location plus a couple of switches
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "MEDIARELAY_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,

    /// Run in development mode: the Authorization check is skipped.
    #[arg(long)]
    pub dev: bool,
}

/// Main application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to
    pub host: String,
    /// HTTP server port to bind to (required)
    pub port: Option<u16>,
    /// Storage zone that uploads are written into (required)
    pub storage_zone_name: String,
    /// Shared secret expected in the `Authorization` header
    #[serde(skip_serializing)]
    pub auth: Option<String>,
    /// AccessKey for the storage backend
    #[serde(skip_serializing)]
    pub bunny_api_pass: Option<String>,
    /// Storage backend origin; the zone name is appended to it
    pub storage_endpoint: Url,
    /// Public domain that serves uploaded objects
    pub public_base_url: Url,
    /// Skip the Authorization check (local testing only)
    pub dev_mode: bool,
    /// Enable OpenTelemetry OTLP export for distributed tracing
    pub enable_otel_export: bool,
    /// Bounds on outbound calls
    pub limits: LimitsConfig,
}

/// Limits applied to the fetch and upload calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    /// Maximum fetched body size in bytes.
    /// Set to 0 for unlimited (not recommended for production).
    /// Default: 100MB
    pub max_payload_size: u64,
    /// Deadline for fetching remote content, including reading the body
    #[serde(with = "humantime_serde")]
    pub fetch_timeout: Duration,
    /// Deadline for the upload to the storage backend
    #[serde(with = "humantime_serde")]
    pub upload_timeout: Duration,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_payload_size: 100 * 1024 * 1024, // 100MB
            fetch_timeout: Duration::from_secs(30),
            upload_timeout: Duration::from_secs(60),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: None,
            storage_zone_name: String::new(),
            auth: None,
            bunny_api_pass: None,
            storage_endpoint: Url::parse("https://se.storage.bunnycdn.com").expect("valid default storage endpoint"),
            public_base_url: Url::parse("https://cdn.cdev.shop").expect("valid default public url"),
            dev_mode: false,
            enable_otel_export: false,
            limits: LimitsConfig::default(),
        }
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let mut config: Self = Self::figment(args).extract()?;

        if args.dev {
            config.dev_mode = true;
        }

        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        if self.port.is_none() {
            return Err(Error::Misconfigured {
                what: "port is not set (set PORT or MEDIARELAY_PORT)".to_string(),
            });
        }

        if self.storage_zone_name.trim().is_empty() {
            return Err(Error::Misconfigured {
                what: "storage_zone_name is not set (set STORAGE_ZONE_NAME or MEDIARELAY_STORAGE_ZONE_NAME)".to_string(),
            });
        }

        if self.storage_zone_name.contains('/') {
            return Err(Error::Misconfigured {
                what: format!("storage_zone_name must not contain '/', got {:?}", self.storage_zone_name),
            });
        }

        for (name, url) in [("storage_endpoint", &self.storage_endpoint), ("public_base_url", &self.public_base_url)] {
            if !matches!(url.scheme(), "http" | "https") {
                return Err(Error::Misconfigured {
                    what: format!("{name} must be an http(s) URL, got {url}"),
                });
            }
        }

        if self.limits.fetch_timeout.is_zero() || self.limits.upload_timeout.is_zero() {
            return Err(Error::Misconfigured {
                what: "limits.fetch_timeout and limits.upload_timeout must be non-zero".to_string(),
            });
        }

        Ok(())
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            .merge(
                Env::prefixed("MEDIARELAY_")
                    .filter(|key| !key.as_str().eq_ignore_ascii_case("config"))
                    .split("__"),
            )
            // Plain names used by existing deployments take precedence
            .merge(Env::raw().only(DEPLOYMENT_ENV_VARS))
    }

    pub fn bind_address(&self) -> Result<String, Error> {
        let port = self.port.ok_or_else(|| Error::Misconfigured {
            what: "port is not set".to_string(),
        })?;
        Ok(format!("{}:{}", self.host, port))
    }

    /// Storage backend URL for an object path inside the zone.
    pub fn storage_url(&self, object_path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.storage_endpoint.as_str().trim_end_matches('/'),
            self.storage_zone_name,
            object_path
        )
    }

    /// Public URL under which an uploaded object is served.
    pub fn public_url(&self, object_path: &str) -> String {
        format!("{}/{}", self.public_base_url.as_str().trim_end_matches('/'), object_path)
    }
}
