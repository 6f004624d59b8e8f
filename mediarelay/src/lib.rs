//! # mediarelay: re-host remote media on a CDN storage zone
//!
//! `mediarelay` is a small HTTP service built for chat bots. A bot posts a guild ID and the URL of
//! an image or video; the service downloads it, checks that it is one of a handful of accepted
//! media types, stores it in a Bunny storage zone under `discord/{guild}/{random name}` and
//! answers with the public CDN URL of the stored copy.
//!
//! ## Request Flow
//!
//! `POST /` goes through [`api::handlers::relay::relay_content`]:
//!
//! 1. [`auth::authorize`] compares the `Authorization` header with the shared secret (skipped in
//!    development mode).
//! 2. [`relay::Relay::relay`] validates the guild ID and URL, fetches the content with a deadline
//!    and a size cap, maps its content type to an extension, picks a random filename and PUTs
//!    the bytes to the storage backend.
//! 3. The public URL is returned as `text/plain`.
//!
//! Every failure maps to an [`errors::Error`] variant with a fixed status code and a short,
//! plain-text message. Nothing is retried.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use mediarelay::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = mediarelay::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     mediarelay::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     let app = Application::new(config)?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.

pub mod api;
pub mod auth;
pub mod config;
pub mod errors;
pub mod relay;
pub mod telemetry;

use crate::api::handlers::{health::health, relay::relay_content};
use crate::errors::Error;
use axum::{
    Router,
    http::{HeaderName, HeaderValue},
    response::IntoResponse,
    routing::get,
};
use bon::Builder;
pub use config::Config;
use relay::Relay;
use std::any::Any;
use tokio::net::TcpListener;
use tower_http::{
    catch_panic::CatchPanicLayer,
    set_header::SetResponseHeaderLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, info};

/// Application state shared across all request handlers.
///
/// Both fields are immutable after startup, so requests share them without locking.
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
    pub relay: Relay,
}

/// Install the process-wide rustls crypto provider. Safe to call more than once.
pub fn install_crypto_provider() {
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
}

/// Turn a handler panic into the generic 500 instead of dropping the connection.
fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> axum::response::Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    Error::Other(anyhow::anyhow!("request handler panicked: {detail}")).into_response()
}

/// Hardening headers added to every response that does not already carry them.
const SECURITY_HEADERS: &[(&str, &str)] = &[
    (
        "content-security-policy",
        "default-src 'self';base-uri 'self';font-src 'self' https: data:;form-action 'self';\
         frame-ancestors 'self';img-src 'self' data:;object-src 'none';script-src 'self';\
         script-src-attr 'none';style-src 'self' https: 'unsafe-inline';upgrade-insecure-requests",
    ),
    ("cross-origin-opener-policy", "same-origin"),
    ("cross-origin-resource-policy", "same-origin"),
    ("origin-agent-cluster", "?1"),
    ("referrer-policy", "no-referrer"),
    ("strict-transport-security", "max-age=31536000; includeSubDomains"),
    ("x-content-type-options", "nosniff"),
    ("x-dns-prefetch-control", "off"),
    ("x-download-options", "noopen"),
    ("x-frame-options", "SAMEORIGIN"),
    ("x-permitted-cross-domain-policies", "none"),
    ("x-xss-protection", "0"),
];

/// Build the router with all routes and middleware.
///
/// Layers from the inside out: panic recovery, security headers, request tracing. Responses
/// produced by the panic handler therefore carry the headers and show up in the trace.
pub fn build_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/", get(health).post(relay_content))
        .with_state(state)
        .layer(CatchPanicLayer::custom(handle_panic));

    for &(name, value) in SECURITY_HEADERS {
        router = router.layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        ));
    }

    router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    )
}

/// The HTTP server plus everything it needs to run.
pub struct Application {
    router: Router,
    config: Config,
}

impl Application {
    /// Create a new application instance; the outbound HTTP clients are built here.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let relay = Relay::new(config.clone())?;
        let state = AppState::builder().config(config.clone()).relay(relay).build();
        let router = build_router(state);

        Ok(Self { router, config })
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests and flush telemetry.
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address()?;
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "Media relay listening on http://{}, storing into zone {:?}{}",
            bind_addr,
            self.config.storage_zone_name,
            if self.config.dev_mode { " (development mode, authorization disabled)" } else { "" }
        );

        axum::serve(listener, self.router).with_graceful_shutdown(shutdown).await?;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}
