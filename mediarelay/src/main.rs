use clap::Parser;
use mediarelay::{Application, Config, telemetry};

/// Resolves once the process is asked to stop, so in-flight relays can finish their upload.
///
/// Listens for Ctrl+C everywhere and additionally for SIGTERM on unix, which is what container
/// runtimes send.
async fn shutdown_signal() {
    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Cannot listen for SIGTERM, relying on Ctrl+C only");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    let signal = tokio::select! {
        _ = ctrl_c => "Ctrl+C",
        _ = sigterm => "SIGTERM",
    };

    tracing::info!(signal, "Stop requested, draining in-flight relays");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Must happen before any reqwest client is built
    mediarelay::install_crypto_provider();

    let args = mediarelay::config::Args::parse();

    // A missing storage zone stops the process here
    let config = Config::load(&args)?;

    if args.validate {
        println!("Configuration is valid.");
        return Ok(());
    }

    telemetry::init_telemetry(config.enable_otel_export)?;

    tracing::debug!("{:?}", args);

    Application::new(config)?.serve(shutdown_signal()).await
}
