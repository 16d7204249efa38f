use anyhow::Context;
use sample_app::clock::SystemClock;
use sample_app::config::Config;
use sample_app::server::{build_router, shutdown_channel, wait_for_signal, HealthServer};
use std::sync::Arc;
use tracing::level_filters::LevelFilter;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Map `LOG_LEVEL` onto a tracing level, falling back to `info`
fn log_level_filter(level: &str) -> LevelFilter {
    level
        .trim()
        .to_ascii_lowercase()
        .parse()
        .unwrap_or(LevelFilter::INFO)
}

/// `RUST_LOG` wins when set, otherwise `LOG_LEVEL`
fn env_filter(config: &Config) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::default().add_directive(log_level_filter(&config.log_level).into())
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Resolved once; everything below reads this value
    let config = Arc::new(Config::from_env().context("Failed to load configuration")?);

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(&config))
        .init();

    info!(
        name = %config.app_name,
        version = %config.version,
        "Starting sample-app"
    );

    let router = build_router(config.clone(), Arc::new(SystemClock));
    let server = match HealthServer::bind(config.port, router).await {
        Ok(server) => server,
        Err(e) => {
            error!(error = %e, "Failed to start server");
            return Err(e.into());
        }
    };

    // Log after successful bind - server is actually listening
    info!(
        port = server.local_addr().port(),
        environment = %config.env,
        secrets_loaded = config.has_secrets(),
        "Server started"
    );

    // Create shutdown channel for coordinated shutdown
    let (shutdown_controller, shutdown_signal) = shutdown_channel();

    tokio::spawn(async move {
        let signal = wait_for_signal().await;
        info!(signal = signal, "Initiating graceful shutdown");
        shutdown_controller.drain_and_stop();
    });

    server.serve(shutdown_signal).await?;

    info!("sample-app shut down gracefully");
    Ok(())
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
