//! download-tracker server binary
//!
//! Loads configuration (`.env`, optional JSON file, environment), installs
//! logging, starts the tracker and serves the REST API until SIGINT/SIGTERM.

use download_tracker::config::LoggingConfig;
use download_tracker::{Config, JobTracker, run_with_shutdown};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

const DEFAULT_FILTER: &str = "info,download_tracker=debug,tower_http=info";

#[tokio::main]
async fn main() -> download_tracker::Result<()> {
    let config = Config::load()?;
    init_tracing(&config.logging);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        database = %config.persistence.database_path.display(),
        bind_address = %config.server.api.bind_address,
        json_format = config.logging.json_format,
        "Starting download-tracker"
    );

    let tracker = JobTracker::new(config).await?;
    let server = tracker.spawn_api_server();

    run_with_shutdown(tracker).await?;

    match server.await {
        Ok(result) => result?,
        Err(e) => tracing::error!(error = %e, "API server task ended abnormally"),
    }

    tracing::info!("download-tracker stopped");
    Ok(())
}

/// Install the global subscriber; `RUST_LOG` wins over the configured filter
fn init_tracing(config: &LoggingConfig) {
    let fallback = config.filter.as_deref().unwrap_or(DEFAULT_FILTER);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    if config.json_format {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(true))
            .init();
    }
}
