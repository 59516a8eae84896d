//! CloudSearch Sync Main Entry Point
//!
//! Runs the sync scheduler: queued content changes are sent to the CloudSearch
//! domain in batches, and queue-all sweeps are paged through in the background.

use cloudsearch_sync::{Dependencies, ServiceError};
use dotenv::dotenv;
use std::env;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging.
fn init_tracing() -> Result<(), ServiceError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("cloudsearch_sync=info,cloudsearch_sync_repository=info")
    });

    let json = env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .try_init()
            .map_err(|e| ServiceError::config(format!("Failed to initialize tracing: {}", e)))?;

        info!(
            service_name = "cloudsearch-sync",
            service_version = env!("CARGO_PKG_VERSION"),
            "Tracing initialized with JSON format"
        );
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true).pretty())
            .try_init()
            .map_err(|e| ServiceError::config(format!("Failed to initialize tracing: {}", e)))?;

        info!(
            service_name = "cloudsearch-sync",
            service_version = env!("CARGO_PKG_VERSION"),
            "Tracing initialized with console output"
        );
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), ServiceError> {
    // Load environment variables from .env file
    dotenv().ok();

    init_tracing()?;

    info!("Starting CloudSearch sync");

    let deps = match Dependencies::new().await {
        Ok(deps) => {
            info!("Dependencies initialized successfully");
            deps
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize dependencies");
            return Err(e);
        }
    };

    if let Err(e) = deps.prepare().await {
        error!(error = %e, "Startup tasks failed");
        return Err(e);
    }

    match deps.scheduler.run().await {
        Ok(()) => {
            info!("CloudSearch sync stopped");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "CloudSearch sync failed");
            Err(e.into())
        }
    }
}
