//! Standalone cleanup sweeper binary.
//!
//! Runs the terminal-job eviction loop against the configured store,
//! for deployments where the sweeper lives outside the API process.

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use dtwin_pipeline::{CleanupSweeper, PipelineConfig};
use dtwin_store::StoreConfig;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("dtwin=info".parse().expect("valid directive"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(true))
            .with(env_filter)
            .init();
    }

    info!("Starting dtwin-sweeper");

    let store_config = match StoreConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Invalid store configuration: {}", e);
            std::process::exit(1);
        }
    };

    let store = match store_config.connect().await {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to connect job store: {}", e);
            std::process::exit(1);
        }
    };

    let pipeline_config = PipelineConfig::from_env();
    let sweeper = CleanupSweeper::new(store, &pipeline_config);

    tokio::select! {
        _ = sweeper.run() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
    }

    info!("Sweeper shutdown complete");
}
