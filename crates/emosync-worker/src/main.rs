//! Batch worker binary.

use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use emosync_fusion::FusionPipeline;
use emosync_ml_client::MlClient;
use emosync_worker::metrics::{init_metrics, write_snapshot};
use emosync_worker::{discover_videos, BatchExecutor, VideoProcessor, WorkerConfig};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("emosync=info".parse().unwrap())
        .add_directive("ort=warn".parse().unwrap());

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting emosync-worker");

    let metrics_handle = match init_metrics() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!("Metrics disabled: {}", e);
            None
        }
    };

    // Load configuration
    let config = WorkerConfig::from_env();
    info!("Worker config: {:?}", config);

    // Model handles are created once and shared by every video
    let ml_client = match MlClient::from_env() {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!("Failed to create ML client: {}", e);
            std::process::exit(1);
        }
    };
    if !ml_client.health_check().await.unwrap_or(false) {
        warn!("ML service is not healthy; affected frames and audio will fall back");
    }

    let fusion = Arc::new(FusionPipeline::from_config(config.fusion.clone()));
    info!(smoothing = fusion.smoothing_name(), "Fusion pipeline ready");

    let processor = Arc::new(VideoProcessor::new(
        &config,
        ml_client.clone(),
        ml_client,
        fusion,
    ));

    let inputs = match discover_videos(&config.input_dir).await {
        Ok(inputs) => inputs,
        Err(e) => {
            error!("Failed to discover videos: {}", e);
            std::process::exit(1);
        }
    };

    let executor = BatchExecutor::new(&config, processor);
    let summary = executor.run(inputs).await;

    if let Some(handle) = metrics_handle {
        match write_snapshot(&handle, &config.output_dir).await {
            Ok(path) => info!("Metrics snapshot written to {}", path.display()),
            Err(e) => warn!("Failed to write metrics snapshot: {}", e),
        }
    }

    info!(
        completed = summary.completed(),
        skipped = summary.skipped(),
        failed = summary.failed(),
        "Worker finished"
    );
}
