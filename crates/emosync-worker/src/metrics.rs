//! Prometheus metrics for the batch worker.

use std::path::{Path, PathBuf};

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::error::{WorkerError, WorkerResult};

/// File name of the metrics snapshot written after a batch.
pub const SNAPSHOT_FILE: &str = "metrics.prom";

/// Install the Prometheus recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> WorkerResult<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| WorkerError::config_error(format!("Failed to install Prometheus recorder: {}", e)))
}

/// Metric names as constants for consistency.
pub mod names {
    pub const VIDEOS_PROCESSED_TOTAL: &str = "emosync_videos_processed_total";
    pub const VIDEOS_SKIPPED_TOTAL: &str = "emosync_videos_skipped_total";
    pub const VIDEOS_FAILED_TOTAL: &str = "emosync_videos_failed_total";
    pub const VIDEO_DURATION_SECONDS: &str = "emosync_video_duration_seconds";
}

pub fn record_video_processed(duration_secs: f64) {
    counter!(names::VIDEOS_PROCESSED_TOTAL).increment(1);
    histogram!(names::VIDEO_DURATION_SECONDS).record(duration_secs);
}

pub fn record_video_skipped() {
    counter!(names::VIDEOS_SKIPPED_TOTAL).increment(1);
}

pub fn record_video_failed() {
    counter!(names::VIDEOS_FAILED_TOTAL).increment(1);
}

/// Render the recorder's current state into `<output_dir>/metrics.prom`.
pub async fn write_snapshot(handle: &PrometheusHandle, output_dir: &Path) -> WorkerResult<PathBuf> {
    tokio::fs::create_dir_all(output_dir).await?;
    let path = output_dir.join(SNAPSHOT_FILE);
    tokio::fs::write(&path, handle.render()).await?;
    Ok(path)
}
