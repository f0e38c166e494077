//! Batch executor.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{error, info, warn, Instrument};

use crate::config::WorkerConfig;
use crate::error::WorkerError;
use crate::input::VideoInput;
use crate::logging::VideoLogger;
use crate::metrics::{record_video_failed, record_video_processed, record_video_skipped};
use crate::processor::VideoProcessor;
use crate::report::{write_report, ReportPaths};

/// Result of one video.
#[derive(Debug, Clone, PartialEq)]
pub enum VideoOutcome {
    Completed { video_id: String, paths: ReportPaths },
    Skipped { video_id: String, reason: String },
    Failed { video_id: String, error: String },
}

/// Totals for a batch run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    pub outcomes: Vec<VideoOutcome>,
}

impl BatchSummary {
    pub fn completed(&self) -> usize {
        self.count(|o| matches!(o, VideoOutcome::Completed { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, VideoOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, VideoOutcome::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&VideoOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(o)).count()
    }
}

/// Runs videos through the processor with bounded concurrency.
///
/// Videos are independent; a failure in one never stops the others.
pub struct BatchExecutor {
    processor: Arc<VideoProcessor>,
    video_semaphore: Arc<Semaphore>,
    output_dir: PathBuf,
    video_timeout: Duration,
}

impl BatchExecutor {
    pub fn new(config: &WorkerConfig, processor: Arc<VideoProcessor>) -> Self {
        Self {
            processor,
            video_semaphore: Arc::new(Semaphore::new(config.max_concurrent_videos.max(1))),
            output_dir: config.output_dir.clone(),
            video_timeout: config.video_timeout,
        }
    }

    /// Process every input and collect outcomes in input order.
    pub async fn run(&self, inputs: Vec<VideoInput>) -> BatchSummary {
        info!(videos = inputs.len(), "Starting batch");

        let mut video_ids = Vec::with_capacity(inputs.len());
        let mut handles = Vec::with_capacity(inputs.len());
        for input in inputs {
            let permit = match Arc::clone(&self.video_semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    error!("Semaphore closed, stopping batch");
                    break;
                }
            };

            let video_id = input.video_id.clone();
            let processor = Arc::clone(&self.processor);
            let output_dir = self.output_dir.clone();
            let timeout = self.video_timeout;

            let span = VideoLogger::new(&video_id, "batch").create_span();
            let handle = tokio::spawn(
                async move {
                    let _permit = permit;
                    Self::execute_video(processor, input, output_dir, timeout).await
                }
                .instrument(span),
            );
            video_ids.push(video_id);
            handles.push(handle);
        }

        let results = join_all(handles).await;

        let mut summary = BatchSummary::default();
        for (video_id, result) in video_ids.into_iter().zip(results) {
            let outcome = match result {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(video_id = %video_id, "Video task panicked: {}", e);
                    record_video_failed();
                    VideoOutcome::Failed {
                        video_id,
                        error: format!("task failed: {}", e),
                    }
                }
            };
            summary.outcomes.push(outcome);
        }

        info!(
            completed = summary.completed(),
            skipped = summary.skipped(),
            failed = summary.failed(),
            "Batch finished"
        );
        summary
    }

    async fn execute_video(
        processor: Arc<VideoProcessor>,
        input: VideoInput,
        output_dir: PathBuf,
        timeout: Duration,
    ) -> VideoOutcome {
        let video_id = input.video_id.clone();
        let logger = VideoLogger::new(&video_id, "batch");
        let started = Instant::now();

        let result = match tokio::time::timeout(timeout, processor.process(&input)).await {
            Ok(result) => result,
            Err(_) => Err(WorkerError::Timeout(timeout.as_secs())),
        };

        let report = match result {
            Ok(report) => report,
            Err(e) if e.is_skip() => {
                warn!(video_id = %video_id, "Skipping video: {}", e);
                record_video_skipped();
                return VideoOutcome::Skipped {
                    video_id,
                    reason: e.to_string(),
                };
            }
            Err(e) => {
                logger.log_error(&e.to_string());
                record_video_failed();
                return VideoOutcome::Failed {
                    video_id,
                    error: e.to_string(),
                };
            }
        };

        match write_report(&report, &output_dir).await {
            Ok(paths) => {
                info!(
                    video_id = %video_id,
                    csv = %paths.csv.display(),
                    json = %paths.json.display(),
                    "Report written"
                );
                record_video_processed(started.elapsed().as_secs_f64());
                VideoOutcome::Completed { video_id, paths }
            }
            Err(e) => {
                logger.log_error(&format!("failed to write report: {}", e));
                record_video_failed();
                VideoOutcome::Failed {
                    video_id,
                    error: e.to_string(),
                }
            }
        }
    }
}
