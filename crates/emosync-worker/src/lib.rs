//! Batch worker for interview emotion congruence analysis.
//!
//! This crate provides:
//! - Environment configuration
//! - Input discovery (one directory per video)
//! - Per-video processing: facial stream, text stream, fusion, report
//! - Bounded-concurrency batch execution where one bad video never stops the rest
//! - Report export (CSV table and JSON document) and a metrics snapshot

pub mod config;
pub mod error;
pub mod executor;
pub mod input;
pub mod logging;
pub mod metrics;
pub mod processor;
pub mod report;

pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use executor::{BatchExecutor, BatchSummary, VideoOutcome};
pub use input::{discover_videos, VideoInput};
pub use logging::VideoLogger;
pub use processor::VideoProcessor;
pub use report::{render_csv, write_report, ReportPaths};
