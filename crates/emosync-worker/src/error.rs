//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    /// A video's source stream or file is absent; the video is skipped.
    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("Processing failed: {0}")]
    ProcessingFailed(String),

    #[error("Video timed out after {0} seconds")]
    Timeout(u64),

    #[error("Report export failed: {0}")]
    ReportFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Vision error: {0}")]
    Vision(#[from] emosync_vision::VisionError),

    #[error("Fusion error: {0}")]
    Fusion(#[from] emosync_fusion::FusionError),

    #[error("ML service error: {0}")]
    Ml(#[from] emosync_ml_client::MlError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WorkerError {
    pub fn missing_input(msg: impl Into<String>) -> Self {
        Self::MissingInput(msg.into())
    }

    pub fn processing_failed(msg: impl Into<String>) -> Self {
        Self::ProcessingFailed(msg.into())
    }

    pub fn report_failed(msg: impl Into<String>) -> Self {
        Self::ReportFailed(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Check if the video should be skipped with a warning rather than
    /// reported as failed.
    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            WorkerError::MissingInput(_)
                | WorkerError::Fusion(emosync_fusion::FusionError::EmptyInput(_))
        )
    }
}
