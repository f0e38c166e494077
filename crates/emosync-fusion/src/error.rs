//! Fusion error types.

use std::path::PathBuf;
use thiserror::Error;

pub type FusionResult<T> = Result<T, FusionError>;

#[derive(Debug, Error)]
pub enum FusionError {
    /// No records at all to synchronize; fatal to the video, never to the batch.
    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("Smoothing unavailable: {0}")]
    SmoothingUnavailable(String),

    #[error("Model not found: {0}")]
    ModelNotFound(PathBuf),

    #[error("Sequence inference failed: {0}")]
    InferenceFailed(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FusionError {
    pub fn empty_input(msg: impl Into<String>) -> Self {
        Self::EmptyInput(msg.into())
    }

    pub fn smoothing_unavailable(msg: impl Into<String>) -> Self {
        Self::SmoothingUnavailable(msg.into())
    }

    pub fn inference_failed(msg: impl Into<String>) -> Self {
        Self::InferenceFailed(msg.into())
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
