//! Error types for frame and inference operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for vision operations.
pub type VisionResult<T> = Result<T, VisionError>;

/// Errors that can occur while turning frames and audio into emotion streams.
#[derive(Debug, Error)]
pub enum VisionError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Frame decode failed: {0}")]
    FrameDecode(String),

    #[error("Inference failed: {0}")]
    InferenceFailed(String),

    #[error("Operation timed out after {0} ms")]
    Timeout(u64),

    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl VisionError {
    /// Create a frame decode error.
    pub fn frame_decode(message: impl Into<String>) -> Self {
        Self::FrameDecode(message.into())
    }

    /// Create an inference failure error.
    pub fn inference_failed(message: impl Into<String>) -> Self {
        Self::InferenceFailed(message.into())
    }

    /// Create a provider unavailable error.
    pub fn provider_unavailable(message: impl Into<String>) -> Self {
        Self::ProviderUnavailable(message.into())
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether a deterministic fallback record should replace the result.
    pub fn is_fail_soft(&self) -> bool {
        matches!(
            self,
            VisionError::FrameDecode(_)
                | VisionError::InferenceFailed(_)
                | VisionError::Timeout(_)
                | VisionError::ProviderUnavailable(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fail_soft_classification() {
        assert!(VisionError::inference_failed("boom").is_fail_soft());
        assert!(VisionError::Timeout(500).is_fail_soft());
        assert!(!VisionError::FileNotFound(PathBuf::from("x")).is_fail_soft());
    }
}
