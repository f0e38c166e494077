//! Worker configuration.

use std::path::PathBuf;
use std::time::Duration;

use emosync_fusion::FusionConfig;
use emosync_vision::{FacialAnalyzerConfig, FrameCacheConfig, DEFAULT_SIMILARITY_THRESHOLD};

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Directory holding one sub-directory per video
    pub input_dir: PathBuf,
    /// Directory receiving reports and the metrics snapshot
    pub output_dir: PathBuf,
    /// Maximum videos processed concurrently
    pub max_concurrent_videos: usize,
    /// Upper bound on one video's end-to-end processing
    pub video_timeout: Duration,
    /// Upper bound on a single facial inference call
    pub facial_timeout: Duration,
    /// Upper bound on speech transcription of one audio track
    pub speech_timeout: Duration,
    /// Frame similarity cache settings
    pub frame_cache: FrameCacheConfig,
    /// Report rows echoed to the log after each video
    pub summary_rows: usize,
    /// Fusion pipeline settings
    pub fusion: FusionConfig,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("data/input"),
            output_dir: PathBuf::from("data/output"),
            max_concurrent_videos: 2,
            video_timeout: Duration::from_secs(3600), // 1 hour
            facial_timeout: Duration::from_secs(30),
            speech_timeout: Duration::from_secs(900),
            frame_cache: FrameCacheConfig::default(),
            summary_rows: 10,
            fusion: FusionConfig::default(),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            input_dir: std::env::var("EMOSYNC_INPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.input_dir),
            output_dir: std::env::var("EMOSYNC_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            max_concurrent_videos: std::env::var("EMOSYNC_MAX_VIDEOS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|&n| n > 0)
                .unwrap_or(2),
            video_timeout: Duration::from_secs(
                std::env::var("EMOSYNC_VIDEO_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(3600),
            ),
            facial_timeout: Duration::from_secs(
                std::env::var("EMOSYNC_FACIAL_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            speech_timeout: Duration::from_secs(
                std::env::var("EMOSYNC_SPEECH_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(900),
            ),
            frame_cache: FrameCacheConfig {
                enabled: std::env::var("EMOSYNC_FRAME_CACHE")
                    .map(|v| !matches!(v.to_lowercase().as_str(), "0" | "false" | "off"))
                    .unwrap_or(true),
                similarity_threshold: std::env::var("EMOSYNC_SIMILARITY_THRESHOLD")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_SIMILARITY_THRESHOLD),
                ..defaults.frame_cache
            },
            summary_rows: std::env::var("EMOSYNC_SUMMARY_ROWS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            fusion: FusionConfig::from_env(),
        }
    }

    /// Facial analyzer settings derived from this config.
    pub fn facial_analyzer(&self) -> FacialAnalyzerConfig {
        FacialAnalyzerConfig {
            cache: self.frame_cache.clone(),
            inference_timeout: self.facial_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = WorkerConfig::default();
        assert_eq!(config.max_concurrent_videos, 2);
        assert_eq!(config.summary_rows, 10);
        assert!(config.frame_cache.enabled);
        assert_eq!(config.facial_analyzer().inference_timeout, Duration::from_secs(30));
    }
}
