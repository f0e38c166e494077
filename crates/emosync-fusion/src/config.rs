//! Configuration for the fusion pipeline.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use emosync_models::ChangeFormat;
use serde::{Deserialize, Serialize};

use crate::error::{FusionError, FusionResult};

/// Smoothing strategy identifiers, in the vocabulary used by preference lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmoothingKind {
    /// Trained sequence classifier over a lookback window of score vectors
    SequenceModel,
    /// Causal rolling mode over the last K labels
    RollingMode,
    /// Raw labels unchanged
    Passthrough,
}

impl SmoothingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SmoothingKind::SequenceModel => "sequence_model",
            SmoothingKind::RollingMode => "rolling_mode",
            SmoothingKind::Passthrough => "passthrough",
        }
    }
}

impl fmt::Display for SmoothingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SmoothingKind {
    type Err = FusionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequence_model" | "sequence" | "lstm" => Ok(SmoothingKind::SequenceModel),
            "rolling_mode" | "rolling" | "mode" => Ok(SmoothingKind::RollingMode),
            "passthrough" | "none" => Ok(SmoothingKind::Passthrough),
            other => Err(FusionError::invalid_config(format!(
                "unknown smoothing strategy: {}",
                other
            ))),
        }
    }
}

/// Parse a comma-separated preference list such as `"sequence_model,rolling_mode,none"`.
///
/// An empty string yields an empty list, which disables the smoothing stage.
pub fn parse_preference(value: &str) -> FusionResult<Vec<SmoothingKind>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::parse)
        .collect()
}

/// Smoothing stage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmoothingConfig {
    /// Strategies in order of preference; the first available one is used
    pub preference: Vec<SmoothingKind>,
    /// Rolling-mode window K (default: 3)
    pub rolling_window: usize,
    /// Sequence-model lookback window K (default: 3)
    pub sequence_window: usize,
    /// Path to the exported ONNX sequence model
    pub model_path: Option<PathBuf>,
    /// Name of the probability output tensor (default: "output")
    pub model_output: String,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            preference: vec![
                SmoothingKind::SequenceModel,
                SmoothingKind::RollingMode,
                SmoothingKind::Passthrough,
            ],
            rolling_window: 3,
            sequence_window: 3,
            model_path: None,
            model_output: "output".to_string(),
        }
    }
}

/// Thresholds for the insight rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightThresholds {
    /// Incongruent fraction above which "high incongruence" fires (default: 0.25)
    pub incongruence_ratio: f64,
    /// Change count above which "high variability" fires (default: 10)
    pub max_change_count: usize,
}

impl Default for InsightThresholds {
    fn default() -> Self {
        Self {
            incongruence_ratio: 0.25,
            max_change_count: 10,
        }
    }
}

/// Configuration for the fusion pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FusionConfig {
    pub smoothing: SmoothingConfig,
    pub insights: InsightThresholds,
    /// Rendering of the change column in reports
    pub change_format: ChangeFormat,
}

impl FusionConfig {
    /// Create config from environment variables.
    ///
    /// Unparseable values fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let preference = std::env::var("EMOSYNC_SMOOTHING")
            .ok()
            .and_then(|s| parse_preference(&s).ok())
            .unwrap_or(defaults.smoothing.preference);

        let change_format = match std::env::var("EMOSYNC_CHANGE_FORMAT")
            .map(|v| v.to_ascii_lowercase())
            .as_deref()
        {
            Ok("boolean") | Ok("bool") => ChangeFormat::Boolean,
            _ => ChangeFormat::TriState,
        };

        Self {
            smoothing: SmoothingConfig {
                preference,
                rolling_window: std::env::var("EMOSYNC_ROLLING_WINDOW")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.smoothing.rolling_window),
                sequence_window: std::env::var("EMOSYNC_SEQUENCE_WINDOW")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.smoothing.sequence_window),
                model_path: std::env::var("EMOSYNC_SEQUENCE_MODEL")
                    .ok()
                    .filter(|s| !s.is_empty())
                    .map(PathBuf::from),
                model_output: std::env::var("EMOSYNC_SEQUENCE_MODEL_OUTPUT")
                    .unwrap_or(defaults.smoothing.model_output),
            },
            insights: InsightThresholds {
                incongruence_ratio: std::env::var("EMOSYNC_INCONGRUENCE_THRESHOLD")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.insights.incongruence_ratio),
                max_change_count: std::env::var("EMOSYNC_VARIABILITY_THRESHOLD")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.insights.max_change_count),
            },
            change_format,
        }
    }
}
