//! Summary statistics and qualitative findings over a finished timeline.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Congruence breakdown of one timeline.
///
/// Percentages are over `total_records`. An empty timeline yields
/// [`CongruenceMetrics::empty`], never an error.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct CongruenceMetrics {
    pub total_records: usize,
    pub congruent_pct: f64,
    pub incongruent_pct: f64,
    pub not_applicable_pct: f64,
    /// Number of `Changed` transitions (the initial marker is not counted)
    pub change_count: usize,
}

impl CongruenceMetrics {
    /// Sentinel for an empty timeline.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.total_records == 0
    }

    /// Incongruent share as a fraction in [0, 1].
    pub fn incongruent_ratio(&self) -> f64 {
        self.incongruent_pct / 100.0
    }
}

/// Kind of finding produced by the insight rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    HighIncongruence,
    HighVariability,
    StablePattern,
}

/// Short qualitative finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Insight {
    pub kind: InsightKind,
    pub message: String,
}

impl Insight {
    pub fn new(kind: InsightKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Frame-level accounting of the facial analysis stage.
///
/// `cache_hits + fresh_inferences == frames_processed`; unreadable frames are
/// counted separately and never reach the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct FrameStats {
    /// All frames seen, readable or not
    pub total_frames: usize,
    /// Frames that decoded and went through the cache
    pub frames_processed: usize,
    pub cache_hits: usize,
    pub fresh_inferences: usize,
    /// Records substituted with the neutral/no-detection fallback
    pub fallbacks: usize,
    pub unreadable_frames: usize,
}

impl FrameStats {
    pub fn hit_rate(&self) -> f64 {
        if self.frames_processed == 0 {
            return 0.0;
        }
        self.cache_hits as f64 / self.frames_processed as f64
    }
}
