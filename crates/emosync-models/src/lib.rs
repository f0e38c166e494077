//! Shared data models for multimodal emotion congruence analysis.
//!
//! This crate provides Serde-serializable types for:
//! - The canonical emotion label set and text-label normalization
//! - Facial, text-segment and fused timeline records
//! - Congruence and change indicators
//! - Metrics, insights and the per-video report document

pub mod analysis;
pub mod emotion;
pub mod records;
pub mod report;

// Re-export common types
pub use analysis::{CongruenceMetrics, FrameStats, Insight, InsightKind};
pub use emotion::{normalize_text_label, EmotionLabel, FacialLabel, UnknownLabel, NO_DETECTION};
pub use records::{
    ChangeFormat, ChangeIndicator, Congruence, EmotionScores, FacialEmotionRecord,
    TextSegmentRecord, TimelineRecord, SILENCE,
};
pub use report::{AnalysisReport, ReportRow, REPORT_COLUMNS, REPORT_VERSION};
