//! Report document emitted per analysed video.
//!
//! The same rows are serialized two ways: as a row-oriented table (CSV) and
//! inside the record-oriented [`AnalysisReport`] JSON document.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::analysis::{CongruenceMetrics, FrameStats, Insight};
use crate::records::{ChangeFormat, TimelineRecord};

/// Version of the report format.
/// Increment this when the structure changes.
pub const REPORT_VERSION: u32 = 1;

/// Column order of the tabular report.
pub const REPORT_COLUMNS: [&str; 7] = [
    "second",
    "facial_emotion",
    "text_emotion",
    "transcript",
    "congruence",
    "change",
    "smoothed_emotion",
];

/// One report row per timeline record.
///
/// `facial_emotion` is always the raw detector label. Congruence and change
/// are scored on the smoothed label when there is one, so read them against
/// [`ReportRow::reported_emotion`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ReportRow {
    pub second: u32,
    pub facial_emotion: String,
    pub text_emotion: String,
    pub transcript: String,
    pub congruence: String,
    pub change: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smoothed_emotion: Option<String>,
}

impl ReportRow {
    pub fn from_record(record: &TimelineRecord, change_format: ChangeFormat) -> Self {
        Self {
            second: record.second,
            facial_emotion: record.facial_label.to_string(),
            text_emotion: record.text_label.to_string(),
            transcript: record.matched_text.clone(),
            congruence: record.congruence.to_string(),
            change: change_format.render(record.change),
            smoothed_emotion: record.smoothed_label.map(|label| label.to_string()),
        }
    }

    /// Label that congruence and change were computed on: the smoothed label
    /// when present, otherwise the raw facial label.
    pub fn reported_emotion(&self) -> &str {
        self.smoothed_emotion.as_deref().unwrap_or(&self.facial_emotion)
    }

    /// Cell values in [`REPORT_COLUMNS`] order; a missing smoothed label is empty.
    pub fn cells(&self) -> [String; 7] {
        [
            self.second.to_string(),
            self.facial_emotion.clone(),
            self.text_emotion.clone(),
            self.transcript.clone(),
            self.congruence.clone(),
            self.change.clone(),
            self.smoothed_emotion.clone().unwrap_or_default(),
        ]
    }
}

/// Complete analysis of one video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisReport {
    pub video_id: String,
    /// Name of the smoothing strategy that ran
    pub smoothing: String,
    pub rows: Vec<ReportRow>,
    pub metrics: CongruenceMetrics,
    pub insights: Vec<Insight>,
    #[serde(default)]
    pub frame_stats: FrameStats,
    /// Number of text segments that were synchronized
    #[serde(default)]
    pub text_segments: usize,
    pub report_version: u32,
    pub created_at: DateTime<Utc>,
}

impl AnalysisReport {
    pub fn new(
        video_id: impl Into<String>,
        smoothing: impl Into<String>,
        timeline: &[TimelineRecord],
        change_format: ChangeFormat,
        metrics: CongruenceMetrics,
        insights: Vec<Insight>,
    ) -> Self {
        Self {
            video_id: video_id.into(),
            smoothing: smoothing.into(),
            rows: timeline
                .iter()
                .map(|record| ReportRow::from_record(record, change_format))
                .collect(),
            metrics,
            insights,
            frame_stats: FrameStats::default(),
            text_segments: 0,
            report_version: REPORT_VERSION,
            created_at: Utc::now(),
        }
    }

    pub fn with_frame_stats(mut self, stats: FrameStats) -> Self {
        self.frame_stats = stats;
        self
    }

    pub fn with_text_segments(mut self, count: usize) -> Self {
        self.text_segments = count;
        self
    }

    pub fn is_current_version(&self) -> bool {
        self.report_version == REPORT_VERSION
    }
}
