//! Per-second records flowing through the fusion pipeline.
//!
//! `FacialEmotionRecord` and `TextSegmentRecord` are the two input streams;
//! `TimelineRecord` is the fused unit produced by the synchronizer and
//! enriched by smoothing, congruence classification and change detection.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::emotion::{EmotionLabel, FacialLabel};

/// Transcript placeholder for seconds no text segment covers.
pub const SILENCE: &str = "[Silence]";

/// Seven-class emotion score vector.
///
/// Scores are non-negative and may be on a 0-100 or 0-1 scale; use
/// [`EmotionScores::normalized`] before feeding them to a model.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct EmotionScores {
    #[serde(default)]
    pub angry: f64,
    #[serde(default)]
    pub disgust: f64,
    #[serde(default)]
    pub fear: f64,
    #[serde(default)]
    pub happy: f64,
    #[serde(default)]
    pub sad: f64,
    #[serde(default)]
    pub surprise: f64,
    #[serde(default)]
    pub neutral: f64,
}

impl EmotionScores {
    /// Build from an array in [`EmotionLabel::code`] order.
    pub fn from_array(values: [f64; EmotionLabel::COUNT]) -> Self {
        Self {
            angry: values[0],
            disgust: values[1],
            fear: values[2],
            happy: values[3],
            sad: values[4],
            surprise: values[5],
            neutral: values[6],
        }
    }

    /// Scores in [`EmotionLabel::code`] order.
    pub fn as_array(&self) -> [f64; EmotionLabel::COUNT] {
        [
            self.angry,
            self.disgust,
            self.fear,
            self.happy,
            self.sad,
            self.surprise,
            self.neutral,
        ]
    }

    pub fn get(&self, label: EmotionLabel) -> f64 {
        self.as_array()[label.code()]
    }

    /// Vector used for fallback records: all mass on `neutral`.
    pub fn neutral_fallback() -> Self {
        Self {
            neutral: 1.0,
            ..Default::default()
        }
    }

    /// Highest-scoring class, lowest code on ties. `None` when every score is zero.
    pub fn dominant(&self) -> Option<EmotionLabel> {
        let values = self.as_array();
        let mut best: Option<(usize, f64)> = None;
        for (code, value) in values.iter().copied().enumerate() {
            if value <= 0.0 || !value.is_finite() {
                continue;
            }
            match best {
                Some((_, best_value)) if value <= best_value => {}
                _ => best = Some((code, value)),
            }
        }
        best.and_then(|(code, _)| EmotionLabel::from_code(code))
    }

    /// Scale into [0, 1] with the components summing to 1.
    ///
    /// Works for both 0-100 and 0-1 inputs. A zero vector stays zero.
    pub fn normalized(&self) -> Self {
        let values = self.as_array().map(|v| if v.is_finite() { v.max(0.0) } else { 0.0 });
        let sum: f64 = values.iter().sum();
        if sum <= 0.0 {
            return Self::default();
        }
        Self::from_array(values.map(|v| v / sum))
    }
}

/// One second of facial-emotion output from the vision collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FacialEmotionRecord {
    /// Second offset into the video (strictly increasing across a stream)
    pub second: u32,
    /// Raw score vector
    pub emotion_vector: EmotionScores,
    /// Dominant label or `no_detection`
    pub dominant_label: FacialLabel,
    /// Whether the result was reused from the frame similarity cache
    #[serde(default)]
    pub from_cache: bool,
}

impl FacialEmotionRecord {
    pub fn new(second: u32, emotion_vector: EmotionScores, dominant_label: FacialLabel) -> Self {
        Self {
            second,
            emotion_vector,
            dominant_label,
            from_cache: false,
        }
    }

    /// Derive the dominant label from the score vector.
    pub fn from_scores(second: u32, emotion_vector: EmotionScores) -> Self {
        let label = emotion_vector
            .dominant()
            .map(FacialLabel::Detected)
            .unwrap_or(FacialLabel::NoDetection);
        Self::new(second, emotion_vector, label)
    }

    /// Deterministic record substituted when a frame is unreadable or inference fails.
    pub fn fallback(second: u32) -> Self {
        Self::new(second, EmotionScores::neutral_fallback(), FacialLabel::NoDetection)
    }

    /// Copy of this result re-stamped for another second and flagged as cached.
    pub fn reused_at(&self, second: u32) -> Self {
        Self {
            second,
            emotion_vector: self.emotion_vector,
            dominant_label: self.dominant_label,
            from_cache: true,
        }
    }
}

/// A transcribed speech segment with its text-emotion classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TextSegmentRecord {
    /// Segment start in seconds
    pub start: f64,
    /// Segment end in seconds (`start <= end`)
    pub end: f64,
    /// Transcript text
    pub text: String,
    /// Text-domain emotion label as emitted by the classifier (e.g. `joy`)
    pub dominant_label: String,
    /// Classifier confidence (0-1)
    #[serde(default)]
    pub confidence: f64,
}

impl TextSegmentRecord {
    pub fn new(
        start: f64,
        end: f64,
        text: impl Into<String>,
        dominant_label: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            start,
            end,
            text: text.into().trim().to_string(),
            dominant_label: dominant_label.into(),
            confidence,
        }
    }

    /// Closed-interval containment: `start <= second <= end`.
    pub fn covers(&self, second: u32) -> bool {
        let s = second as f64;
        self.start <= s && s <= self.end
    }
}

/// Agreement between facial and text emotion at one timeline point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Congruence {
    Congruent,
    Incongruent,
    NotApplicable,
}

impl Congruence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Congruence::Congruent => "congruent",
            Congruence::Incongruent => "incongruent",
            Congruence::NotApplicable => "not_applicable",
        }
    }
}

impl fmt::Display for Congruence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transition indicator between consecutive facial labels (tri-state form).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ChangeIndicator {
    /// First record of the timeline
    Initial,
    Stable,
    Changed,
}

impl ChangeIndicator {
    /// Boolean form: `Initial` and `Changed` are changes.
    pub fn is_change(&self) -> bool {
        !matches!(self, ChangeIndicator::Stable)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeIndicator::Initial => "initial",
            ChangeIndicator::Stable => "stable",
            ChangeIndicator::Changed => "changed",
        }
    }
}

impl fmt::Display for ChangeIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the change column is rendered in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ChangeFormat {
    /// `initial` / `stable` / `changed`
    #[default]
    TriState,
    /// `true` / `false`
    Boolean,
}

impl ChangeFormat {
    pub fn render(&self, indicator: ChangeIndicator) -> String {
        match self {
            ChangeFormat::TriState => indicator.as_str().to_string(),
            ChangeFormat::Boolean => indicator.is_change().to_string(),
        }
    }
}

/// Fused per-second unit of the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TimelineRecord {
    pub second: u32,
    pub facial_label: FacialLabel,
    pub facial_vector: EmotionScores,
    /// Transcript of the matched segment, or [`SILENCE`]
    pub matched_text: String,
    /// Raw text-classifier label of the matched segment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_text_label: Option<String>,
    /// Text label normalized into the facial label space
    pub text_label: EmotionLabel,
    pub congruence: Congruence,
    pub change: ChangeIndicator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smoothed_label: Option<EmotionLabel>,
}

impl TimelineRecord {
    /// Whether no text segment covered this second.
    pub fn is_silence(&self) -> bool {
        self.matched_text == SILENCE
    }

    /// Label read by the classifier and change detector: the smoothed label
    /// when smoothing produced one, otherwise the raw facial label.
    pub fn effective_label(&self) -> FacialLabel {
        match self.smoothed_label {
            Some(label) if self.facial_label.is_detected() => FacialLabel::Detected(label),
            _ => self.facial_label,
        }
    }
}
