//! Canonical emotion label set.
//!
//! Every stage after normalization speaks the same closed vocabulary of seven
//! classes. The facial model emits these names directly; the text classifier
//! uses its own names (`anger`, `joy`, `sadness`, ...) which are translated by
//! [`normalize_text_label`].

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Sentinel label for seconds where the vision collaborator found no face.
pub const NO_DETECTION: &str = "no_detection";

/// One of the seven canonical emotion classes.
///
/// The declaration order fixes the integer code used by the smoothing
/// strategies and the class order of sequence-model outputs.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum EmotionLabel {
    Angry,
    Disgust,
    Fear,
    Happy,
    Sad,
    Surprise,
    Neutral,
}

impl EmotionLabel {
    /// All labels in code order.
    pub const ALL: [EmotionLabel; 7] = [
        EmotionLabel::Angry,
        EmotionLabel::Disgust,
        EmotionLabel::Fear,
        EmotionLabel::Happy,
        EmotionLabel::Sad,
        EmotionLabel::Surprise,
        EmotionLabel::Neutral,
    ];

    /// Number of canonical classes.
    pub const COUNT: usize = 7;

    /// Fixed integer code (0..7).
    pub fn code(&self) -> usize {
        match self {
            EmotionLabel::Angry => 0,
            EmotionLabel::Disgust => 1,
            EmotionLabel::Fear => 2,
            EmotionLabel::Happy => 3,
            EmotionLabel::Sad => 4,
            EmotionLabel::Surprise => 5,
            EmotionLabel::Neutral => 6,
        }
    }

    /// Inverse of [`EmotionLabel::code`].
    pub fn from_code(code: usize) -> Option<Self> {
        Self::ALL.get(code).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EmotionLabel::Angry => "angry",
            EmotionLabel::Disgust => "disgust",
            EmotionLabel::Fear => "fear",
            EmotionLabel::Happy => "happy",
            EmotionLabel::Sad => "sad",
            EmotionLabel::Surprise => "surprise",
            EmotionLabel::Neutral => "neutral",
        }
    }
}

impl fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not a canonical label.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown emotion label: {0}")]
pub struct UnknownLabel(pub String);

impl FromStr for EmotionLabel {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        EmotionLabel::ALL
            .iter()
            .copied()
            .find(|label| label.as_str() == lowered)
            .ok_or_else(|| UnknownLabel(s.to_string()))
    }
}

/// Translate a text-classifier label into the facial label space.
///
/// Total over all inputs: matching is case-insensitive and anything outside
/// the mapping table becomes [`EmotionLabel::Neutral`].
pub fn normalize_text_label(raw: &str) -> EmotionLabel {
    match raw.trim().to_ascii_lowercase().as_str() {
        "anger" => EmotionLabel::Angry,
        "joy" => EmotionLabel::Happy,
        "sadness" => EmotionLabel::Sad,
        "disgust" => EmotionLabel::Disgust,
        "fear" => EmotionLabel::Fear,
        "surprise" => EmotionLabel::Surprise,
        "neutral" => EmotionLabel::Neutral,
        _ => EmotionLabel::Neutral,
    }
}

/// Dominant facial label: a canonical emotion or the no-detection sentinel.
///
/// Serialized as a plain string (`"happy"`, `"no_detection"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FacialLabel {
    Detected(EmotionLabel),
    NoDetection,
}

impl FacialLabel {
    /// The canonical emotion, if a face was detected.
    pub fn emotion(&self) -> Option<EmotionLabel> {
        match self {
            FacialLabel::Detected(label) => Some(*label),
            FacialLabel::NoDetection => None,
        }
    }

    pub fn is_detected(&self) -> bool {
        matches!(self, FacialLabel::Detected(_))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FacialLabel::Detected(label) => label.as_str(),
            FacialLabel::NoDetection => NO_DETECTION,
        }
    }
}

impl From<EmotionLabel> for FacialLabel {
    fn from(label: EmotionLabel) -> Self {
        FacialLabel::Detected(label)
    }
}

impl fmt::Display for FacialLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FacialLabel {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case(NO_DETECTION) {
            return Ok(FacialLabel::NoDetection);
        }
        s.parse::<EmotionLabel>().map(FacialLabel::Detected)
    }
}

impl TryFrom<String> for FacialLabel {
    type Error = UnknownLabel;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FacialLabel> for String {
    fn from(label: FacialLabel) -> Self {
        label.as_str().to_string()
    }
}

impl JsonSchema for FacialLabel {
    fn schema_name() -> String {
        "FacialLabel".to_string()
    }

    fn json_schema(gen: &mut schemars::gen::SchemaGenerator) -> schemars::schema::Schema {
        String::json_schema(gen)
    }
}
