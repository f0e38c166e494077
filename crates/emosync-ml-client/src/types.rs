//! ML service request/response types.

use emosync_models::{EmotionScores, TextSegmentRecord};
use serde::{Deserialize, Serialize};

/// Response from facial emotion analysis of one frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacialEmotionResponse {
    /// Whether a face was found in the frame
    #[serde(default = "default_true")]
    pub face_detected: bool,
    /// Seven-class scores (0-100 or 0-1)
    #[serde(default)]
    pub emotion: EmotionScores,
    /// Dominant label as reported by the model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dominant_emotion: Option<String>,
}

fn default_true() -> bool {
    true
}

/// Request for speech transcription and text emotion classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechRequest {
    /// Path to the audio track, as seen by the service
    pub audio_path: String,
    /// Language hint for the transcriber
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// One transcribed and classified segment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
    /// Text-domain emotion label (e.g. `joy`)
    pub label: String,
    /// Classifier confidence (0-1)
    #[serde(default)]
    pub score: f64,
}

impl From<SpeechSegment> for TextSegmentRecord {
    fn from(segment: SpeechSegment) -> Self {
        TextSegmentRecord::new(
            segment.start,
            segment.end,
            segment.text,
            segment.label,
            segment.score,
        )
    }
}

/// Response from speech analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechResponse {
    pub segments: Vec<SpeechSegment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: Option<String>,
}
