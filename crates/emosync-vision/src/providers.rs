//! Provider traits wrapping the external inference collaborators.
//!
//! The facial-emotion model, the transcriber and the text-emotion classifier
//! live outside this workspace. These traits give them a uniform interface so
//! they can be loaded once per process and shared read-only across videos.

use async_trait::async_trait;
use std::path::Path;

use emosync_models::{EmotionScores, TextSegmentRecord};

use crate::error::VisionResult;

/// Facial-emotion output for a single frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FacialEmotion {
    /// Seven-class score vector
    pub scores: EmotionScores,
    /// `false` when the model found no face in the frame
    pub face_detected: bool,
}

impl FacialEmotion {
    pub fn new(scores: EmotionScores) -> Self {
        Self {
            scores,
            face_detected: true,
        }
    }

    pub fn no_face() -> Self {
        Self {
            scores: EmotionScores::neutral_fallback(),
            face_detected: false,
        }
    }
}

/// Facial-emotion inference provider.
#[async_trait]
pub trait FacialEmotionProvider: Send + Sync {
    /// Classify one encoded frame (JPEG/PNG bytes).
    async fn analyze_frame(&self, frame: &[u8]) -> VisionResult<FacialEmotion>;

    /// Provider name for logging.
    fn name(&self) -> &'static str;
}

/// Speech transcription + text-emotion provider.
#[async_trait]
pub trait SpeechEmotionProvider: Send + Sync {
    /// Transcribe an audio track and classify each spoken segment.
    ///
    /// Segments are returned in transcription order and may overlap.
    async fn analyze_speech(&self, audio_path: &Path) -> VisionResult<Vec<TextSegmentRecord>>;

    /// Provider name for logging.
    fn name(&self) -> &'static str;
}
