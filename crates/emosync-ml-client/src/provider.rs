//! Provider trait implementations backed by the ML service.

use std::path::Path;

use async_trait::async_trait;
use emosync_models::TextSegmentRecord;
use emosync_vision::{FacialEmotion, FacialEmotionProvider, SpeechEmotionProvider, VisionResult};

use crate::client::MlClient;

#[async_trait]
impl FacialEmotionProvider for MlClient {
    async fn analyze_frame(&self, frame: &[u8]) -> VisionResult<FacialEmotion> {
        let response = MlClient::analyze_frame(self, frame).await?;

        if !response.face_detected {
            return Ok(FacialEmotion::no_face());
        }
        Ok(FacialEmotion::new(response.emotion))
    }

    fn name(&self) -> &'static str {
        "ml_service"
    }
}

#[async_trait]
impl SpeechEmotionProvider for MlClient {
    async fn analyze_speech(&self, audio_path: &Path) -> VisionResult<Vec<TextSegmentRecord>> {
        Ok(MlClient::analyze_speech(self, audio_path).await?)
    }

    fn name(&self) -> &'static str {
        "ml_service"
    }
}
