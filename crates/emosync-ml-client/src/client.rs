//! ML service HTTP client.

use std::path::Path;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use tracing::{debug, warn};

use emosync_models::TextSegmentRecord;
use emosync_vision::frame_content_type;

use crate::error::{MlError, MlResult};
use crate::types::{FacialEmotionResponse, HealthResponse, SpeechRequest, SpeechResponse};

/// Configuration for ML client.
#[derive(Debug, Clone)]
pub struct MlClientConfig {
    /// Base URL of ML service
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Max retries
    pub max_retries: u32,
    /// Language hint passed to the transcriber
    pub language: Option<String>,
}

impl Default for MlClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8001".to_string(),
            timeout: Duration::from_secs(300), // 5 minutes for long audio tracks
            max_retries: 2,
            language: None,
        }
    }
}

impl MlClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("ML_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:8001".to_string()),
            timeout: Duration::from_secs(
                std::env::var("ML_SERVICE_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(300),
            ),
            max_retries: std::env::var("ML_SERVICE_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
            language: std::env::var("ML_SERVICE_LANGUAGE")
                .ok()
                .filter(|s| !s.is_empty()),
        }
    }
}

/// Client for the emotion inference service.
pub struct MlClient {
    http: Client,
    config: MlClientConfig,
}

impl MlClient {
    /// Create a new ML client.
    pub fn new(config: MlClientConfig) -> MlResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(MlError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> MlResult<Self> {
        Self::new(MlClientConfig::from_env())
    }

    pub fn config(&self) -> &MlClientConfig {
        &self.config
    }

    /// Check if ML service is healthy.
    pub async fn health_check(&self) -> MlResult<bool> {
        let url = format!("{}/health", self.config.base_url);

        match self.http.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                let health: HealthResponse = response.json().await?;
                Ok(health.status == "healthy" || health.status == "ok")
            }
            Ok(response) => {
                warn!("ML service health check failed: {}", response.status());
                Ok(false)
            }
            Err(e) => {
                warn!("ML service health check error: {}", e);
                Ok(false)
            }
        }
    }

    /// Classify the facial emotion in one encoded frame.
    pub async fn analyze_frame(&self, frame: &[u8]) -> MlResult<FacialEmotionResponse> {
        let url = format!("{}/facial-emotion", self.config.base_url);
        let (file_name, mime) = frame_content_type(frame);

        let response = self
            .with_retry(|| async {
                // Multipart forms are consumed by send, so rebuild per attempt.
                let part = Part::bytes(frame.to_vec())
                    .file_name(file_name)
                    .mime_str(mime)
                    .map_err(MlError::Network)?;
                let form = Form::new().part("frame", part);

                let response = self
                    .http
                    .post(&url)
                    .multipart(form)
                    .send()
                    .await
                    .map_err(MlError::Network)?;
                check_status(response).await
            })
            .await?;

        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| MlError::InvalidResponse(format!("facial emotion response: {}", e)))
    }

    /// Transcribe an audio track and classify each segment's text emotion.
    pub async fn analyze_speech(&self, audio_path: &Path) -> MlResult<Vec<TextSegmentRecord>> {
        let url = format!("{}/transcribe", self.config.base_url);
        let request = SpeechRequest {
            audio_path: audio_path.to_string_lossy().to_string(),
            language: self.config.language.clone(),
        };

        debug!("Sending speech analysis request to {}", url);

        let response = self
            .with_retry(|| async {
                let response = self
                    .http
                    .post(&url)
                    .json(&request)
                    .send()
                    .await
                    .map_err(MlError::Network)?;
                check_status(response).await
            })
            .await?;

        let speech: SpeechResponse = response.json().await?;
        Ok(speech.segments.into_iter().map(TextSegmentRecord::from).collect())
    }

    /// Execute with retry logic.
    async fn with_retry<F, Fut, T>(&self, operation: F) -> MlResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = MlResult<T>>,
    {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = Duration::from_millis(500 * 2u64.pow(attempt));
                    warn!(
                        "ML request failed (attempt {}), retrying in {:?}: {}",
                        attempt + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or(MlError::RequestFailed("Unknown error".to_string())))
    }
}

/// Turn non-success statuses into errors; 503 is retryable.
async fn check_status(response: Response) -> MlResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    if status == StatusCode::SERVICE_UNAVAILABLE {
        return Err(MlError::ServiceUnavailable(body));
    }
    Err(MlError::RequestFailed(format!(
        "ML service returned {}: {}",
        status, body
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

    /// Matches multipart bodies whose raw bytes contain `needle`.
    struct BodyBytesContain(&'static [u8]);

    impl Match for BodyBytesContain {
        fn matches(&self, request: &Request) -> bool {
            request.body.windows(self.0.len()).any(|w| w == self.0)
        }
    }

    fn client_for(server: &MockServer, max_retries: u32) -> MlClient {
        MlClient::new(MlClientConfig {
            base_url: server.uri(),
            timeout: Duration::from_secs(5),
            max_retries,
            language: None,
        })
        .unwrap()
    }

    #[test]
    fn test_config_defaults() {
        let config = MlClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8001");
        assert_eq!(config.timeout, Duration::from_secs(300));
    }

    #[tokio::test]
    async fn test_health_check() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"status": "ok", "version": "1.2"})),
            )
            .mount(&server)
            .await;

        assert!(client_for(&server, 0).health_check().await.unwrap());
    }

    #[tokio::test]
    async fn test_health_check_unreachable_is_false() {
        let client = MlClient::new(MlClientConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout: Duration::from_millis(500),
            max_retries: 0,
            language: None,
        })
        .unwrap();
        assert!(!client.health_check().await.unwrap());
    }

    #[tokio::test]
    async fn test_analyze_frame() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/facial-emotion"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "face_detected": true,
                "emotion": {"sad": 70.0, "neutral": 30.0},
                "dominant_emotion": "sad"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = client_for(&server, 0).analyze_frame(b"jpeg").await.unwrap();
        assert!(response.face_detected);
        assert_eq!(response.emotion.sad, 70.0);
    }

    #[tokio::test]
    async fn test_analyze_frame_sends_png_mime_for_png_frames() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/facial-emotion"))
            .and(BodyBytesContain(b"image/png"))
            .and(BodyBytesContain(b"frame.png"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "emotion": {"happy": 80.0, "neutral": 20.0}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let png = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
        let response = tokio_test::assert_ok!(client_for(&server, 0).analyze_frame(png).await);
        assert_eq!(response.emotion.happy, 80.0);
    }

    #[tokio::test]
    async fn test_analyze_frame_bad_body_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/facial-emotion"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let result = client_for(&server, 0).analyze_frame(b"jpeg").await;
        assert!(matches!(result, Err(MlError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_analyze_speech() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/transcribe"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "segments": [
                    {"start": 0.0, "end": 1.4, "text": " great day", "label": "joy", "score": 0.93},
                    {"start": 1.4, "end": 3.0, "text": "but tired", "label": "sadness", "score": 0.61}
                ]
            })))
            .mount(&server)
            .await;

        let segments = client_for(&server, 0)
            .analyze_speech(Path::new("/data/v1/audio.wav"))
            .await
            .unwrap();

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].text, "great day");
        assert_eq!(segments[1].dominant_label, "sadness");
    }

    #[tokio::test]
    async fn test_retries_on_service_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/transcribe"))
            .respond_with(ResponseTemplate::new(503).set_body_string("warming up"))
            .expect(2)
            .mount(&server)
            .await;

        let result = client_for(&server, 1)
            .analyze_speech(Path::new("audio.wav"))
            .await;
        assert!(matches!(result, Err(MlError::ServiceUnavailable(_))));
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/transcribe"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad path"))
            .expect(1)
            .mount(&server)
            .await;

        let result = client_for(&server, 3)
            .analyze_speech(Path::new("audio.wav"))
            .await;
        assert!(matches!(result, Err(MlError::RequestFailed(_))));
    }
}
