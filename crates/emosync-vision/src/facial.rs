//! Facial-emotion stream assembly.
//!
//! Walks the frames of one video in order, consults the frame cache, calls the
//! facial provider with a bounded timeout and substitutes the deterministic
//! fallback record whenever a frame is unreadable or inference fails. A single
//! bad frame never aborts the stream.

use std::sync::Arc;
use std::time::Duration;

use emosync_models::{FacialEmotionRecord, FacialLabel, FrameStats};
use tracing::{debug, info, warn};

use crate::error::{VisionError, VisionResult};
use crate::frame_cache::{build_cache, FrameCacheConfig, FrameCachePolicy, FrameSignature};
use crate::frames::FrameRef;
use crate::metrics::names;
use crate::providers::{FacialEmotion, FacialEmotionProvider};

/// Configuration for facial analysis.
#[derive(Debug, Clone)]
pub struct FacialAnalyzerConfig {
    pub cache: FrameCacheConfig,
    /// Upper bound on a single provider call
    pub inference_timeout: Duration,
}

impl Default for FacialAnalyzerConfig {
    fn default() -> Self {
        Self {
            cache: FrameCacheConfig::default(),
            inference_timeout: Duration::from_secs(30),
        }
    }
}

/// Output of [`FacialAnalyzer::analyze_frames`].
#[derive(Debug, Clone, Default)]
pub struct FacialStream {
    /// One record per input frame, ordered by second
    pub records: Vec<FacialEmotionRecord>,
    pub stats: FrameStats,
}

/// Turns frame files into a facial-emotion stream.
///
/// Owns its cache, so create one analyzer per video; the provider handle is
/// shared.
pub struct FacialAnalyzer {
    provider: Arc<dyn FacialEmotionProvider>,
    cache: Box<dyn FrameCachePolicy>,
    config: FacialAnalyzerConfig,
}

impl FacialAnalyzer {
    /// Create an analyzer with the cache policy described by `config`.
    pub fn new(provider: Arc<dyn FacialEmotionProvider>, config: FacialAnalyzerConfig) -> Self {
        let cache = build_cache(&config.cache);
        Self {
            provider,
            cache,
            config,
        }
    }

    /// Substitute a custom cache policy.
    pub fn with_cache(mut self, cache: Box<dyn FrameCachePolicy>) -> Self {
        self.cache = cache;
        self
    }

    /// Analyze frames in order.
    pub async fn analyze_frames(&mut self, frames: &[FrameRef]) -> FacialStream {
        self.cache.reset();

        let mut stats = FrameStats::default();
        let mut records = Vec::with_capacity(frames.len());

        for frame in frames {
            let record = self.analyze_frame(frame, &mut stats).await;
            records.push(record);
        }

        info!(
            provider = self.provider.name(),
            cache = self.cache.name(),
            frames = stats.total_frames,
            cache_hits = stats.cache_hits,
            inferences = stats.fresh_inferences,
            fallbacks = stats.fallbacks,
            "Facial analysis complete"
        );

        FacialStream { records, stats }
    }

    async fn analyze_frame(&mut self, frame: &FrameRef, stats: &mut FrameStats) -> FacialEmotionRecord {
        stats.total_frames += 1;

        let signature = match self.load_signature(frame).await {
            Ok(signature) => signature,
            Err(e) => {
                // Unreadable frames bypass the cache entirely.
                warn!(
                    second = frame.second,
                    path = %frame.path.display(),
                    error = %e,
                    "Unreadable frame, using fallback record"
                );
                stats.unreadable_frames += 1;
                stats.fallbacks += 1;
                metrics::counter!(names::FRAME_FALLBACKS_TOTAL).increment(1);
                return FacialEmotionRecord::fallback(frame.second);
            }
        };
        stats.frames_processed += 1;

        if let Some(record) = self.cache.lookup(&signature.0, frame.second) {
            stats.cache_hits += 1;
            metrics::counter!(names::FRAME_CACHE_HITS_TOTAL).increment(1);
            return record;
        }

        stats.fresh_inferences += 1;
        metrics::counter!(names::FRAME_INFERENCES_TOTAL).increment(1);

        match self.infer(&signature.1).await {
            Ok(emotion) => {
                let record = record_from_emotion(frame.second, emotion);
                debug!(
                    second = frame.second,
                    label = %record.dominant_label,
                    "Frame inferred"
                );
                self.cache.store(signature.0, &record);
                record
            }
            Err(e) => {
                warn!(
                    second = frame.second,
                    provider = self.provider.name(),
                    error = %e,
                    "Facial inference failed, using fallback record"
                );
                stats.fallbacks += 1;
                metrics::counter!(names::FRAME_FALLBACKS_TOTAL).increment(1);
                FacialEmotionRecord::fallback(frame.second)
            }
        }
    }

    /// Read and decode a frame, returning its signature and the raw bytes.
    async fn load_signature(&self, frame: &FrameRef) -> VisionResult<(FrameSignature, Vec<u8>)> {
        let bytes = tokio::fs::read(&frame.path).await?;
        let signature = FrameSignature::from_bytes(&bytes, self.config.cache.signature_size)?;
        Ok((signature, bytes))
    }

    async fn infer(&self, bytes: &[u8]) -> VisionResult<FacialEmotion> {
        let timeout = self.config.inference_timeout;
        match tokio::time::timeout(timeout, self.provider.analyze_frame(bytes)).await {
            Ok(result) => result,
            Err(_) => Err(VisionError::Timeout(timeout.as_millis() as u64)),
        }
    }
}

fn record_from_emotion(second: u32, emotion: FacialEmotion) -> FacialEmotionRecord {
    if emotion.face_detected {
        FacialEmotionRecord::from_scores(second, emotion.scores)
    } else {
        FacialEmotionRecord::new(second, emotion.scores, FacialLabel::NoDetection)
    }
}
