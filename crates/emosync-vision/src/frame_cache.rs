//! Frame similarity cache.
//!
//! Skips facial inference when a frame is visually near-identical to the
//! previous one. Frames are reduced to a small RGB signature (32x32 by
//! default) and compared by mean absolute per-pixel difference:
//!
//! ```text
//! similarity = 1 - mean(|a - b|) / 255
//! ```
//!
//! # Anchoring
//! [`SingleSlotCache`] keeps exactly one `(signature, result)` pair. On a hit
//! the anchor is NOT advanced to the duplicate frame, so a long run of
//! near-identical frames is always compared against the frame that was
//! actually inferred. Slow drift therefore eventually forces a fresh
//! inference instead of being absorbed frame by frame.

use emosync_models::FacialEmotionRecord;
use image::imageops::FilterType;
use image::DynamicImage;
use tracing::debug;

use crate::error::{VisionError, VisionResult};

/// Default reuse threshold.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.95;

/// Default signature edge length in pixels.
pub const DEFAULT_SIGNATURE_SIZE: u32 = 32;

/// Configuration for frame deduplication.
#[derive(Debug, Clone)]
pub struct FrameCacheConfig {
    /// Disable to run inference on every frame
    pub enabled: bool,
    /// Similarity at or above which the previous result is reused (0.0-1.0)
    pub similarity_threshold: f64,
    /// Signature resolution (square)
    pub signature_size: u32,
}

impl Default for FrameCacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            signature_size: DEFAULT_SIGNATURE_SIZE,
        }
    }
}

/// Downsampled RGB pixels of a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSignature {
    size: u32,
    pixels: Vec<u8>,
}

impl FrameSignature {
    /// Downsample a decoded frame to `size` x `size` RGB.
    pub fn from_image(image: &DynamicImage, size: u32) -> Self {
        let size = size.max(1);
        let pixels = image
            .resize_exact(size, size, FilterType::Triangle)
            .to_rgb8()
            .into_raw();
        Self { size, pixels }
    }

    /// Decode an encoded frame (JPEG/PNG) and downsample it.
    pub fn from_bytes(bytes: &[u8], size: u32) -> VisionResult<Self> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| VisionError::frame_decode(e.to_string()))?;
        Ok(Self::from_image(&image, size))
    }

    /// Wrap already-downsampled RGB pixels (`size * size * 3` bytes).
    pub fn from_rgb(size: u32, pixels: Vec<u8>) -> VisionResult<Self> {
        let expected = (size as usize) * (size as usize) * 3;
        if pixels.len() != expected {
            return Err(VisionError::internal(format!(
                "signature expects {} bytes, got {}",
                expected,
                pixels.len()
            )));
        }
        Ok(Self { size, pixels })
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

/// Similarity in [0, 1]; 1.0 means identical signatures.
///
/// Signatures of different resolution are never similar.
pub fn frame_similarity(a: &FrameSignature, b: &FrameSignature) -> f64 {
    if a.size != b.size || a.pixels.is_empty() {
        return 0.0;
    }

    let total_diff: u64 = a
        .pixels
        .iter()
        .zip(b.pixels.iter())
        .map(|(x, y)| x.abs_diff(*y) as u64)
        .sum();

    let normalized = total_diff as f64 / (a.pixels.len() as f64 * 255.0);
    1.0 - normalized
}

/// Whether `current` is close enough to `previous` to reuse its result.
///
/// With no predecessor the answer is always `false`.
pub fn should_reuse(
    previous: Option<&FrameSignature>,
    current: &FrameSignature,
    threshold: f64,
) -> bool {
    previous.is_some_and(|prev| frame_similarity(prev, current) >= threshold)
}

/// Policy deciding when an inference result can be reused.
///
/// Implementations must be cheap; the analyzer calls [`lookup`] for every
/// decodable frame and [`store`] after every successful fresh inference.
///
/// [`lookup`]: FrameCachePolicy::lookup
/// [`store`]: FrameCachePolicy::store
pub trait FrameCachePolicy: Send + Sync {
    /// Return a cached record re-stamped for `second`, or `None` on a miss.
    fn lookup(&mut self, signature: &FrameSignature, second: u32) -> Option<FacialEmotionRecord>;

    /// Remember the result of a fresh inference.
    fn store(&mut self, signature: FrameSignature, record: &FacialEmotionRecord);

    /// Forget all state (new video).
    fn reset(&mut self);

    /// Policy name for logging.
    fn name(&self) -> &'static str;
}

/// Keeps only the most recent inferred frame and its result.
pub struct SingleSlotCache {
    threshold: f64,
    anchor: Option<(FrameSignature, FacialEmotionRecord)>,
}

impl SingleSlotCache {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            anchor: None,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Second of the frame currently used as the comparison anchor.
    pub fn anchor_second(&self) -> Option<u32> {
        self.anchor.as_ref().map(|(_, record)| record.second)
    }
}

impl FrameCachePolicy for SingleSlotCache {
    fn lookup(&mut self, signature: &FrameSignature, second: u32) -> Option<FacialEmotionRecord> {
        let (anchor_sig, anchor_record) = self.anchor.as_ref()?;
        let similarity = frame_similarity(anchor_sig, signature);
        if similarity >= self.threshold {
            debug!(
                second,
                anchor_second = anchor_record.second,
                similarity = format!("{:.4}", similarity),
                "Frame cache hit"
            );
            Some(anchor_record.reused_at(second))
        } else {
            None
        }
    }

    fn store(&mut self, signature: FrameSignature, record: &FacialEmotionRecord) {
        self.anchor = Some((signature, record.clone()));
    }

    fn reset(&mut self) {
        self.anchor = None;
    }

    fn name(&self) -> &'static str {
        "single_slot"
    }
}

/// Never reuses anything.
#[derive(Debug, Default)]
pub struct NoCache;

impl FrameCachePolicy for NoCache {
    fn lookup(&mut self, _signature: &FrameSignature, _second: u32) -> Option<FacialEmotionRecord> {
        None
    }

    fn store(&mut self, _signature: FrameSignature, _record: &FacialEmotionRecord) {}

    fn reset(&mut self) {}

    fn name(&self) -> &'static str {
        "none"
    }
}

/// Build the policy described by `config`.
pub fn build_cache(config: &FrameCacheConfig) -> Box<dyn FrameCachePolicy> {
    if config.enabled {
        Box::new(SingleSlotCache::new(config.similarity_threshold))
    } else {
        Box::new(NoCache)
    }
}
