//! Frame handling and facial-emotion stream assembly.
//!
//! This crate provides:
//! - Frame discovery for `frame_<second>` image sequences
//! - The frame similarity cache (single-slot anchor or no-cache policy)
//! - Provider traits for the facial and speech inference collaborators
//! - `FacialAnalyzer`, producing one record per frame with bounded-time
//!   inference and deterministic fallback

pub mod error;
pub mod facial;
pub mod frame_cache;
pub mod frames;
pub mod metrics;
pub mod providers;

pub use error::{VisionError, VisionResult};
pub use facial::{FacialAnalyzer, FacialAnalyzerConfig, FacialStream};
pub use frame_cache::{
    build_cache, frame_similarity, should_reuse, FrameCacheConfig, FrameCachePolicy,
    FrameSignature, NoCache, SingleSlotCache, DEFAULT_SIMILARITY_THRESHOLD,
};
pub use frames::{frame_content_type, list_frames, parse_frame_second, FrameRef};
pub use providers::{FacialEmotion, FacialEmotionProvider, SpeechEmotionProvider};
