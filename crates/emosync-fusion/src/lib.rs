//! Multimodal fusion for emotion congruence analysis.
//!
//! This crate turns a per-second facial-emotion stream and an interval-based
//! text-emotion stream into a scored timeline:
//! - Timeline synchronization (closed-interval matching, first segment wins)
//! - Congruence classification
//! - Emotional change detection (tri-state and boolean forms)
//! - Temporal smoothing (sequence model, rolling mode, pass-through)
//! - Summary metrics and insights
//!
//! Every stage is a pure transform over the previous stage's output.

pub mod change;
pub mod config;
pub mod congruence;
pub mod error;
pub mod insights;
pub mod pipeline;
pub mod smoothing;
pub mod synchronizer;

pub use change::{annotate_changes, count_changes, detect_change_flags, detect_changes};
pub use config::{parse_preference, FusionConfig, InsightThresholds, SmoothingConfig, SmoothingKind};
pub use congruence::{classify, classify_timeline};
pub use error::{FusionError, FusionResult};
pub use insights::{compute_metrics, generate_insights};
pub use pipeline::{FusionOutcome, FusionPipeline};
pub use smoothing::{
    apply_smoothing, load_sequence_classifier, OrtSequenceClassifier, PassthroughSmoother,
    RollingModeSmoother, SequenceClassifier, SequenceModelSmoother, SmootherBuilder,
    TemporalSmoother,
};
pub use synchronizer::{synchronize, synchronize_indexed, SegmentIndex};
