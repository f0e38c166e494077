//! Pass-through smoother - raw labels unchanged.

use emosync_models::{EmotionLabel, TimelineRecord};

use super::{raw_labels, TemporalSmoother};
use crate::config::SmoothingKind;

/// Smoother used when no smoothing dependency is available.
pub struct PassthroughSmoother;

impl TemporalSmoother for PassthroughSmoother {
    fn smooth(&self, timeline: &[TimelineRecord]) -> Vec<Option<EmotionLabel>> {
        raw_labels(timeline)
    }

    fn kind(&self) -> SmoothingKind {
        SmoothingKind::Passthrough
    }
}
