//! Rolling-mode smoother.
//!
//! Causal, right-aligned window over the current record and up to `K - 1`
//! predecessors. The window shrinks to the available history at the start.
//! The smoothed label is the most frequent class code in the window, ties
//! going to the lowest code. No-detection entries do not vote.

use emosync_models::{EmotionLabel, TimelineRecord};

use super::TemporalSmoother;
use crate::config::SmoothingKind;

pub struct RollingModeSmoother {
    window: usize,
}

impl RollingModeSmoother {
    /// Window sizes below 1 are clamped to 1 (the identity transform).
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }
}

impl Default for RollingModeSmoother {
    fn default() -> Self {
        Self::new(3)
    }
}

impl TemporalSmoother for RollingModeSmoother {
    fn smooth(&self, timeline: &[TimelineRecord]) -> Vec<Option<EmotionLabel>> {
        let codes: Vec<Option<usize>> = timeline
            .iter()
            .map(|r| r.facial_label.emotion().map(|l| l.code()))
            .collect();

        (0..codes.len())
            .map(|i| {
                codes[i]?;
                let start = (i + 1).saturating_sub(self.window);
                window_mode(&codes[start..=i]).and_then(EmotionLabel::from_code)
            })
            .collect()
    }

    fn kind(&self) -> SmoothingKind {
        SmoothingKind::RollingMode
    }
}

fn window_mode(codes: &[Option<usize>]) -> Option<usize> {
    let mut counts = [0usize; EmotionLabel::COUNT];
    for &code in codes.iter().flatten() {
        counts[code] += 1;
    }

    let max = counts.iter().copied().max().filter(|&n| n > 0)?;
    counts.iter().position(|&n| n == max)
}
