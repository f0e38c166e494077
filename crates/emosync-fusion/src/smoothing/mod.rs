//! Temporal smoothing of facial labels.
//!
//! Smoothers replace noisy per-second facial labels with a stabilized estimate.
//! Strategies are interchangeable behind [`TemporalSmoother`]:
//! - `SequenceModelSmoother` - trained sequence classifier over a lookback window
//! - `RollingModeSmoother` - causal rolling mode over the last K labels
//! - `PassthroughSmoother` - raw labels unchanged
//!
//! [`SmootherBuilder`] picks the first strategy from a preference list whose
//! dependencies are available.
//!
//! Smoothing never invents a detection: records labelled `no_detection` always
//! keep `smoothed_label = None`.

mod builder;
mod onnx;
mod passthrough;
mod rolling;
mod sequence;

pub use builder::{load_sequence_classifier, SmootherBuilder};
pub use onnx::OrtSequenceClassifier;
pub use passthrough::PassthroughSmoother;
pub use rolling::RollingModeSmoother;
pub use sequence::{build_windows, SequenceClassifier, SequenceModelSmoother};

use emosync_models::{EmotionLabel, TimelineRecord};
use tracing::warn;

use crate::config::SmoothingKind;

/// A causal temporal filter over facial labels.
pub trait TemporalSmoother: Send + Sync {
    /// Smoothed label per record, aligned with `timeline`.
    ///
    /// `None` leaves the record unsmoothed.
    fn smooth(&self, timeline: &[TimelineRecord]) -> Vec<Option<EmotionLabel>>;

    /// Strategy implemented by this smoother.
    fn kind(&self) -> SmoothingKind;

    /// Smoother name for logging and reports.
    fn name(&self) -> &'static str {
        self.kind().as_str()
    }
}

/// Run a smoother and write its output into `smoothed_label`.
///
/// Output of the wrong length is discarded with a warning.
pub fn apply_smoothing(
    mut timeline: Vec<TimelineRecord>,
    smoother: &dyn TemporalSmoother,
) -> Vec<TimelineRecord> {
    let labels = smoother.smooth(&timeline);

    if labels.len() != timeline.len() {
        warn!(
            smoother = smoother.name(),
            expected = timeline.len(),
            got = labels.len(),
            "Smoother output misaligned with timeline, leaving labels unsmoothed"
        );
        return timeline;
    }

    for (record, label) in timeline.iter_mut().zip(labels) {
        record.smoothed_label = if record.facial_label.is_detected() {
            label
        } else {
            None
        };
    }
    timeline
}

/// Raw facial labels, as the no-op smoothing result.
pub(crate) fn raw_labels(timeline: &[TimelineRecord]) -> Vec<Option<EmotionLabel>> {
    timeline.iter().map(|r| r.facial_label.emotion()).collect()
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::smoothing::test_support::timeline;

    struct Constant(EmotionLabel);

    impl TemporalSmoother for Constant {
        fn smooth(&self, timeline: &[TimelineRecord]) -> Vec<Option<EmotionLabel>> {
            vec![Some(self.0); timeline.len()]
        }

        fn kind(&self) -> SmoothingKind {
            SmoothingKind::RollingMode
        }
    }

    struct Short;

    impl TemporalSmoother for Short {
        fn smooth(&self, _timeline: &[TimelineRecord]) -> Vec<Option<EmotionLabel>> {
            vec![Some(EmotionLabel::Angry)]
        }

        fn kind(&self) -> SmoothingKind {
            SmoothingKind::SequenceModel
        }
    }

    #[test]
    fn test_apply_never_smooths_no_detection() {
        let smoothed = apply_smoothing(
            timeline(&[Some(EmotionLabel::Sad), None]),
            &Constant(EmotionLabel::Happy),
        );
        assert_eq!(smoothed[0].smoothed_label, Some(EmotionLabel::Happy));
        assert_eq!(smoothed[1].smoothed_label, None);
    }

    #[test]
    fn test_apply_discards_misaligned_output() {
        let smoothed = apply_smoothing(
            timeline(&[Some(EmotionLabel::Sad), Some(EmotionLabel::Sad)]),
            &Short,
        );
        assert!(smoothed.iter().all(|r| r.smoothed_label.is_none()));
    }
}
