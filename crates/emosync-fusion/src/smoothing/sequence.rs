//! Sequence-model smoother.
//!
//! Each record gets a lookback window of the last `K` normalized score
//! vectors, `[i - K + 1 ..= i]`. For the first `K - 1` records the missing
//! history is padded by repeating the earliest vector of the stream. The
//! windows go through a trained sequence classifier in one batch and the
//! arg-max class of each returned distribution becomes the smoothed label.
//!
//! Fails soft: if the classifier errors or returns malformed output, a
//! warning is logged and raw labels pass through.

use std::sync::Arc;

use emosync_models::{EmotionLabel, TimelineRecord};
use ndarray::Array3;
use tracing::{debug, warn};

use super::{raw_labels, TemporalSmoother};
use crate::config::SmoothingKind;
use crate::error::FusionResult;

/// Trained classifier mapping score windows to class distributions.
///
/// Loaded once per process and shared read-only across videos.
pub trait SequenceClassifier: Send + Sync {
    /// Classify a batch of windows shaped `[N, K, 7]`.
    ///
    /// Returns one 7-class probability distribution per window.
    fn predict(&self, windows: &Array3<f32>) -> FusionResult<Vec<[f32; EmotionLabel::COUNT]>>;

    /// Classifier name for logging.
    fn name(&self) -> &'static str;
}

pub struct SequenceModelSmoother {
    classifier: Arc<dyn SequenceClassifier>,
    window: usize,
}

impl SequenceModelSmoother {
    pub fn new(classifier: Arc<dyn SequenceClassifier>, window: usize) -> Self {
        Self {
            classifier,
            window: window.max(1),
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }
}

impl TemporalSmoother for SequenceModelSmoother {
    fn smooth(&self, timeline: &[TimelineRecord]) -> Vec<Option<EmotionLabel>> {
        if timeline.is_empty() {
            return Vec::new();
        }

        let windows = build_windows(timeline, self.window);
        let probabilities = match self.classifier.predict(&windows) {
            Ok(p) if p.len() == timeline.len() => p,
            Ok(p) => {
                warn!(
                    classifier = self.classifier.name(),
                    expected = timeline.len(),
                    got = p.len(),
                    "Sequence model returned wrong batch size, passing raw labels through"
                );
                return raw_labels(timeline);
            }
            Err(e) => {
                warn!(
                    classifier = self.classifier.name(),
                    error = %e,
                    "Sequence model inference failed, passing raw labels through"
                );
                return raw_labels(timeline);
            }
        };

        debug!(
            classifier = self.classifier.name(),
            records = timeline.len(),
            window = self.window,
            "Sequence model smoothing complete"
        );

        timeline
            .iter()
            .zip(probabilities.iter())
            .map(|(record, dist)| {
                let raw = record.facial_label.emotion()?;
                Some(argmax(dist).and_then(EmotionLabel::from_code).unwrap_or(raw))
            })
            .collect()
    }

    fn kind(&self) -> SmoothingKind {
        SmoothingKind::SequenceModel
    }
}

/// Build the `[N, K, 7]` lookback tensor for a timeline.
///
/// Score vectors are normalized to sum to 1 first.
pub fn build_windows(timeline: &[TimelineRecord], window: usize) -> Array3<f32> {
    let k = window.max(1);
    let vectors: Vec<[f32; EmotionLabel::COUNT]> = timeline
        .iter()
        .map(|r| r.facial_vector.normalized().as_array().map(|v| v as f32))
        .collect();

    let mut windows = Array3::<f32>::zeros((vectors.len(), k, EmotionLabel::COUNT));
    for i in 0..vectors.len() {
        for j in 0..k {
            // Slot j holds record i + 1 + j - k; negative indices pad with record 0.
            let source = (i + 1 + j).saturating_sub(k);
            for (c, value) in vectors[source].iter().enumerate() {
                windows[[i, j, c]] = *value;
            }
        }
    }
    windows
}

/// Index of the largest finite value, lowest index on ties.
fn argmax(values: &[f32]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| v.is_finite())
        .fold(None, |best: Option<(usize, f32)>, (i, &v)| match best {
            Some((_, b)) if b >= v => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FusionError;
    use crate::smoothing::test_support::timeline;
    use std::sync::Mutex;
    use EmotionLabel::*;

    /// Predicts the dominant class of the oldest vector in each window.
    struct OldestInWindow {
        seen: Mutex<Vec<(usize, usize, usize)>>,
    }

    impl SequenceClassifier for OldestInWindow {
        fn predict(&self, windows: &Array3<f32>) -> FusionResult<Vec<[f32; 7]>> {
            if let Ok(mut seen) = self.seen.lock() {
                seen.push(windows.dim());
            }
            Ok(windows
                .outer_iter()
                .map(|w| {
                    let mut out = [0.0f32; 7];
                    for c in 0..7 {
                        out[c] = w[[0, c]];
                    }
                    out
                })
                .collect())
        }

        fn name(&self) -> &'static str {
            "oldest"
        }
    }

    struct Failing;

    impl SequenceClassifier for Failing {
        fn predict(&self, _windows: &Array3<f32>) -> FusionResult<Vec<[f32; 7]>> {
            Err(FusionError::inference_failed("model exploded"))
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    #[test]
    fn test_windows_include_current_and_pad_with_first() {
        let records = timeline(&[Some(Happy), Some(Sad), Some(Fear)]);
        let windows = build_windows(&records, 3);

        assert_eq!(windows.dim(), (3, 3, 7));
        // Record 0: [v0, v0, v0]
        assert!(windows[[0, 0, Happy.code()]] > 0.5);
        assert!(windows[[0, 2, Happy.code()]] > 0.5);
        // Record 1: [v0, v0, v1]
        assert!(windows[[1, 1, Happy.code()]] > 0.5);
        assert!(windows[[1, 2, Sad.code()]] > 0.5);
        // Record 2: [v0, v1, v2]
        assert!(windows[[2, 0, Happy.code()]] > 0.5);
        assert!(windows[[2, 1, Sad.code()]] > 0.5);
        assert!(windows[[2, 2, Fear.code()]] > 0.5);

        for row in windows.outer_iter() {
            for slot in row.outer_iter() {
                assert!((slot.sum() - 1.0).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn test_argmax_becomes_smoothed_label() {
        let classifier = Arc::new(OldestInWindow {
            seen: Mutex::new(Vec::new()),
        });
        let smoother = SequenceModelSmoother::new(classifier.clone(), 2);
        let records = timeline(&[Some(Happy), Some(Sad), None, Some(Angry)]);

        let smoothed = smoother.smooth(&records);

        assert_eq!(smoothed, vec![Some(Happy), Some(Happy), None, Some(Neutral)]);
        assert_eq!(classifier.seen.lock().unwrap()[0], (4, 2, 7));
    }

    #[test]
    fn test_failure_passes_raw_labels_through() {
        let smoother = SequenceModelSmoother::new(Arc::new(Failing), 3);
        let records = timeline(&[Some(Surprise), None, Some(Disgust)]);

        assert_eq!(
            smoother.smooth(&records),
            vec![Some(Surprise), None, Some(Disgust)]
        );
    }

    #[test]
    fn test_argmax_skips_non_finite() {
        assert_eq!(argmax(&[0.1, f32::NAN, 0.3, 0.3]), Some(2));
        assert_eq!(argmax(&[f32::NAN]), None);
    }
}
