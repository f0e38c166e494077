//! Fusion pipeline: synchronize, smooth, classify, detect changes, summarize.

use std::sync::Arc;

use emosync_models::{CongruenceMetrics, FacialEmotionRecord, Insight, TextSegmentRecord, TimelineRecord};
use tracing::{debug, warn};

use crate::change::annotate_changes;
use crate::config::FusionConfig;
use crate::congruence::classify_timeline;
use crate::error::FusionResult;
use crate::insights::{compute_metrics, generate_insights};
use crate::smoothing::{
    apply_smoothing, load_sequence_classifier, SequenceClassifier, SmootherBuilder,
    TemporalSmoother,
};
use crate::synchronizer::{synchronize, synchronize_indexed};

/// Above this many facial records the synchronizer switches to the segment index.
const INDEXED_SYNC_THRESHOLD: usize = 3600;

/// Result of fusing one video.
#[derive(Debug, Clone)]
pub struct FusionOutcome {
    pub timeline: Vec<TimelineRecord>,
    pub metrics: CongruenceMetrics,
    pub insights: Vec<Insight>,
    /// Name of the smoother that ran, or `"none"` when smoothing is disabled
    pub smoothing: &'static str,
}

/// Runs the per-video fusion stages.
///
/// Built once per process and shared across videos; holds no per-video state.
pub struct FusionPipeline {
    config: FusionConfig,
    smoother: Option<Box<dyn TemporalSmoother>>,
}

impl FusionPipeline {
    /// Build a pipeline with an already-loaded sequence classifier.
    ///
    /// An empty preference list disables smoothing. A preference list with no
    /// available strategy also disables it, with a warning.
    pub fn new(config: FusionConfig, classifier: Option<Arc<dyn SequenceClassifier>>) -> Self {
        let smoother = if config.smoothing.preference.is_empty() {
            None
        } else {
            match SmootherBuilder::new(&config.smoothing)
                .with_classifier(classifier)
                .build()
            {
                Ok(smoother) => Some(smoother),
                Err(e) => {
                    warn!(error = %e, "Smoothing disabled");
                    None
                }
            }
        };

        Self { config, smoother }
    }

    /// Build a pipeline, loading the sequence model named in the config.
    pub fn from_config(config: FusionConfig) -> Self {
        let classifier = load_sequence_classifier(&config.smoothing);
        Self::new(config, classifier)
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    pub fn smoothing_name(&self) -> &'static str {
        self.smoother.as_ref().map(|s| s.name()).unwrap_or("none")
    }

    /// Fuse one video's streams.
    ///
    /// Fails only when the facial stream is empty.
    pub fn run(
        &self,
        facial: &[FacialEmotionRecord],
        segments: &[TextSegmentRecord],
    ) -> FusionResult<FusionOutcome> {
        let timeline = if facial.len() > INDEXED_SYNC_THRESHOLD {
            synchronize_indexed(facial, segments)?
        } else {
            synchronize(facial, segments)?
        };

        let timeline = match &self.smoother {
            Some(smoother) => apply_smoothing(timeline, smoother.as_ref()),
            None => timeline,
        };
        let timeline = annotate_changes(classify_timeline(timeline));

        let metrics = compute_metrics(&timeline);
        let insights = generate_insights(&timeline, &metrics, &self.config.insights);

        debug!(
            records = timeline.len(),
            segments = segments.len(),
            smoothing = self.smoothing_name(),
            incongruent_pct = metrics.incongruent_pct,
            change_count = metrics.change_count,
            "Fusion complete"
        );

        Ok(FusionOutcome {
            timeline,
            metrics,
            insights,
            smoothing: self.smoothing_name(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SmoothingKind;
    use crate::error::FusionError;
    use emosync_models::{
        ChangeFormat, ChangeIndicator, Congruence, EmotionLabel, EmotionScores, InsightKind,
        ReportRow,
    };
    use ndarray::Array3;
    use std::sync::Mutex;

    fn facial(second: u32, label: EmotionLabel) -> FacialEmotionRecord {
        let mut values = [0.0; EmotionLabel::COUNT];
        values[label.code()] = 70.0;
        FacialEmotionRecord::from_scores(second, EmotionScores::from_array(values))
    }

    fn config(preference: Vec<SmoothingKind>, window: usize) -> FusionConfig {
        let mut config = FusionConfig::default();
        config.smoothing.preference = preference;
        config.smoothing.rolling_window = window;
        config
    }

    #[test]
    fn test_reference_example_without_smoothing() {
        let pipeline = FusionPipeline::new(config(vec![], 3), None);
        let outcome = pipeline
            .run(
                &[
                    facial(0, EmotionLabel::Happy),
                    facial(1, EmotionLabel::Happy),
                    facial(2, EmotionLabel::Sad),
                ],
                &[TextSegmentRecord::new(0.0, 1.0, "great day", "joy", 0.9)],
            )
            .unwrap();

        assert_eq!(outcome.smoothing, "none");
        let congruence: Vec<_> = outcome.timeline.iter().map(|r| r.congruence).collect();
        assert_eq!(
            congruence,
            vec![
                Congruence::Congruent,
                Congruence::Congruent,
                Congruence::NotApplicable
            ]
        );
        let change: Vec<_> = outcome.timeline.iter().map(|r| r.change).collect();
        assert_eq!(
            change,
            vec![
                ChangeIndicator::Initial,
                ChangeIndicator::Stable,
                ChangeIndicator::Changed
            ]
        );
        assert!(outcome.timeline.iter().all(|r| r.smoothed_label.is_none()));
        assert_eq!(outcome.insights[0].kind, InsightKind::StablePattern);
    }

    #[test]
    fn test_rolling_smoothing_feeds_classifier() {
        let pipeline = FusionPipeline::new(
            config(vec![SmoothingKind::SequenceModel, SmoothingKind::RollingMode], 3),
            None,
        );
        assert_eq!(pipeline.smoothing_name(), "rolling_mode");

        let outcome = pipeline
            .run(
                &[
                    facial(0, EmotionLabel::Happy),
                    facial(1, EmotionLabel::Happy),
                    facial(2, EmotionLabel::Sad),
                ],
                &[TextSegmentRecord::new(0.0, 2.0, "great day", "joy", 0.9)],
            )
            .unwrap();

        // The single sad blip is smoothed away.
        assert_eq!(outcome.timeline[2].smoothed_label, Some(EmotionLabel::Happy));
        assert_eq!(outcome.timeline[2].congruence, Congruence::Congruent);
        assert_eq!(outcome.timeline[2].change, ChangeIndicator::Stable);
        assert_eq!(outcome.metrics.congruent_pct, 100.0);
    }

    /// Scores each window by summing its slots, so the smoothed label is the
    /// window's majority class.
    struct WindowVote {
        seen: Mutex<Vec<Array3<f32>>>,
    }

    impl SequenceClassifier for WindowVote {
        fn predict(&self, windows: &Array3<f32>) -> FusionResult<Vec<[f32; EmotionLabel::COUNT]>> {
            self.seen.lock().unwrap().push(windows.clone());
            Ok(windows
                .outer_iter()
                .map(|window| {
                    let mut dist = [0.0f32; EmotionLabel::COUNT];
                    for slot in window.outer_iter() {
                        for (c, value) in slot.iter().enumerate() {
                            dist[c] += value;
                        }
                    }
                    dist
                })
                .collect())
        }

        fn name(&self) -> &'static str {
            "window_vote"
        }
    }

    #[test]
    fn test_sequence_smoothing_feeds_classifier_and_changes() {
        use EmotionLabel::{Happy, Sad};

        let classifier = Arc::new(WindowVote {
            seen: Mutex::new(Vec::new()),
        });
        let mut config = config(vec![SmoothingKind::SequenceModel], 3);
        config.smoothing.sequence_window = 3;
        let pipeline = FusionPipeline::new(config, Some(classifier.clone() as Arc<dyn SequenceClassifier>));
        assert_eq!(pipeline.smoothing_name(), "sequence_model");

        let outcome = pipeline
            .run(
                &[facial(0, Happy), facial(1, Sad), facial(2, Sad), facial(3, Happy)],
                &[TextSegmentRecord::new(0.0, 3.0, "so glad", "joy", 0.9)],
            )
            .unwrap();

        // Windows: [H,H,H] [H,H,S] [H,S,S] [S,S,H]
        let smoothed: Vec<_> = outcome.timeline.iter().map(|r| r.smoothed_label).collect();
        assert_eq!(smoothed, vec![Some(Happy), Some(Happy), Some(Sad), Some(Sad)]);

        let seen = classifier.seen.lock().unwrap();
        let windows = &seen[0];
        assert_eq!(windows.dim(), (4, 3, EmotionLabel::COUNT));
        // Record 1 is padded with record 0 ahead of its own history.
        assert_eq!(windows[[1, 0, Happy.code()]], 1.0);
        assert_eq!(windows[[1, 1, Happy.code()]], 1.0);
        assert_eq!(windows[[1, 2, Sad.code()]], 1.0);

        let congruence: Vec<_> = outcome.timeline.iter().map(|r| r.congruence).collect();
        assert_eq!(
            congruence,
            vec![
                Congruence::Congruent,
                Congruence::Congruent,
                Congruence::Incongruent,
                Congruence::Incongruent
            ]
        );
        // Raw labels flip at second 3 but the smoothed label does not.
        assert_eq!(outcome.timeline[3].change, ChangeIndicator::Stable);
        assert_eq!(outcome.metrics.change_count, 1);
    }

    #[test]
    fn test_change_column_tracks_reported_emotion() {
        use EmotionLabel::{Angry, Happy, Sad};

        let pipeline = FusionPipeline::new(config(vec![SmoothingKind::RollingMode], 3), None);
        let mut facial_stream: Vec<_> = [Happy, Happy, Sad, Happy, Sad, Sad, Angry, Sad, Happy]
            .iter()
            .enumerate()
            .map(|(s, &label)| facial(s as u32, label))
            .collect();
        facial_stream.push(FacialEmotionRecord::fallback(9));
        facial_stream.push(facial(10, Sad));

        let outcome = pipeline.run(&facial_stream, &[]).unwrap();
        let rows: Vec<_> = outcome
            .timeline
            .iter()
            .map(|r| ReportRow::from_record(r, ChangeFormat::TriState))
            .collect();

        assert_eq!(rows[0].change, "initial");
        for pair in rows.windows(2) {
            let same = pair[0].reported_emotion() == pair[1].reported_emotion();
            assert_eq!(
                pair[1].change == "stable",
                same,
                "second {}: {} -> {}",
                pair[1].second,
                pair[0].reported_emotion(),
                pair[1].reported_emotion()
            );
        }
        // Some raw neighbours agree while the reported labels differ, and vice versa.
        assert!(rows
            .windows(2)
            .any(|p| p[0].facial_emotion != p[1].facial_emotion && p[1].change == "stable"));
        assert_eq!(rows[9].reported_emotion(), "no_detection");
    }

    #[test]
    fn test_unavailable_preference_disables_smoothing() {
        let pipeline = FusionPipeline::new(config(vec![SmoothingKind::SequenceModel], 3), None);
        assert_eq!(pipeline.smoothing_name(), "none");
    }

    #[test]
    fn test_empty_facial_stream_fails_video() {
        let pipeline = FusionPipeline::new(FusionConfig::default(), None);
        assert!(matches!(
            pipeline.run(&[], &[]),
            Err(FusionError::EmptyInput(_))
        ));
    }

    #[test]
    fn test_long_input_uses_index_with_same_result() {
        let pipeline = FusionPipeline::new(config(vec![], 3), None);
        let facial: Vec<_> = (0..(INDEXED_SYNC_THRESHOLD as u32 + 10))
            .map(|s| facial(s, EmotionLabel::Neutral))
            .collect();
        let segments = vec![
            TextSegmentRecord::new(100.0, 200.0, "hmm", "neutral", 0.5),
            TextSegmentRecord::new(150.0, 3605.0, "ok", "joy", 0.5),
        ];

        let outcome = pipeline.run(&facial, &segments).unwrap();
        let linear = synchronize(&facial, &segments).unwrap();

        for (fused, plain) in outcome.timeline.iter().zip(linear.iter()) {
            assert_eq!(fused.matched_text, plain.matched_text);
        }
        assert_eq!(outcome.timeline[150].matched_text, "hmm");
        assert_eq!(outcome.timeline[3605].congruence, Congruence::Incongruent);
        assert!(outcome.timeline[3606].is_silence());
    }
}
