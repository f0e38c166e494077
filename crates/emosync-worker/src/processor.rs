//! Per-video processing.
//!
//! One video flows through: frame listing → facial analysis (with the frame
//! cache) → text segments (pre-computed file or speech service) → fusion →
//! report. Missing frames skip the video; a missing or failing text stream
//! degrades to silence for every second.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use emosync_fusion::FusionPipeline;
use emosync_models::{AnalysisReport, TextSegmentRecord};
use emosync_vision::{
    list_frames, FacialAnalyzer, FacialAnalyzerConfig, FacialEmotionProvider,
    SpeechEmotionProvider, VisionError,
};
use tracing::{debug, info};

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::input::VideoInput;
use crate::logging::VideoLogger;

/// Shared, read-only services used to process videos.
///
/// Model handles are loaded once and injected here; the processor holds no
/// per-video state, so one instance serves every concurrent video.
pub struct VideoProcessor {
    facial: Arc<dyn FacialEmotionProvider>,
    speech: Arc<dyn SpeechEmotionProvider>,
    fusion: Arc<FusionPipeline>,
    analyzer_config: FacialAnalyzerConfig,
    speech_timeout: Duration,
    summary_rows: usize,
}

impl VideoProcessor {
    pub fn new(
        config: &WorkerConfig,
        facial: Arc<dyn FacialEmotionProvider>,
        speech: Arc<dyn SpeechEmotionProvider>,
        fusion: Arc<FusionPipeline>,
    ) -> Self {
        Self {
            facial,
            speech,
            fusion,
            analyzer_config: config.facial_analyzer(),
            speech_timeout: config.speech_timeout,
            summary_rows: config.summary_rows,
        }
    }

    /// Analyze one video and build its report.
    pub async fn process(&self, input: &VideoInput) -> WorkerResult<AnalysisReport> {
        let logger = VideoLogger::new(&input.video_id, "congruence_analysis");
        logger.log_start(&format!("frames_dir={}", input.frames_dir.display()));

        let frames = list_frames(&input.frames_dir).await.map_err(|e| match e {
            VisionError::FileNotFound(path) => {
                WorkerError::missing_input(format!("frames directory {} not found", path.display()))
            }
            other => WorkerError::Vision(other),
        })?;
        if frames.is_empty() {
            return Err(WorkerError::missing_input(format!(
                "no frame_<second> images in {}",
                input.frames_dir.display()
            )));
        }

        let mut analyzer = FacialAnalyzer::new(Arc::clone(&self.facial), self.analyzer_config.clone());
        let facial = analyzer.analyze_frames(&frames).await;
        logger.log_progress(&format!(
            "frames analysed: {} ({} cache hits, {} fallbacks)",
            facial.stats.total_frames, facial.stats.cache_hits, facial.stats.fallbacks
        ));

        let segments = self.load_segments(input, &logger).await;
        logger.log_progress(&format!("text segments: {}", segments.len()));
        let segment_count = segments.len();

        let fusion = Arc::clone(&self.fusion);
        let records = facial.records;
        let outcome = tokio::task::spawn_blocking(move || fusion.run(&records, &segments))
            .await
            .map_err(|e| WorkerError::processing_failed(format!("fusion task failed: {}", e)))??;

        let report = AnalysisReport::new(
            input.video_id.clone(),
            outcome.smoothing,
            &outcome.timeline,
            self.fusion.config().change_format,
            outcome.metrics,
            outcome.insights,
        )
        .with_frame_stats(facial.stats)
        .with_text_segments(segment_count);

        for row in report.rows.iter().take(self.summary_rows) {
            info!(
                video_id = %input.video_id,
                second = row.second,
                facial = %row.facial_emotion,
                text = %row.text_emotion,
                congruence = %row.congruence,
                "Report row"
            );
        }

        logger.log_completion(&format!(
            "{} records, {:.1}% congruent, {:.1}% incongruent, {} changes, smoothing={}",
            report.metrics.total_records,
            report.metrics.congruent_pct,
            report.metrics.incongruent_pct,
            report.metrics.change_count,
            report.smoothing
        ));

        Ok(report)
    }

    /// Text stream for a video: `segments.json` when present, otherwise the
    /// speech service. Any failure yields an empty stream.
    async fn load_segments(&self, input: &VideoInput, logger: &VideoLogger) -> Vec<TextSegmentRecord> {
        if let Some(path) = &input.segments_path {
            match read_segments_file(path).await {
                Ok(segments) => {
                    debug!(path = %path.display(), "Using pre-computed text segments");
                    return segments;
                }
                Err(e) => logger.log_warning(&format!(
                    "ignoring unreadable {}: {}",
                    path.display(),
                    e
                )),
            }
        }

        let Some(audio_path) = &input.audio_path else {
            logger.log_warning("no audio track, treating every second as silence");
            return Vec::new();
        };

        match tokio::time::timeout(self.speech_timeout, self.speech.analyze_speech(audio_path)).await
        {
            Ok(Ok(segments)) => segments,
            Ok(Err(e)) => {
                logger.log_warning(&format!(
                    "speech analysis failed ({}), treating every second as silence",
                    e
                ));
                Vec::new()
            }
            Err(_) => {
                logger.log_warning(&format!(
                    "speech analysis timed out after {:?}, treating every second as silence",
                    self.speech_timeout
                ));
                Vec::new()
            }
        }
    }
}

/// Load a `segments.json` list, normalising each entry like a freshly
/// produced segment.
async fn read_segments_file(path: &Path) -> WorkerResult<Vec<TextSegmentRecord>> {
    let bytes = tokio::fs::read(path).await?;
    let segments: Vec<TextSegmentRecord> = serde_json::from_slice(&bytes)?;
    Ok(segments
        .into_iter()
        .map(|s| TextSegmentRecord::new(s.start, s.end, s.text, s.dominant_label, s.confidence))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments_file_text_is_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("segments.json");
        std::fs::write(
            &path,
            r#"[{"start": 0.0, "end": 2.5, "text": "  so happy to be here \n", "dominant_label": "joy"}]"#,
        )
        .unwrap();

        let segments = tokio_test::block_on(read_segments_file(&path)).unwrap();

        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "so happy to be here");
        assert_eq!(segments[0].dominant_label, "joy");
        assert_eq!(segments[0].confidence, 0.0);
    }
}
