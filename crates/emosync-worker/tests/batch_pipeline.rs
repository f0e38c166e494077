//! End-to-end batch tests with in-process providers.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use image::{Rgb, RgbImage};

use emosync_fusion::{FusionConfig, FusionPipeline, SmoothingKind};
use emosync_models::{AnalysisReport, EmotionScores, InsightKind, TextSegmentRecord};
use emosync_vision::{
    FacialEmotion, FacialEmotionProvider, SpeechEmotionProvider, VisionError, VisionResult,
};
use emosync_worker::{
    discover_videos, BatchExecutor, VideoOutcome, VideoProcessor, WorkerConfig,
};

/// Bright frames read as happy, dark frames as sad.
struct BrightnessFaces {
    calls: AtomicUsize,
}

#[async_trait]
impl FacialEmotionProvider for BrightnessFaces {
    async fn analyze_frame(&self, frame: &[u8]) -> VisionResult<FacialEmotion> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let img = image::load_from_memory(frame)
            .map_err(|e| VisionError::frame_decode(e.to_string()))?
            .to_luma8();
        let pixels = (img.width() * img.height()) as f64;
        let mean = img.pixels().map(|p| p.0[0] as f64).sum::<f64>() / pixels;

        let scores = if mean > 127.0 {
            EmotionScores {
                happy: 88.0,
                neutral: 12.0,
                ..Default::default()
            }
        } else {
            EmotionScores {
                sad: 75.0,
                fear: 25.0,
                ..Default::default()
            }
        };
        Ok(FacialEmotion::new(scores))
    }

    fn name(&self) -> &'static str {
        "brightness"
    }
}

struct ScriptedSpeech {
    segments: Vec<TextSegmentRecord>,
    delay: Duration,
}

#[async_trait]
impl SpeechEmotionProvider for ScriptedSpeech {
    async fn analyze_speech(&self, _audio_path: &Path) -> VisionResult<Vec<TextSegmentRecord>> {
        tokio::time::sleep(self.delay).await;
        Ok(self.segments.clone())
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

fn write_frame(dir: &Path, name: &str, value: u8) {
    RgbImage::from_pixel(48, 48, Rgb([value, value, value]))
        .save(dir.join(name))
        .unwrap();
}

fn frames_dir(root: &Path, video: &str) -> PathBuf {
    let dir = root.join(video).join("frames");
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn config(root: &Path, preference: Vec<SmoothingKind>) -> WorkerConfig {
    let mut fusion = FusionConfig::default();
    fusion.smoothing.preference = preference;

    WorkerConfig {
        input_dir: root.join("input"),
        output_dir: root.join("output"),
        max_concurrent_videos: 2,
        speech_timeout: Duration::from_secs(5),
        fusion,
        ..Default::default()
    }
}

fn processor(
    config: &WorkerConfig,
    faces: Arc<BrightnessFaces>,
    speech: ScriptedSpeech,
) -> Arc<VideoProcessor> {
    let fusion = Arc::new(FusionPipeline::new(config.fusion.clone(), None));
    Arc::new(VideoProcessor::new(config, faces, Arc::new(speech), fusion))
}

fn read_report(config: &WorkerConfig, video_id: &str) -> AnalysisReport {
    let path = config.output_dir.join(format!("{}_analysis.json", video_id));
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[tokio::test]
async fn test_batch_processes_skips_and_reports() {
    let tmp = tempfile::tempdir().unwrap();
    let config = config(tmp.path(), vec![]);

    // v1: pre-computed segments, one cached duplicate, one corrupt frame
    let v1 = frames_dir(&config.input_dir, "v1");
    write_frame(&v1, "frame_0.jpg", 250);
    write_frame(&v1, "frame_1.jpg", 250);
    write_frame(&v1, "frame_2.png", 5);
    std::fs::write(v1.join("frame_3.jpg"), b"not an image").unwrap();
    let segments = vec![TextSegmentRecord::new(0.0, 1.0, "great day", "joy", 0.9)];
    std::fs::write(
        config.input_dir.join("v1").join("segments.json"),
        serde_json::to_vec(&segments).unwrap(),
    )
    .unwrap();

    // v2: no frames at all
    std::fs::create_dir_all(config.input_dir.join("v2")).unwrap();

    // v3: audio track transcribed by the speech provider
    let v3 = frames_dir(&config.input_dir, "v3");
    write_frame(&v3, "frame_0.jpg", 10);
    write_frame(&v3, "frame_1.jpg", 10);
    std::fs::write(config.input_dir.join("v3").join("audio.wav"), b"RIFF").unwrap();

    let faces = Arc::new(BrightnessFaces {
        calls: AtomicUsize::new(0),
    });
    let speech = ScriptedSpeech {
        segments: vec![TextSegmentRecord::new(0.0, 5.0, "this is outrageous", "anger", 0.8)],
        delay: Duration::ZERO,
    };

    let inputs = discover_videos(&config.input_dir).await.unwrap();
    let executor = BatchExecutor::new(&config, processor(&config, faces.clone(), speech));
    let summary = executor.run(inputs).await;

    assert_eq!(summary.completed(), 2);
    assert_eq!(summary.skipped(), 1);
    assert_eq!(summary.failed(), 0);
    assert!(matches!(
        &summary.outcomes[1],
        VideoOutcome::Skipped { video_id, .. } if video_id == "v2"
    ));

    let v1 = read_report(&config, "v1");
    let congruence: Vec<&str> = v1.rows.iter().map(|r| r.congruence.as_str()).collect();
    assert_eq!(
        congruence,
        vec!["congruent", "congruent", "not_applicable", "not_applicable"]
    );
    let change: Vec<&str> = v1.rows.iter().map(|r| r.change.as_str()).collect();
    assert_eq!(change, vec!["initial", "stable", "changed", "changed"]);
    assert_eq!(v1.rows[2].transcript, "[Silence]");
    assert_eq!(v1.rows[3].facial_emotion, "no_detection");
    assert_eq!(v1.frame_stats.cache_hits, 1);
    assert_eq!(v1.frame_stats.unreadable_frames, 1);
    assert_eq!(
        v1.frame_stats.cache_hits + v1.frame_stats.fresh_inferences,
        v1.frame_stats.frames_processed
    );
    assert_eq!(v1.text_segments, 1);
    assert_eq!(v1.smoothing, "none");

    let v3 = read_report(&config, "v3");
    assert!(v3.rows.iter().all(|r| r.congruence == "incongruent"));
    assert_eq!(v3.insights[0].kind, InsightKind::HighIncongruence);

    let csv = std::fs::read_to_string(config.output_dir.join("v3_analysis.csv")).unwrap();
    assert_eq!(csv.lines().count(), 3);
    assert!(csv.lines().nth(1).unwrap().contains("this is outrageous"));

    // v1: two fresh inferences (one hit); v3: one fresh inference (one hit)
    assert_eq!(faces.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_slow_speech_degrades_to_silence() {
    let tmp = tempfile::tempdir().unwrap();
    let mut config = config(tmp.path(), vec![SmoothingKind::RollingMode]);
    config.speech_timeout = Duration::from_millis(50);

    let dir = frames_dir(&config.input_dir, "slow");
    write_frame(&dir, "frame_0.jpg", 240);
    write_frame(&dir, "frame_1.jpg", 20);
    std::fs::write(config.input_dir.join("slow").join("audio.wav"), b"RIFF").unwrap();

    let faces = Arc::new(BrightnessFaces {
        calls: AtomicUsize::new(0),
    });
    let speech = ScriptedSpeech {
        segments: vec![TextSegmentRecord::new(0.0, 1.0, "late", "joy", 0.9)],
        delay: Duration::from_secs(10),
    };

    let inputs = discover_videos(&config.input_dir).await.unwrap();
    let summary = BatchExecutor::new(&config, processor(&config, faces, speech))
        .run(inputs)
        .await;
    assert_eq!(summary.completed(), 1);

    let report = read_report(&config, "slow");
    assert_eq!(report.text_segments, 0);
    assert!(report.rows.iter().all(|r| r.transcript == "[Silence]"));
    assert_eq!(report.smoothing, "rolling_mode");
    // Rolling window of 3 over [happy, sad]: tie goes to happy (lower code).
    assert_eq!(report.rows[1].smoothed_emotion.as_deref(), Some("happy"));
}

/// Run against a live inference service.
#[tokio::test]
#[ignore = "requires ML service"]
async fn test_live_ml_service_health() {
    dotenvy::dotenv().ok();

    let client = emosync_ml_client::MlClient::from_env().expect("Failed to create ML client");
    assert!(client.health_check().await.expect("Health check failed"));
}
