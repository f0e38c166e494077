//! Input discovery.
//!
//! The input directory holds one sub-directory per video:
//!
//! ```text
//! <input>/<video_id>/frames/frame_<second>.jpg
//! <input>/<video_id>/audio.wav            (or .mp3 / .m4a / .flac)
//! <input>/<video_id>/segments.json        (optional, pre-computed text segments)
//! ```
//!
//! Discovery only records paths; whether they exist is checked when the
//! video is processed, so one broken video never hides the others.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{WorkerError, WorkerResult};

pub const FRAMES_DIR: &str = "frames";
pub const SEGMENTS_FILE: &str = "segments.json";
const AUDIO_FILES: [&str; 4] = ["audio.wav", "audio.mp3", "audio.m4a", "audio.flac"];

/// Paths making up one video's unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoInput {
    pub video_id: String,
    pub frames_dir: PathBuf,
    pub audio_path: Option<PathBuf>,
    pub segments_path: Option<PathBuf>,
}

impl VideoInput {
    /// Describe the video stored in `dir`.
    pub async fn from_dir(dir: &Path) -> Self {
        let video_id = dir
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| dir.display().to_string());

        let mut audio_path = None;
        for name in AUDIO_FILES {
            let candidate = dir.join(name);
            if exists(&candidate).await {
                audio_path = Some(candidate);
                break;
            }
        }

        let segments = dir.join(SEGMENTS_FILE);
        let segments_path = if exists(&segments).await {
            Some(segments)
        } else {
            None
        };

        Self {
            video_id,
            frames_dir: dir.join(FRAMES_DIR),
            audio_path,
            segments_path,
        }
    }
}

/// List videos under `input_dir`, sorted by video ID.
pub async fn discover_videos(input_dir: &Path) -> WorkerResult<Vec<VideoInput>> {
    if !exists(input_dir).await {
        return Err(WorkerError::missing_input(format!(
            "input directory {} does not exist",
            input_dir.display()
        )));
    }

    let mut dirs = Vec::new();
    let mut entries = tokio::fs::read_dir(input_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();

    let mut videos = Vec::with_capacity(dirs.len());
    for dir in dirs {
        videos.push(VideoInput::from_dir(&dir).await);
    }

    debug!(input_dir = %input_dir.display(), videos = videos.len(), "Discovered videos");
    Ok(videos)
}

async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}
