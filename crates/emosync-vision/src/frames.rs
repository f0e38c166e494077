//! Frame discovery.
//!
//! Frames are extracted upstream at one per second and named
//! `frame_<second>.<ext>`. Listing sorts numerically by the embedded second.

use std::path::{Path, PathBuf};

use image::ImageFormat;
use tracing::debug;

use crate::error::{VisionError, VisionResult};

const FRAME_PREFIX: &str = "frame_";
const FRAME_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// A frame file on disk and the second it represents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameRef {
    pub second: u32,
    pub path: PathBuf,
}

/// Parse the second out of a `frame_<n>.jpg` file name.
pub fn parse_frame_second(file_name: &str) -> Option<u32> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if !FRAME_EXTENSIONS
        .iter()
        .any(|allowed| ext.eq_ignore_ascii_case(allowed))
    {
        return None;
    }
    stem.strip_prefix(FRAME_PREFIX)?.parse().ok()
}

/// Upload file name and MIME type for encoded frame bytes, sniffed from the
/// image signature.
pub fn frame_content_type(bytes: &[u8]) -> (&'static str, &'static str) {
    match image::guess_format(bytes) {
        Ok(ImageFormat::Jpeg) => ("frame.jpg", "image/jpeg"),
        Ok(ImageFormat::Png) => ("frame.png", "image/png"),
        _ => ("frame.bin", "application/octet-stream"),
    }
}

/// List the frames in `dir`, ordered by second.
///
/// Files that don't follow the naming convention are ignored. Duplicate
/// seconds (e.g. `frame_3.jpg` and `frame_3.png`) keep the first path in
/// lexical order.
pub async fn list_frames(dir: &Path) -> VisionResult<Vec<FrameRef>> {
    if !tokio::fs::try_exists(dir).await.unwrap_or(false) {
        return Err(VisionError::FileNotFound(dir.to_path_buf()));
    }

    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut frames = Vec::new();
    let mut skipped = 0usize;

    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            skipped += 1;
            continue;
        };
        match parse_frame_second(name) {
            Some(second) => frames.push(FrameRef {
                second,
                path: entry.path(),
            }),
            None => skipped += 1,
        }
    }

    frames.sort_by(|a, b| a.second.cmp(&b.second).then_with(|| a.path.cmp(&b.path)));
    frames.dedup_by_key(|frame| frame.second);

    debug!(
        dir = %dir.display(),
        frames = frames.len(),
        skipped,
        "Listed frames"
    );

    Ok(frames)
}
