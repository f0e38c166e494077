//! Timeline synchronization.
//!
//! Merges the per-second facial stream with the interval-based text stream.
//! Each facial record is matched against the text segments whose closed
//! interval `[start, end]` contains its second. When several segments
//! overlap a second, the first one in the text stream's original order wins.
//! Seconds with no covering segment are marked as silence with a neutral
//! text label.

use std::borrow::Cow;
use std::collections::HashMap;

use emosync_models::{
    normalize_text_label, ChangeIndicator, Congruence, EmotionLabel, FacialEmotionRecord,
    TextSegmentRecord, TimelineRecord, SILENCE,
};
use tracing::warn;

use crate::error::{FusionError, FusionResult};

/// Merge the two streams with a linear scan per second.
///
/// O(frames × segments); fine for interview-length inputs. Use
/// [`synchronize_indexed`] for long recordings.
///
/// Congruence and change fields are placeholders (`NotApplicable`, `Initial`)
/// until the classifier and change detector run.
pub fn synchronize(
    facial: &[FacialEmotionRecord],
    segments: &[TextSegmentRecord],
) -> FusionResult<Vec<TimelineRecord>> {
    let facial = ordered(facial)?;

    Ok(facial
        .iter()
        .map(|record| fuse(record, segments.iter().find(|s| s.covers(record.second))))
        .collect())
}

/// Same result as [`synchronize`], using a per-second segment index.
pub fn synchronize_indexed(
    facial: &[FacialEmotionRecord],
    segments: &[TextSegmentRecord],
) -> FusionResult<Vec<TimelineRecord>> {
    let facial = ordered(facial)?;
    let max_second = facial.last().map(|r| r.second).unwrap_or(0);
    let index = SegmentIndex::build(segments, max_second);

    Ok(facial
        .iter()
        .map(|record| fuse(record, index.lookup(record.second)))
        .collect())
}

/// Maps each whole second to the first segment (in stream order) covering it.
#[derive(Debug, Default)]
pub struct SegmentIndex<'a> {
    by_second: HashMap<u32, &'a TextSegmentRecord>,
}

impl<'a> SegmentIndex<'a> {
    /// Index all segments, ignoring seconds past `max_second`.
    pub fn build(segments: &'a [TextSegmentRecord], max_second: u32) -> Self {
        let mut by_second = HashMap::new();

        for segment in segments {
            // NaN bounds and inverted intervals cover nothing.
            if segment.start.is_nan() || segment.end.is_nan() || segment.start > segment.end {
                continue;
            }
            let first = segment.start.max(0.0).ceil();
            let last = segment.end.floor().min(max_second as f64);
            if last < first {
                continue;
            }
            for second in first as u32..=last as u32 {
                by_second.entry(second).or_insert(segment);
            }
        }

        Self { by_second }
    }

    pub fn lookup(&self, second: u32) -> Option<&'a TextSegmentRecord> {
        self.by_second.get(&second).copied()
    }

    pub fn len(&self) -> usize {
        self.by_second.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_second.is_empty()
    }
}

fn fuse(record: &FacialEmotionRecord, segment: Option<&TextSegmentRecord>) -> TimelineRecord {
    let (matched_text, raw_text_label, text_label) = match segment {
        Some(seg) => (
            seg.text.clone(),
            Some(seg.dominant_label.clone()),
            normalize_text_label(&seg.dominant_label),
        ),
        None => (SILENCE.to_string(), None, EmotionLabel::Neutral),
    };

    TimelineRecord {
        second: record.second,
        facial_label: record.dominant_label,
        facial_vector: record.emotion_vector,
        matched_text,
        raw_text_label,
        text_label,
        congruence: Congruence::NotApplicable,
        change: ChangeIndicator::Initial,
        smoothed_label: None,
    }
}

/// Borrow the stream when it is already strictly ascending; otherwise sort it
/// and keep the first record for each duplicated second.
fn ordered(facial: &[FacialEmotionRecord]) -> FusionResult<Cow<'_, [FacialEmotionRecord]>> {
    if facial.is_empty() {
        return Err(FusionError::empty_input("facial stream has no records"));
    }

    if facial.windows(2).all(|w| w[0].second < w[1].second) {
        return Ok(Cow::Borrowed(facial));
    }

    let mut sorted = facial.to_vec();
    sorted.sort_by_key(|r| r.second);
    sorted.dedup_by_key(|r| r.second);

    warn!(
        records = facial.len(),
        unique_seconds = sorted.len(),
        "Facial stream out of order or has duplicate seconds, normalizing"
    );

    Ok(Cow::Owned(sorted))
}
