//! Congruence classification.

use emosync_models::{normalize_text_label, Congruence, TimelineRecord};

/// Classify one timeline record.
///
/// Rules, in order:
/// 1. no facial detection, or silence: `NotApplicable`
/// 2. normalized text label equals the facial label: `Congruent`
/// 3. otherwise `Incongruent`
///
/// The facial side is the effective label (smoothed when available).
/// Pure and per-record, so re-running it is idempotent.
pub fn classify(record: &TimelineRecord) -> Congruence {
    let Some(facial) = record.effective_label().emotion() else {
        return Congruence::NotApplicable;
    };
    if record.is_silence() {
        return Congruence::NotApplicable;
    }

    let text = record
        .raw_text_label
        .as_deref()
        .map(normalize_text_label)
        .unwrap_or(record.text_label);

    if text == facial {
        Congruence::Congruent
    } else {
        Congruence::Incongruent
    }
}

/// Classify every record of a timeline.
pub fn classify_timeline(timeline: Vec<TimelineRecord>) -> Vec<TimelineRecord> {
    timeline
        .into_iter()
        .map(|mut record| {
            record.congruence = classify(&record);
            record
        })
        .collect()
}
