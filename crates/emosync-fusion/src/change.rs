//! Emotional change detection.
//!
//! Strictly backward-looking: each indicator depends on the current record and
//! its immediate predecessor only. Both the tri-state and boolean forms are
//! offered; `flags[i] == indicators[i].is_change()` always holds.

use emosync_models::{ChangeIndicator, TimelineRecord};

/// Tri-state form: `Initial` for the first record, then `Stable` or `Changed`.
pub fn detect_changes(timeline: &[TimelineRecord]) -> Vec<ChangeIndicator> {
    timeline
        .iter()
        .enumerate()
        .map(|(i, record)| match i {
            0 => ChangeIndicator::Initial,
            _ if timeline[i - 1].effective_label() == record.effective_label() => {
                ChangeIndicator::Stable
            }
            _ => ChangeIndicator::Changed,
        })
        .collect()
}

/// Boolean form: `changed[0] = true`, `changed[i] = label[i] != label[i-1]`.
pub fn detect_change_flags(timeline: &[TimelineRecord]) -> Vec<bool> {
    let labels: Vec<_> = timeline.iter().map(|r| r.effective_label()).collect();

    labels
        .iter()
        .enumerate()
        .map(|(i, label)| i == 0 || labels[i - 1] != *label)
        .collect()
}

/// Write change indicators into the timeline.
pub fn annotate_changes(mut timeline: Vec<TimelineRecord>) -> Vec<TimelineRecord> {
    let indicators = detect_changes(&timeline);
    for (record, change) in timeline.iter_mut().zip(indicators) {
        record.change = change;
    }
    timeline
}

/// Number of `Changed` transitions; the initial marker is not counted.
pub fn count_changes(timeline: &[TimelineRecord]) -> usize {
    timeline
        .iter()
        .filter(|r| r.change == ChangeIndicator::Changed)
        .count()
}
