//! Summary metrics and qualitative findings.

use std::collections::HashMap;

use emosync_models::{Congruence, CongruenceMetrics, EmotionLabel, Insight, InsightKind, TimelineRecord};

use crate::change::count_changes;
use crate::config::InsightThresholds;

/// Congruence breakdown over the whole timeline.
///
/// An empty timeline yields [`CongruenceMetrics::empty`].
pub fn compute_metrics(timeline: &[TimelineRecord]) -> CongruenceMetrics {
    if timeline.is_empty() {
        return CongruenceMetrics::empty();
    }

    let (congruent, incongruent, not_applicable) =
        timeline
            .iter()
            .fold((0usize, 0usize, 0usize), |(c, i, n), r| match r.congruence {
                Congruence::Congruent => (c + 1, i, n),
                Congruence::Incongruent => (c, i + 1, n),
                Congruence::NotApplicable => (c, i, n + 1),
            });

    let total = timeline.len();
    let pct = |count: usize| count as f64 * 100.0 / total as f64;

    CongruenceMetrics {
        total_records: total,
        congruent_pct: pct(congruent),
        incongruent_pct: pct(incongruent),
        not_applicable_pct: pct(not_applicable),
        change_count: count_changes(timeline),
    }
}

/// Apply the insight rules.
///
/// Rules fire independently. When none fires a single stable-pattern insight
/// is emitted. An empty timeline produces no insights.
pub fn generate_insights(
    timeline: &[TimelineRecord],
    metrics: &CongruenceMetrics,
    thresholds: &InsightThresholds,
) -> Vec<Insight> {
    if metrics.is_empty() {
        return Vec::new();
    }

    let mut insights = Vec::new();

    if metrics.incongruent_ratio() > thresholds.incongruence_ratio {
        let mut message = format!(
            "High incongruence: facial and spoken emotion disagree in {:.1}% of the interview",
            metrics.incongruent_pct
        );
        if let Some((facial, text)) = most_common_mismatch(timeline) {
            message.push_str(&format!(
                " (most often {} face with {} words)",
                facial, text
            ));
        }
        insights.push(Insight::new(InsightKind::HighIncongruence, message));
    }

    if metrics.change_count > thresholds.max_change_count {
        insights.push(Insight::new(
            InsightKind::HighVariability,
            format!(
                "High emotional variability: {} facial emotion changes detected",
                metrics.change_count
            ),
        ));
    }

    if insights.is_empty() {
        insights.push(Insight::new(
            InsightKind::StablePattern,
            "Stable pattern: facial and spoken emotion are broadly consistent",
        ));
    }

    insights
}

/// Most frequent (facial, text) pair among incongruent records.
///
/// Ties resolve to the smallest pair by label code.
fn most_common_mismatch(timeline: &[TimelineRecord]) -> Option<(EmotionLabel, EmotionLabel)> {
    let mut counts: HashMap<(EmotionLabel, EmotionLabel), usize> = HashMap::new();
    for record in timeline
        .iter()
        .filter(|r| r.congruence == Congruence::Incongruent)
    {
        if let Some(facial) = record.effective_label().emotion() {
            *counts.entry((facial, record.text_label)).or_default() += 1;
        }
    }

    counts
        .into_iter()
        .max_by(|(pair_a, a), (pair_b, b)| a.cmp(b).then_with(|| pair_b.cmp(pair_a)))
        .map(|(pair, _)| pair)
}
