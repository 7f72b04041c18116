//! Pure scoring functions. No I/O; everything here is a total function over
//! its input, deterministic once `now` is fixed.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::models::{Attempt, Difficulty, MasteryStatus, MasteryTrend};
use crate::utils::time::fractional_days_between;

/// Daily multiplier for the recency decay. 0.9^days gives a half-life of
/// roughly 6.6 days, so attempts older than a few weeks count almost nothing.
const RECENCY_DECAY_PER_DAY: f64 = 0.9;

/// Score movement within ±5 points is reported as Stable so marginal
/// fluctuations don't flip the trend arrow.
const TREND_DEAD_ZONE: f64 = 5.0;

/// Compute a 0–100 mastery score from a set of attempts.
///
/// The caller is responsible for pre-filtering to one topic. Each attempt is
/// weighted by its difficulty (Easy 1, Medium 2, Hard 3; unrecorded
/// difficulty counts as Medium) and by an exponential recency decay, then
/// the score is the weighted fraction answered correctly.
pub fn calculate_topic_score(attempts: &[Attempt], now: DateTime<Utc>) -> f64 {
    if attempts.is_empty() {
        return 0.0;
    }

    let mut weighted_correct = 0.0;
    let mut weighted_total = 0.0;

    for attempt in attempts {
        let days_ago = fractional_days_between(now, attempt.timestamp);
        let difficulty_weight = attempt.difficulty.unwrap_or(Difficulty::Medium).weight();
        let recency_weight = RECENCY_DECAY_PER_DAY.powf(days_ago);
        let weight = difficulty_weight * recency_weight;

        if attempt.correct {
            weighted_correct += weight;
        }
        weighted_total += weight;
    }

    if weighted_total == 0.0 {
        return 0.0;
    }
    weighted_correct / weighted_total * 100.0
}

/// Threshold classification of a score. Exact boundaries; see the note on
/// [`MasteryStatus`] about the Weak/InProgress ordering.
pub fn score_to_status(score: f64) -> MasteryStatus {
    if score < 25.0 {
        MasteryStatus::NotStarted
    } else if score < 50.0 {
        MasteryStatus::InProgress
    } else if score < 75.0 {
        MasteryStatus::Weak
    } else {
        MasteryStatus::Mastered
    }
}

/// Trend of the current score against the previous one. `None` means no
/// prior mastery row existed, which reads as Stable.
pub fn compute_trend(current_score: f64, previous_score: Option<f64>) -> MasteryTrend {
    let Some(previous) = previous_score else {
        return MasteryTrend::Stable;
    };
    let delta = current_score - previous;
    if delta > TREND_DEAD_ZONE {
        MasteryTrend::Improving
    } else if delta < -TREND_DEAD_ZONE {
        MasteryTrend::Declining
    } else {
        MasteryTrend::Stable
    }
}

/// Per-tag accuracy percentage, rounded. Unlike the main score this is
/// unweighted: no recency decay, no difficulty weight. An attempt carrying
/// several tags counts under every one of them.
pub fn build_question_type_breakdown(attempts: &[Attempt]) -> BTreeMap<String, u32> {
    let mut groups: BTreeMap<String, (u32, u32)> = BTreeMap::new();

    for attempt in attempts {
        for tag in attempt.tags() {
            let (correct, total) = groups.entry(tag.clone()).or_insert((0, 0));
            *total += 1;
            if attempt.correct {
                *correct += 1;
            }
        }
    }

    groups
        .into_iter()
        .map(|(tag, (correct, total))| {
            let percent = if total > 0 {
                (f64::from(correct) / f64::from(total) * 100.0).round() as u32
            } else {
                0
            };
            (tag, percent)
        })
        .collect()
}
