use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{MasteryStatus, MasteryTrend};

/// Per-(course, topic) mastery record. At most one exists per pair; created
/// on the first attempt for a topic and mutated in place on every quiz
/// completion touching that topic. Never deleted by this engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasteryScore {
    pub mastery_id: String,
    pub course_id: String,
    pub topic_tag: String,
    /// 0–100, recency-decayed and difficulty-weighted.
    pub score: f64,
    pub status: MasteryStatus,
    /// Total attempts folded into the current score.
    pub attempt_count: usize,
    pub last_attempt_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Unweighted per-tag accuracy, for diagnostic display only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_type_breakdown: Option<BTreeMap<String, u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend: Option<MasteryTrend>,
}

/// Fields recomputed on every update of an existing mastery row.
#[derive(Debug, Clone)]
pub struct MasteryScorePatch {
    pub score: f64,
    pub status: MasteryStatus,
    pub attempt_count: usize,
    pub last_attempt_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub question_type_breakdown: BTreeMap<String, u32>,
    pub trend: MasteryTrend,
}

/// Append-only snapshot taken every time the owning mastery row is
/// recomputed. The audit trail behind trend charts; never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasteryHistory {
    pub history_id: String,
    pub mastery_id: String,
    pub score: f64,
    pub status: MasteryStatus,
    pub recorded_at: DateTime<Utc>,
}

/// What changed for one topic during a quiz-completion update. Returned to
/// the caller for the results screen; not persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasteryDelta {
    pub topic_tag: String,
    pub previous_score: f64,
    pub previous_status: MasteryStatus,
    pub new_score: f64,
    pub new_status: MasteryStatus,
    pub trend: MasteryTrend,
}
