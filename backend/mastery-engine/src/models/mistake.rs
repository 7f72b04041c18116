use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry per question the learner has gotten wrong. Created by the first
/// incorrect attempt on a question; later incorrect attempts are ignored, so
/// at most one item exists per question_id.
///
/// `resolved_at` and `review_count` are carried for the review screens but
/// nothing in the update path sets or clears them, and dedup ignores them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MistakeBankItem {
    pub mistake_id: String,
    pub course_id: String,
    pub question_id: String,
    /// The attempt that created this item.
    pub attempt_id: String,
    pub topic_tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_count: Option<u32>,
}
