use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Difficulty;

/// One answered question. Written once by the quiz subsystem when the
/// learner submits an answer and immutable afterwards; this engine only
/// ever reads attempts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attempt {
    pub attempt_id: String,
    pub session_id: String,
    pub question_id: String,
    pub course_id: String,
    /// Opaque to this engine; shape depends on the question type.
    pub answer: serde_json::Value,
    pub correct: bool,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// Topics this attempt counts toward. An attempt with several tags
    /// contributes to every one of them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic_tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl Attempt {
    pub fn tags(&self) -> &[String] {
        self.topic_tags.as_deref().unwrap_or(&[])
    }
}
