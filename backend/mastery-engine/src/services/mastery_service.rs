//! The mastery update orchestrator: the only stateful part of the engine.
//!
//! One quiz session's attempts come in; per touched topic the full attempt
//! history is re-fetched and the mastery row re-derived from scratch inside
//! one store transaction. Mastery is a pure re-aggregation of persisted
//! history, never an incremental delta, so re-running an update is always
//! safe.

use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::config::Config;
use crate::metrics::{
    track_store_operation, MASTERY_UPDATES_TOTAL, MISTAKE_BANK_ITEMS_TOTAL, TOPICS_RECOMPUTED_TOTAL,
};
use crate::models::{
    Attempt, MasteryDelta, MasteryHistory, MasteryScore, MasteryScorePatch, MasteryStatus,
    MistakeBankItem,
};
use crate::scoring::{
    build_question_type_breakdown, calculate_topic_score, compute_trend, score_to_status,
};
use crate::storage::{MasteryStore, StoreError, Table};
use crate::utils::retry::{retry_if, RetryConfig};

#[derive(Clone)]
pub struct MasteryService {
    store: Arc<dyn MasteryStore>,
    retry: RetryConfig,
    detach_updates: bool,
}

impl MasteryService {
    pub fn new(store: Arc<dyn MasteryStore>, config: &Config) -> Self {
        Self {
            store,
            retry: config.store_retry(),
            detach_updates: config.detach_mastery_updates,
        }
    }

    /// Fold one just-completed quiz session into the mastery tables and
    /// return what changed per topic.
    ///
    /// The session's attempts must already be persisted: each topic is
    /// recomputed from the store's full history, not from the slice passed
    /// here (the slice decides *which* topics and mistakes to touch).
    /// Storage failures propagate; topics committed before the failure stay
    /// committed, and the quiz session itself is never affected.
    pub async fn update_mastery_after_quiz(
        &self,
        course_id: &str,
        session_attempts: &[Attempt],
    ) -> Result<Vec<MasteryDelta>> {
        let result = self.run_update(course_id, session_attempts).await;
        let status = if result.is_ok() { "success" } else { "error" };
        MASTERY_UPDATES_TOTAL.with_label_values(&[status]).inc();
        result
    }

    /// Run the update according to configuration: detached onto a background
    /// task (returning `None` immediately) or awaited in place. Mirrors the
    /// product decision that quiz completion must not block on bookkeeping.
    pub async fn after_quiz(
        &self,
        course_id: &str,
        session_attempts: Vec<Attempt>,
    ) -> Result<Option<Vec<MasteryDelta>>> {
        if self.detach_updates {
            let _handle = self.spawn_update_after_quiz(course_id.to_string(), session_attempts);
            return Ok(None);
        }
        self.update_mastery_after_quiz(course_id, &session_attempts)
            .await
            .map(Some)
    }

    /// Fire-and-forget form. Failures are logged and counted but never
    /// surface to the quiz flow; the returned handle lets callers await or
    /// observe the outcome when they care.
    pub fn spawn_update_after_quiz(
        &self,
        course_id: String,
        session_attempts: Vec<Attempt>,
    ) -> JoinHandle<Result<Vec<MasteryDelta>>> {
        let service = self.clone();
        tokio::spawn(async move {
            let result = service
                .update_mastery_after_quiz(&course_id, &session_attempts)
                .await;
            if let Err(e) = &result {
                tracing::error!("Background mastery update failed for {}: {:#}", course_id, e);
            }
            result
        })
    }

    async fn run_update(
        &self,
        course_id: &str,
        session_attempts: &[Attempt],
    ) -> Result<Vec<MasteryDelta>> {
        if session_attempts.is_empty() {
            tracing::debug!(course_id, "empty quiz session, nothing to update");
            return Ok(Vec::new());
        }

        let topics = topics_touched(session_attempts);
        tracing::info!(
            course_id,
            attempts = session_attempts.len(),
            topics = topics.len(),
            "updating mastery after quiz"
        );

        let mut deltas = Vec::with_capacity(topics.len());
        for topic_tag in &topics {
            let delta = retry_if(self.retry.clone(), StoreError::is_transient, || {
                track_store_operation(
                    "topic_update",
                    Table::MasteryScores.name(),
                    self.recompute_topic(course_id, topic_tag),
                )
            })
            .await
            .with_context(|| format!("failed to update mastery for topic '{topic_tag}'"))?;

            TOPICS_RECOMPUTED_TOTAL
                .with_label_values(&[delta.trend.as_label()])
                .inc();
            deltas.push(delta);
        }

        retry_if(self.retry.clone(), StoreError::is_transient, || {
            track_store_operation(
                "mistake_pass",
                Table::MistakeBank.name(),
                self.record_mistakes(course_id, session_attempts),
            )
        })
        .await
        .context("failed to update mistake bank")?;

        Ok(deltas)
    }

    /// One topic's read-modify-write unit, atomic relative to any other
    /// writer of the same mastery row: read full history, re-derive, upsert,
    /// snapshot.
    async fn recompute_topic(
        &self,
        course_id: &str,
        topic_tag: &str,
    ) -> Result<MasteryDelta, StoreError> {
        let mut txn = self
            .store
            .begin(&[Table::Attempts, Table::MasteryScores, Table::MasteryHistory])
            .await?;

        let history = txn.attempts_for_topic(course_id, topic_tag).await?;
        let now = Utc::now();
        let score = calculate_topic_score(&history, now);
        let status = score_to_status(score);
        let breakdown = build_question_type_breakdown(&history);

        let existing = txn.find_mastery_score(course_id, topic_tag).await?;
        let previous_score = existing.as_ref().map_or(0.0, |m| m.score);
        let previous_status = existing
            .as_ref()
            .map_or(MasteryStatus::NotStarted, |m| m.status);
        let trend = compute_trend(score, existing.as_ref().map(|m| m.score));

        let mastery_id = match existing {
            Some(existing) => {
                txn.update_mastery_score(
                    &existing.mastery_id,
                    MasteryScorePatch {
                        score,
                        status,
                        attempt_count: history.len(),
                        last_attempt_at: now,
                        updated_at: now,
                        question_type_breakdown: breakdown,
                        trend,
                    },
                )
                .await?;
                existing.mastery_id
            }
            None => {
                let mastery_id = Uuid::new_v4().to_string();
                txn.insert_mastery_score(MasteryScore {
                    mastery_id: mastery_id.clone(),
                    course_id: course_id.to_string(),
                    topic_tag: topic_tag.to_string(),
                    score,
                    status,
                    attempt_count: history.len(),
                    last_attempt_at: now,
                    updated_at: now,
                    question_type_breakdown: Some(breakdown),
                    trend: Some(trend),
                })
                .await?;
                mastery_id
            }
        };

        txn.append_history(MasteryHistory {
            history_id: Uuid::new_v4().to_string(),
            mastery_id,
            score,
            status,
            recorded_at: now,
        })
        .await?;

        txn.commit().await?;

        tracing::debug!(topic_tag, score, ?status, ?trend, "topic mastery recomputed");

        Ok(MasteryDelta {
            topic_tag: topic_tag.to_string(),
            previous_score,
            previous_status,
            new_score: score,
            new_status: status,
            trend,
        })
    }

    /// Mistake bank pass: the first wrong attempt on a question creates an
    /// item; any later wrong attempt on the same question is a no-op. Keyed
    /// by question_id alone, resolution state is not consulted.
    async fn record_mistakes(
        &self,
        course_id: &str,
        session_attempts: &[Attempt],
    ) -> Result<(), StoreError> {
        let mut txn = self.store.begin(&[Table::MistakeBank]).await?;

        for attempt in session_attempts.iter().filter(|a| !a.correct) {
            if txn
                .find_mistake_for_question(&attempt.question_id)
                .await?
                .is_some()
            {
                MISTAKE_BANK_ITEMS_TOTAL
                    .with_label_values(&["deduped"])
                    .inc();
                continue;
            }

            txn.insert_mistake(MistakeBankItem {
                mistake_id: Uuid::new_v4().to_string(),
                course_id: course_id.to_string(),
                question_id: attempt.question_id.clone(),
                attempt_id: attempt.attempt_id.clone(),
                topic_tags: attempt.tags().to_vec(),
                created_at: Utc::now(),
                resolved_at: None,
                review_count: None,
            })
            .await?;
            MISTAKE_BANK_ITEMS_TOTAL
                .with_label_values(&["created"])
                .inc();
        }

        txn.commit().await
    }

    // Read-side helpers for the course-map and review screens.

    pub async fn course_mastery(&self, course_id: &str) -> Result<Vec<MasteryScore>> {
        self.store
            .mastery_for_course(course_id)
            .await
            .with_context(|| format!("failed to load mastery for course '{course_id}'"))
    }

    pub async fn mastery_history(&self, mastery_id: &str) -> Result<Vec<MasteryHistory>> {
        self.store
            .history_for_mastery(mastery_id)
            .await
            .with_context(|| format!("failed to load history for mastery '{mastery_id}'"))
    }

    pub async fn mistake_bank(&self, course_id: &str) -> Result<Vec<MistakeBankItem>> {
        self.store
            .mistakes_for_course(course_id)
            .await
            .with_context(|| format!("failed to load mistake bank for course '{course_id}'"))
    }
}

/// Distinct topics a session touched. An attempt carrying several tags fans
/// out to all of them; untagged attempts touch no topic (they still feed the
/// mistake bank).
fn topics_touched(session_attempts: &[Attempt]) -> BTreeSet<String> {
    session_attempts
        .iter()
        .flat_map(|a| a.tags().iter().cloned())
        .collect()
}
