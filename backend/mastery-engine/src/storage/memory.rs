//! In-memory store. The test double for the engine and the reference
//! semantics for real backends: whole-store locking, copy-on-write
//! transactions, and a compound (course, topic) index that can be disabled
//! to exercise the linear-scan fallback.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use crate::models::{Attempt, MasteryHistory, MasteryScore, MasteryScorePatch, MistakeBankItem};

use super::{MasteryStore, StoreError, StoreTxn, Table};

#[derive(Debug, Default, Clone)]
struct Tables {
    attempts: Vec<Attempt>,
    mastery_scores: HashMap<String, MasteryScore>,
    mastery_history: Vec<MasteryHistory>,
    mistake_bank: HashMap<String, MistakeBankItem>,
    /// (course_id, topic_tag) -> mastery_id. Maintained on every insert;
    /// whether lookups use it depends on the store's index flag.
    topic_index: HashMap<(String, String), String>,
}

impl Tables {
    fn attempts_for_topic(&self, course_id: &str, topic_tag: &str) -> Vec<Attempt> {
        self.attempts
            .iter()
            .filter(|a| a.course_id == course_id && a.tags().iter().any(|t| t == topic_tag))
            .cloned()
            .collect()
    }

    fn find_mastery_score(
        &self,
        course_id: &str,
        topic_tag: &str,
        use_compound_index: bool,
    ) -> Option<MasteryScore> {
        if use_compound_index {
            self.topic_index
                .get(&(course_id.to_string(), topic_tag.to_string()))
                .and_then(|id| self.mastery_scores.get(id))
                .cloned()
        } else {
            // Fallback path for stores without the compound index: scan the
            // course's rows. Same result, just slower.
            self.mastery_scores
                .values()
                .find(|m| m.course_id == course_id && m.topic_tag == topic_tag)
                .cloned()
        }
    }

    fn find_mistake_for_question(&self, question_id: &str) -> Option<MistakeBankItem> {
        self.mistake_bank
            .values()
            .find(|m| m.question_id == question_id)
            .cloned()
    }
}

pub struct MemoryStore {
    inner: Arc<Mutex<Tables>>,
    use_compound_index: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Tables::default())),
            use_compound_index: true,
        }
    }

    /// A store that never resolves mastery lookups through the compound
    /// index, forcing the linear-scan path. Results must be identical.
    pub fn without_compound_index() -> Self {
        Self {
            use_compound_index: false,
            ..Self::new()
        }
    }

    /// Seed one attempt, standing in for the quiz subsystem which owns the
    /// attempts table in the real app.
    pub async fn insert_attempt(&self, attempt: Attempt) {
        self.inner.lock().await.attempts.push(attempt);
    }

    pub async fn insert_attempts(&self, attempts: impl IntoIterator<Item = Attempt>) {
        self.inner.lock().await.attempts.extend(attempts);
    }

    /// Row counts per table, in the order attempts / mastery / history /
    /// mistakes. Test helper for "no writes happened" assertions.
    pub async fn table_counts(&self) -> (usize, usize, usize, usize) {
        let tables = self.inner.lock().await;
        (
            tables.attempts.len(),
            tables.mastery_scores.len(),
            tables.mastery_history.len(),
            tables.mistake_bank.len(),
        )
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MasteryStore for MemoryStore {
    async fn attempts_for_topic(
        &self,
        course_id: &str,
        topic_tag: &str,
    ) -> Result<Vec<Attempt>, StoreError> {
        Ok(self.inner.lock().await.attempts_for_topic(course_id, topic_tag))
    }

    async fn find_mastery_score(
        &self,
        course_id: &str,
        topic_tag: &str,
    ) -> Result<Option<MasteryScore>, StoreError> {
        Ok(self
            .inner
            .lock()
            .await
            .find_mastery_score(course_id, topic_tag, self.use_compound_index))
    }

    async fn mastery_for_course(&self, course_id: &str) -> Result<Vec<MasteryScore>, StoreError> {
        let tables = self.inner.lock().await;
        let mut rows: Vec<MasteryScore> = tables
            .mastery_scores
            .values()
            .filter(|m| m.course_id == course_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.topic_tag.cmp(&b.topic_tag));
        Ok(rows)
    }

    async fn history_for_mastery(
        &self,
        mastery_id: &str,
    ) -> Result<Vec<MasteryHistory>, StoreError> {
        let tables = self.inner.lock().await;
        let mut rows: Vec<MasteryHistory> = tables
            .mastery_history
            .iter()
            .filter(|h| h.mastery_id == mastery_id)
            .cloned()
            .collect();
        rows.sort_by_key(|h| h.recorded_at);
        Ok(rows)
    }

    async fn find_mistake_for_question(
        &self,
        question_id: &str,
    ) -> Result<Option<MistakeBankItem>, StoreError> {
        Ok(self.inner.lock().await.find_mistake_for_question(question_id))
    }

    async fn mistakes_for_course(
        &self,
        course_id: &str,
    ) -> Result<Vec<MistakeBankItem>, StoreError> {
        let tables = self.inner.lock().await;
        let mut rows: Vec<MistakeBankItem> = tables
            .mistake_bank
            .values()
            .filter(|m| m.course_id == course_id)
            .cloned()
            .collect();
        rows.sort_by_key(|m| m.created_at);
        Ok(rows)
    }

    async fn begin(&self, tables: &[Table]) -> Result<Box<dyn StoreTxn>, StoreError> {
        debug!(?tables, "opening memory store transaction");
        // Whole-store lock: coarser than the requested table set, which is
        // fine for a single-user local store.
        let guard = Arc::clone(&self.inner).lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTxn {
            guard,
            working,
            use_compound_index: self.use_compound_index,
        }))
    }
}

/// Copy-on-write transaction: reads and writes go to a working copy of the
/// tables; `commit` swaps it in while the store lock is still held. Dropping
/// without committing leaves the store untouched.
struct MemoryTxn {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
    use_compound_index: bool,
}

#[async_trait]
impl StoreTxn for MemoryTxn {
    async fn attempts_for_topic(
        &mut self,
        course_id: &str,
        topic_tag: &str,
    ) -> Result<Vec<Attempt>, StoreError> {
        Ok(self.working.attempts_for_topic(course_id, topic_tag))
    }

    async fn find_mastery_score(
        &mut self,
        course_id: &str,
        topic_tag: &str,
    ) -> Result<Option<MasteryScore>, StoreError> {
        Ok(self
            .working
            .find_mastery_score(course_id, topic_tag, self.use_compound_index))
    }

    async fn find_mistake_for_question(
        &mut self,
        question_id: &str,
    ) -> Result<Option<MistakeBankItem>, StoreError> {
        Ok(self.working.find_mistake_for_question(question_id))
    }

    async fn insert_mastery_score(&mut self, record: MasteryScore) -> Result<(), StoreError> {
        if self.working.mastery_scores.contains_key(&record.mastery_id) {
            return Err(StoreError::Duplicate {
                table: Table::MasteryScores,
                key: record.mastery_id,
            });
        }
        self.working.topic_index.insert(
            (record.course_id.clone(), record.topic_tag.clone()),
            record.mastery_id.clone(),
        );
        self.working
            .mastery_scores
            .insert(record.mastery_id.clone(), record);
        Ok(())
    }

    async fn update_mastery_score(
        &mut self,
        mastery_id: &str,
        patch: MasteryScorePatch,
    ) -> Result<(), StoreError> {
        let record = self
            .working
            .mastery_scores
            .get_mut(mastery_id)
            .ok_or_else(|| StoreError::NotFound {
                table: Table::MasteryScores,
                key: mastery_id.to_string(),
            })?;
        record.score = patch.score;
        record.status = patch.status;
        record.attempt_count = patch.attempt_count;
        record.last_attempt_at = patch.last_attempt_at;
        record.updated_at = patch.updated_at;
        record.question_type_breakdown = Some(patch.question_type_breakdown);
        record.trend = Some(patch.trend);
        Ok(())
    }

    async fn append_history(&mut self, snapshot: MasteryHistory) -> Result<(), StoreError> {
        if self
            .working
            .mastery_history
            .iter()
            .any(|h| h.history_id == snapshot.history_id)
        {
            return Err(StoreError::Duplicate {
                table: Table::MasteryHistory,
                key: snapshot.history_id,
            });
        }
        self.working.mastery_history.push(snapshot);
        Ok(())
    }

    async fn insert_mistake(&mut self, item: MistakeBankItem) -> Result<(), StoreError> {
        if self.working.mistake_bank.contains_key(&item.mistake_id) {
            return Err(StoreError::Duplicate {
                table: Table::MistakeBank,
                key: item.mistake_id,
            });
        }
        self.working.mistake_bank.insert(item.mistake_id.clone(), item);
        Ok(())
    }

    async fn commit(mut self: Box<Self>) -> Result<(), StoreError> {
        *self.guard = self.working;
        Ok(())
    }
}
