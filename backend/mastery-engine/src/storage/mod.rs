//! Storage boundary of the mastery engine.
//!
//! The surrounding app owns the actual persistence engine; this engine only
//! consumes an ordered, indexed record store with atomic read-modify-write
//! over a set of tables. The trait is injected into [`crate::MasteryService`]
//! so tests (and alternative backends) can substitute their own store.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Attempt, MasteryHistory, MasteryScore, MasteryScorePatch, MistakeBankItem};

pub mod memory;

pub use memory::MemoryStore;

/// Tables this engine touches. Attempts are read-only; the other three are
/// exclusively written by the mastery update path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Attempts,
    MasteryScores,
    MasteryHistory,
    MistakeBank,
}

impl Table {
    pub fn name(self) -> &'static str {
        match self {
            Table::Attempts => "attempts",
            Table::MasteryScores => "mastery_scores",
            Table::MasteryHistory => "mastery_history",
            Table::MistakeBank => "mistake_bank",
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store could not be reached or the operation failed for a
    /// reason unrelated to the data. Worth retrying.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Insert with a primary key that already exists.
    #[error("duplicate key {key} in {}", .table.name())]
    Duplicate { table: Table, key: String },

    /// Update of a record that is not there.
    #[error("record {key} not found in {}", .table.name())]
    NotFound { table: Table, key: String },

    /// The transaction lost to a concurrent writer and was not committed.
    /// Worth retrying from the read step.
    #[error("transaction conflict on {}", .0.name())]
    Conflict(Table),
}

impl StoreError {
    /// Whether a retry of the whole read-modify-write unit can succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_) | StoreError::Conflict(_))
    }
}

/// The record store consumed by the mastery engine.
///
/// `find_mastery_score` is a single lookup method on purpose: whether the
/// backend resolves it through a compound (course, topic) index or a linear
/// scan is its own business, and both must return the same row.
#[async_trait]
pub trait MasteryStore: Send + Sync {
    /// Every attempt ever recorded for `(course_id, topic_tag)`, across all
    /// sessions. Mastery is recomputed from this full history each time.
    async fn attempts_for_topic(
        &self,
        course_id: &str,
        topic_tag: &str,
    ) -> Result<Vec<Attempt>, StoreError>;

    /// The unique mastery row for `(course_id, topic_tag)`, if one exists.
    async fn find_mastery_score(
        &self,
        course_id: &str,
        topic_tag: &str,
    ) -> Result<Option<MasteryScore>, StoreError>;

    /// All mastery rows for a course (course-map overview).
    async fn mastery_for_course(&self, course_id: &str) -> Result<Vec<MasteryScore>, StoreError>;

    /// Snapshots for one mastery row, oldest first (trend charts).
    async fn history_for_mastery(
        &self,
        mastery_id: &str,
    ) -> Result<Vec<MasteryHistory>, StoreError>;

    async fn find_mistake_for_question(
        &self,
        question_id: &str,
    ) -> Result<Option<MistakeBankItem>, StoreError>;

    async fn mistakes_for_course(
        &self,
        course_id: &str,
    ) -> Result<Vec<MistakeBankItem>, StoreError>;

    /// Open an atomic read-modify-write scope over `tables`. Writes made
    /// through the returned transaction become visible only on `commit`;
    /// dropping the transaction without committing discards them.
    async fn begin(&self, tables: &[Table]) -> Result<Box<dyn StoreTxn>, StoreError>;
}

/// One atomic unit of reads and writes. See [`MasteryStore::begin`].
#[async_trait]
pub trait StoreTxn: Send {
    async fn attempts_for_topic(
        &mut self,
        course_id: &str,
        topic_tag: &str,
    ) -> Result<Vec<Attempt>, StoreError>;

    async fn find_mastery_score(
        &mut self,
        course_id: &str,
        topic_tag: &str,
    ) -> Result<Option<MasteryScore>, StoreError>;

    async fn find_mistake_for_question(
        &mut self,
        question_id: &str,
    ) -> Result<Option<MistakeBankItem>, StoreError>;

    /// Insert a fresh mastery row. Fails with [`StoreError::Duplicate`] when
    /// the primary key is already taken.
    async fn insert_mastery_score(&mut self, record: MasteryScore) -> Result<(), StoreError>;

    /// Patch an existing mastery row in place. Fails with
    /// [`StoreError::NotFound`] when it is absent.
    async fn update_mastery_score(
        &mut self,
        mastery_id: &str,
        patch: MasteryScorePatch,
    ) -> Result<(), StoreError>;

    async fn append_history(&mut self, snapshot: MasteryHistory) -> Result<(), StoreError>;

    async fn insert_mistake(&mut self, item: MistakeBankItem) -> Result<(), StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}
