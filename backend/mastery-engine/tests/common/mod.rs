#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use uuid::Uuid;

use mastery_engine::models::{
    Attempt, Difficulty, MasteryHistory, MasteryScore, MistakeBankItem,
};
use mastery_engine::storage::{MasteryStore, MemoryStore, StoreError, StoreTxn, Table};
use mastery_engine::{Config, MasteryService};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Service over a fresh in-memory store with default configuration.
pub fn test_engine() -> (Arc<MemoryStore>, Arc<MasteryService>) {
    init_tracing();
    let store = Arc::new(MemoryStore::new());
    let service = Arc::new(MasteryService::new(store.clone(), &Config::default()));
    (store, service)
}

pub fn engine_over(store: Arc<MemoryStore>, config: &Config) -> Arc<MasteryService> {
    init_tracing();
    Arc::new(MasteryService::new(store, config))
}

pub const TEST_COURSE: &str = "cos212";

/// Builder for seeded attempts, standing in for the quiz subsystem.
pub struct AttemptBuilder {
    question_id: String,
    session_id: String,
    course_id: String,
    correct: bool,
    days_ago: i64,
    tags: Vec<String>,
    difficulty: Option<Difficulty>,
}

pub fn attempt(question_id: &str) -> AttemptBuilder {
    AttemptBuilder {
        question_id: question_id.to_string(),
        session_id: "session-1".to_string(),
        course_id: TEST_COURSE.to_string(),
        correct: true,
        days_ago: 0,
        tags: Vec::new(),
        difficulty: Some(Difficulty::Medium),
    }
}

impl AttemptBuilder {
    pub fn wrong(mut self) -> Self {
        self.correct = false;
        self
    }

    pub fn session(mut self, session_id: &str) -> Self {
        self.session_id = session_id.to_string();
        self
    }

    pub fn course(mut self, course_id: &str) -> Self {
        self.course_id = course_id.to_string();
        self
    }

    pub fn days_ago(mut self, days: i64) -> Self {
        self.days_ago = days;
        self
    }

    pub fn tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = Some(difficulty);
        self
    }

    pub fn no_difficulty(mut self) -> Self {
        self.difficulty = None;
        self
    }

    pub fn build(self) -> Attempt {
        Attempt {
            attempt_id: Uuid::new_v4().to_string(),
            session_id: self.session_id,
            question_id: self.question_id,
            course_id: self.course_id,
            answer: serde_json::json!({ "choice": "A" }),
            correct: self.correct,
            timestamp: Utc::now() - Duration::days(self.days_ago),
            duration_ms: Some(30_000),
            topic_tags: if self.tags.is_empty() {
                None
            } else {
                Some(self.tags)
            },
            difficulty: self.difficulty,
            confidence: None,
        }
    }
}

/// Store whose every operation fails, for exercising the outage path.
pub struct FailingStore;

fn outage<T>() -> Result<T, StoreError> {
    Err(StoreError::Unavailable("injected outage".to_string()))
}

#[async_trait]
impl MasteryStore for FailingStore {
    async fn attempts_for_topic(
        &self,
        _course_id: &str,
        _topic_tag: &str,
    ) -> Result<Vec<Attempt>, StoreError> {
        outage()
    }

    async fn find_mastery_score(
        &self,
        _course_id: &str,
        _topic_tag: &str,
    ) -> Result<Option<MasteryScore>, StoreError> {
        outage()
    }

    async fn mastery_for_course(&self, _course_id: &str) -> Result<Vec<MasteryScore>, StoreError> {
        outage()
    }

    async fn history_for_mastery(
        &self,
        _mastery_id: &str,
    ) -> Result<Vec<MasteryHistory>, StoreError> {
        outage()
    }

    async fn find_mistake_for_question(
        &self,
        _question_id: &str,
    ) -> Result<Option<MistakeBankItem>, StoreError> {
        outage()
    }

    async fn mistakes_for_course(
        &self,
        _course_id: &str,
    ) -> Result<Vec<MistakeBankItem>, StoreError> {
        outage()
    }

    async fn begin(&self, _tables: &[Table]) -> Result<Box<dyn StoreTxn>, StoreError> {
        outage()
    }
}
