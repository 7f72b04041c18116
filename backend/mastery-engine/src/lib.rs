//! Mastery scoring and spaced-practice bookkeeping engine for DSA Master.
//!
//! Turns a stream of quiz attempts into per-topic mastery scores, status
//! classifications, trend signals and a mistake bank. The persistence engine
//! is the surrounding app's concern: anything implementing
//! [`storage::MasteryStore`] can back the service, with
//! [`storage::MemoryStore`] provided for tests and local use.

pub mod config;
pub mod metrics;
pub mod models;
pub mod scoring;
pub mod services;
pub mod storage;
pub mod utils;

pub use config::Config;
pub use models::{
    Attempt, Difficulty, MasteryDelta, MasteryHistory, MasteryScore, MasteryStatus, MasteryTrend,
    MistakeBankItem,
};
pub use scoring::{
    build_question_type_breakdown, calculate_topic_score, compute_trend, score_to_status,
};
pub use services::MasteryService;
pub use storage::{MasteryStore, MemoryStore, StoreError, StoreTxn, Table};
