use serde::{Deserialize, Serialize};

/// Question difficulty as assigned at generation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Weight used by the topic score: harder questions count for more.
    pub fn weight(self) -> f64 {
        match self {
            Difficulty::Easy => 1.0,
            Difficulty::Medium => 2.0,
            Difficulty::Hard => 3.0,
        }
    }
}

/// Derived classification of a topic score. Never set directly; always
/// computed from the score via `scoring::score_to_status`.
///
/// Note: "Weak" sits between InProgress and Mastered in the score ordering
/// (50–75). That reads oddly but matches the product's observed behavior;
/// do not reorder without a product decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MasteryStatus {
    NotStarted,
    InProgress,
    Weak,
    Mastered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MasteryTrend {
    Improving,
    Stable,
    Declining,
}

impl MasteryTrend {
    pub fn as_label(self) -> &'static str {
        match self {
            MasteryTrend::Improving => "improving",
            MasteryTrend::Stable => "stable",
            MasteryTrend::Declining => "declining",
        }
    }
}

pub mod attempt;
pub mod mastery;
pub mod mistake;

pub use attempt::Attempt;
pub use mastery::{MasteryDelta, MasteryHistory, MasteryScore, MasteryScorePatch};
pub use mistake::MistakeBankItem;
