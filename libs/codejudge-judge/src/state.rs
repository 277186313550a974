// Evaluation state handed back to the presentation layer
// Transitions consume the old value and return the new one

use codejudge_common::types::{SubmissionScore, TestOutcome};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluationPhase {
    #[default]
    Idle,
    Running,
    Submitting,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EvaluationState {
    pub phase: EvaluationPhase,
    pub outcomes: Vec<TestOutcome>,
    pub score: Option<SubmissionScore>,
}

impl EvaluationState {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.phase != EvaluationPhase::Idle
    }

    /// A new Run discards both previous outcomes and score
    pub fn begin_run(self) -> Self {
        Self {
            phase: EvaluationPhase::Running,
            outcomes: Vec::new(),
            score: None,
        }
    }

    pub fn finish_run(self, outcomes: Vec<TestOutcome>) -> Self {
        Self {
            phase: EvaluationPhase::Idle,
            outcomes,
            score: self.score,
        }
    }

    /// A new Submit discards only the previous score
    pub fn begin_submit(self) -> Self {
        Self {
            phase: EvaluationPhase::Submitting,
            outcomes: self.outcomes,
            score: None,
        }
    }

    pub fn finish_submit(self, score: SubmissionScore) -> Self {
        Self {
            phase: EvaluationPhase::Idle,
            outcomes: self.outcomes,
            score: Some(score),
        }
    }
}
