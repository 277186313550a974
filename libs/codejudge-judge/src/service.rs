/// Evaluation Service - Gate, Orchestrate, Record
///
/// **Responsibility:**
/// Glue between the session gate, the orchestrator and the progress ledger.
///
/// **Architecture:**
/// 1. Refuse to start without a signed-in user
/// 2. Run the orchestrator (Run / Submit / free run)
/// 3. On Submit, record the attempt and mark the problem solved on a
///    full pass (first time only)
///
/// The ledger is best effort: once the judge has scored a Submit, a
/// ledger failure is logged and the score is still returned.
///
/// This module knows nothing about HTTP, the judge wire format or how
/// outputs are compared.
use crate::client::JudgeClient;
use crate::error::EvaluationError;
use crate::orchestrator::Orchestrator;
use crate::state::EvaluationState;
use chrono::Utc;
use codejudge_common::progress::{ProgressStore, UserProfile};
use codejudge_common::session::{SessionError, User};
use codejudge_common::types::{Problem, RunOutput};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitReport {
    pub state: EvaluationState,
    /// True only for the first all-pass Submit of this problem by this user
    pub newly_solved: bool,
    /// Updated profile; `None` when the ledger could not be reached
    pub profile: Option<UserProfile>,
}

pub struct EvaluationService<C> {
    orchestrator: Orchestrator<C>,
    progress: Arc<dyn ProgressStore>,
}

fn require_user(user: Option<&User>) -> Result<&User, ServiceError> {
    user.ok_or(ServiceError::Session(SessionError::SignedOut))
}

impl<C: JudgeClient> EvaluationService<C> {
    pub fn new(orchestrator: Orchestrator<C>, progress: Arc<dyn ProgressStore>) -> Self {
        Self {
            orchestrator,
            progress,
        }
    }

    pub fn orchestrator(&self) -> &Orchestrator<C> {
        &self.orchestrator
    }

    /// Run the visible test cases and return per-case diagnostics
    pub async fn run(
        &self,
        user: Option<&User>,
        problem: &Problem,
        source_code: &str,
        state: EvaluationState,
    ) -> Result<EvaluationState, ServiceError> {
        let user = require_user(user)?;
        info!(uid = %user.uid, problem_id = %problem.id, "Run requested");

        let state = state.begin_run();
        let outcomes = self
            .orchestrator
            .run_visible(source_code, &problem.test_cases)
            .await;
        Ok(state.finish_run(outcomes))
    }

    /// Score against visible + hidden cases and update the ledger
    pub async fn submit(
        &self,
        user: Option<&User>,
        problem: &Problem,
        source_code: &str,
        state: EvaluationState,
    ) -> Result<SubmitReport, ServiceError> {
        let user = require_user(user)?;
        info!(uid = %user.uid, problem_id = %problem.id, "Submit requested");

        let state = state.begin_submit();
        let score = self
            .orchestrator
            .run_submit(source_code, &problem.test_cases, &problem.hidden_test_cases)
            .await;

        // the solve goes first so an attempt is never counted without it
        let now = Utc::now();
        let newly_solved = if score.all_passed {
            match self.progress.mark_solved(user, problem, now).await {
                Ok(first) => first,
                Err(e) => {
                    warn!(uid = %user.uid, problem_id = %problem.id, error = %e, "Failed to record solve");
                    false
                }
            }
        } else {
            false
        };
        let profile = match self.progress.record_attempt(user, score.all_passed, now).await {
            Ok(profile) => Some(profile),
            Err(e) => {
                warn!(uid = %user.uid, problem_id = %problem.id, error = %e, "Failed to record attempt");
                None
            }
        };

        Ok(SubmitReport {
            state: state.finish_submit(score),
            newly_solved,
            profile,
        })
    }

    /// Free run with custom stdin
    pub async fn execute(
        &self,
        user: Option<&User>,
        source_code: &str,
        stdin: &str,
    ) -> Result<RunOutput, ServiceError> {
        let user = require_user(user)?;
        info!(uid = %user.uid, language = %self.orchestrator.language(), "Execute requested");
        Ok(self.orchestrator.run_custom(source_code, stdin).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::testing::{Script, ScriptedJudge};
    use async_trait::async_trait;
    use chrono::DateTime;
    use codejudge_common::catalog::ProblemCatalog;
    use codejudge_common::config::PollPolicy;
    use codejudge_common::progress::{MemoryProgressStore, ProgressError, ProgressResult};
    use codejudge_common::types::{Language, SubmissionScore};

    fn service(scripts: Vec<Script>) -> (EvaluationService<Arc<ScriptedJudge>>, Arc<ScriptedJudge>) {
        let judge = Arc::new(ScriptedJudge::new(scripts));
        let orchestrator = Orchestrator::new(judge.clone(), Language::Cpp, PollPolicy::default());
        (
            EvaluationService::new(orchestrator, Arc::new(MemoryProgressStore::new())),
            judge,
        )
    }

    fn two_sum_passes() -> Vec<Script> {
        vec![
            Script::prints("0 1\n"),
            Script::prints("1 2\n"),
            Script::prints("0 3\n"),
            Script::prints("1 2\n"),
        ]
    }

    #[tokio::test(start_paused = true)]
    async fn test_gate_blocks_signed_out_user() {
        let catalog = ProblemCatalog::builtin().unwrap();
        let problem = catalog.get("two-sum").unwrap();
        let (service, judge) = service(vec![]);

        let err = service
            .run(None, problem, "code", EvaluationState::idle())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Session(SessionError::SignedOut)));

        let err = service
            .submit(None, problem, "code", EvaluationState::idle())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Session(SessionError::SignedOut)));

        assert!(service.execute(None, "code", "").await.is_err());
        assert!(judge.requests().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_returns_visible_outcomes_only() {
        let catalog = ProblemCatalog::builtin().unwrap();
        let problem = catalog.get("two-sum").unwrap();
        let (service, judge) = service(vec![Script::prints("0 1\n"), Script::prints("9 9\n")]);
        let user = User::new("u1", "ada@example.com");

        let state = service
            .run(Some(&user), problem, "code", EvaluationState::idle())
            .await
            .unwrap();

        assert_eq!(state.outcomes.len(), 2);
        assert!(state.outcomes[0].pass);
        assert!(!state.outcomes[1].pass);
        assert!(state.score.is_none());
        assert_eq!(judge.requests().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_pass_marks_solved_once() {
        let catalog = ProblemCatalog::builtin().unwrap();
        let problem = catalog.get("two-sum").unwrap();
        let mut scripts = two_sum_passes();
        scripts.extend(two_sum_passes());
        let (service, _judge) = service(scripts);
        let user = User::new("u1", "ada@example.com");

        let first = service
            .submit(Some(&user), problem, "code", EvaluationState::idle())
            .await
            .unwrap();
        assert_eq!(first.state.score.map(|s| (s.correct, s.total, s.all_passed)), Some((4, 4, true)));
        assert!(first.newly_solved);

        let second = service
            .submit(Some(&user), problem, "code", first.state)
            .await
            .unwrap();
        assert!(second.state.score.unwrap().all_passed);
        assert!(!second.newly_solved);
        let profile = second.profile.unwrap();
        assert_eq!(profile.solved_count(), 1);
        assert_eq!(profile.total_submissions, 2);
        assert_eq!(profile.accepted_submissions, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_pass_records_attempt_only() {
        let catalog = ProblemCatalog::builtin().unwrap();
        let problem = catalog.get("two-sum").unwrap();
        let (service, _judge) = service(vec![
            Script::prints("0 1\n"),
            Script::prints("1 2\n"),
            Script::prints("wrong\n"),
            Script::RejectSubmit { status: 500 },
        ]);
        let user = User::new("u1", "ada@example.com");

        let report = service
            .submit(Some(&user), problem, "code", EvaluationState::idle())
            .await
            .unwrap();
        let score = report.state.score.unwrap();
        assert_eq!((score.correct, score.total), (2, 4));
        assert!(!report.newly_solved);
        let profile = report.profile.unwrap();
        assert_eq!(profile.solved_count(), 0);
        assert_eq!(profile.total_submissions, 1);
        assert_eq!(profile.accepted_submissions, 0);
    }

    /// Ledger that fails every call
    struct UnreachableLedger;

    #[async_trait]
    impl ProgressStore for UnreachableLedger {
        async fn profile(&self, _user: &User) -> ProgressResult<UserProfile> {
            Err(ledger_down())
        }

        async fn record_attempt(
            &self,
            _user: &User,
            _accepted: bool,
            _now: DateTime<Utc>,
        ) -> ProgressResult<UserProfile> {
            Err(ledger_down())
        }

        async fn mark_solved(
            &self,
            _user: &User,
            _problem: &Problem,
            _now: DateTime<Utc>,
        ) -> ProgressResult<bool> {
            Err(ledger_down())
        }

        async fn set_display_name(&self, _user: &User, _name: &str) -> ProgressResult<UserProfile> {
            Err(ledger_down())
        }
    }

    fn ledger_down() -> ProgressError {
        ProgressError::Corrupt {
            field: "total_submissions".to_string(),
            value: "not-a-number".to_string(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_ledger_failure_keeps_submit_score() {
        let catalog = ProblemCatalog::builtin().unwrap();
        let problem = catalog.get("two-sum").unwrap();
        let judge = Arc::new(ScriptedJudge::new(two_sum_passes()));
        let orchestrator = Orchestrator::new(judge.clone(), Language::Cpp, PollPolicy::default());
        let service = EvaluationService::new(orchestrator, Arc::new(UnreachableLedger));
        let user = User::new("u1", "ada@example.com");

        let report = service
            .submit(Some(&user), problem, "code", EvaluationState::idle())
            .await
            .unwrap();

        assert_eq!(judge.requests().len(), 4);
        assert_eq!(report.state.score, Some(SubmissionScore::new(4, 4)));
        assert!(!report.newly_solved);
        assert!(report.profile.is_none());
    }

    /// Records solves but fails to count attempts
    #[derive(Default)]
    struct AttemptsDown {
        inner: MemoryProgressStore,
    }

    #[async_trait]
    impl ProgressStore for AttemptsDown {
        async fn profile(&self, user: &User) -> ProgressResult<UserProfile> {
            self.inner.profile(user).await
        }

        async fn record_attempt(
            &self,
            _user: &User,
            _accepted: bool,
            _now: DateTime<Utc>,
        ) -> ProgressResult<UserProfile> {
            Err(ledger_down())
        }

        async fn mark_solved(
            &self,
            user: &User,
            problem: &Problem,
            now: DateTime<Utc>,
        ) -> ProgressResult<bool> {
            self.inner.mark_solved(user, problem, now).await
        }

        async fn set_display_name(&self, user: &User, name: &str) -> ProgressResult<UserProfile> {
            self.inner.set_display_name(user, name).await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_recorded_solve_reported_when_attempt_fails() {
        let catalog = ProblemCatalog::builtin().unwrap();
        let problem = catalog.get("two-sum").unwrap();
        let judge = Arc::new(ScriptedJudge::new(two_sum_passes()));
        let orchestrator = Orchestrator::new(judge, Language::Cpp, PollPolicy::default());
        let ledger = Arc::new(AttemptsDown::default());
        let service = EvaluationService::new(orchestrator, ledger.clone());
        let user = User::new("u1", "ada@example.com");

        let report = service
            .submit(Some(&user), problem, "code", EvaluationState::idle())
            .await
            .unwrap();

        assert!(report.newly_solved);
        assert!(report.profile.is_none());
        assert_eq!(ledger.profile(&user).await.unwrap().solved_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_execute_returns_display_text() {
        let (service, _judge) = service(vec![Script::prints("Hello\n")]);
        let user = User::new("u1", "ada@example.com");
        let output = service.execute(Some(&user), "code", "").await.unwrap();
        assert_eq!(output.display, "Hello\n");
    }
}
