/// Evaluation Orchestrator - Submit, Poll, Compare
///
/// **Responsibility:**
/// Drive one evaluation (Run or Submit) over an ordered list of test cases
/// with a single language, one test case at a time.
///
/// **Per test case:**
/// 1. Submit source + stdin through the judge client
/// 2. Sleep the fixed interval, fetch status; repeat until the judge reports
///    finished or the attempt budget is spent
/// 3. Decode stdout and compare against the expected output
///
/// **Failure scope:**
/// Every failure (transport, timeout, decode) belongs to one test case.
/// A run always completes and always returns a result.
use crate::client::JudgeClient;
use crate::codec;
use crate::error::EvaluationError;
use crate::evaluator;
use codejudge_common::config::PollPolicy;
use codejudge_common::types::{
    Language, RunOutput, SubmissionHandle, SubmissionRequest, SubmissionResult, SubmissionScore,
    TestCase, TestOutcome,
};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

pub struct Orchestrator<C> {
    client: C,
    language: Language,
    policy: PollPolicy,
}

impl<C: JudgeClient> Orchestrator<C> {
    pub fn new(client: C, language: Language, policy: PollPolicy) -> Self {
        Self {
            client,
            language,
            policy,
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Run mode: one diagnostic outcome per test case, in input order
    pub async fn run_visible(&self, source_code: &str, test_cases: &[TestCase]) -> Vec<TestOutcome> {
        let run_id = Uuid::new_v4();
        info!(
            run_id = %run_id,
            language = %self.language,
            test_cases = test_cases.len(),
            "Starting run"
        );

        let mut outcomes = Vec::with_capacity(test_cases.len());
        for (idx, test_case) in test_cases.iter().enumerate() {
            let result = self.execute_case(source_code, test_case).await;
            let outcome = evaluator::outcome_for(test_case, result);

            debug!(
                run_id = %run_id,
                test_num = idx + 1,
                pass = outcome.pass,
                error = outcome.error.as_deref().unwrap_or(""),
                "Test case evaluated"
            );
            outcomes.push(outcome);
        }

        info!(
            run_id = %run_id,
            passed = outcomes.iter().filter(|o| o.pass).count(),
            total = outcomes.len(),
            "Run completed"
        );
        outcomes
    }

    /// Submit mode: visible then hidden cases, score only
    ///
    /// Failures of any kind just don't count; nothing about individual
    /// cases leaves this function.
    pub async fn run_submit(
        &self,
        source_code: &str,
        visible: &[TestCase],
        hidden: &[TestCase],
    ) -> SubmissionScore {
        let run_id = Uuid::new_v4();
        info!(
            run_id = %run_id,
            language = %self.language,
            visible = visible.len(),
            hidden = hidden.len(),
            "Starting submission"
        );

        let mut passes = Vec::with_capacity(visible.len() + hidden.len());
        for (idx, test_case) in visible.iter().chain(hidden).enumerate() {
            let pass = match self.execute_case(source_code, test_case).await {
                Ok(actual) => evaluator::outputs_match(&actual, &test_case.expected_output),
                Err(e) => {
                    debug!(run_id = %run_id, test_num = idx + 1, error = %e, "Test case not counted");
                    false
                }
            };
            passes.push(pass);
        }

        let score = evaluator::score(passes);
        info!(
            run_id = %run_id,
            correct = score.correct,
            total = score.total,
            all_passed = score.all_passed,
            "Submission scored"
        );
        score
    }

    /// Free-form run with custom stdin and no expected output
    ///
    /// Failure statuses always end polling here, so compile and runtime
    /// errors reach the display text instead of timing out.
    pub async fn run_custom(&self, source_code: &str, stdin: &str) -> Result<RunOutput, EvaluationError> {
        let handle = self.client.submit(&self.request(source_code, stdin)).await?;
        let result = self.poll(&handle, true).await?;
        let decoded = codec::decode_result(&result)?;
        Ok(RunOutput::new(
            decoded.stdout,
            decoded.stderr,
            decoded.compile_output,
        ))
    }

    /// Submit one case and return its decoded stdout
    async fn execute_case(&self, source_code: &str, test_case: &TestCase) -> Result<String, EvaluationError> {
        let handle = self
            .client
            .submit(&self.request(source_code, &test_case.input))
            .await?;
        let result = self.poll_until_terminal(&handle).await?;

        if !result.is_finished() {
            let status = result.status_id.unwrap_or_default();
            return Err(EvaluationError::Rejected {
                status,
                description: result
                    .status_description
                    .unwrap_or_else(|| format!("Status {}", status)),
            });
        }

        Ok(codec::decode_field("stdout", result.stdout.as_deref())?)
    }

    /// Poll with the fixed delay until finished or out of attempts
    ///
    /// Sleeps before every fetch and never fetches more than
    /// `max_attempts` times. Statuses other than finished keep polling
    /// unless `stop_on_error_status` is set.
    pub async fn poll_until_terminal(
        &self,
        handle: &SubmissionHandle,
    ) -> Result<SubmissionResult, EvaluationError> {
        self.poll(handle, self.policy.stop_on_error_status).await
    }

    #[instrument(skip(self, handle), fields(token = %handle))]
    async fn poll(
        &self,
        handle: &SubmissionHandle,
        stop_on_failure: bool,
    ) -> Result<SubmissionResult, EvaluationError> {
        for attempt in 1..=self.policy.max_attempts {
            tokio::time::sleep(self.policy.interval).await;
            let result = self.client.fetch_result(handle).await?;

            if result.is_finished() {
                debug!(attempt, "Submission finished");
                return Ok(result);
            }
            if stop_on_failure && result.is_failure_status() {
                debug!(attempt, status = ?result.status_id, "Submission ended with failure status");
                return Ok(result);
            }
            debug!(attempt, status = ?result.status_id, "Submission not finished");
        }

        warn!(attempts = self.policy.max_attempts, "Poll budget exhausted");
        Err(EvaluationError::Timeout {
            attempts: self.policy.max_attempts,
        })
    }

    fn request(&self, source_code: &str, stdin: &str) -> SubmissionRequest {
        SubmissionRequest {
            source_code: source_code.to_string(),
            language: self.language,
            stdin: stdin.to_string(),
        }
    }
}
