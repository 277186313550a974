/// Output Evaluator - Comparison and Scoring Rules
///
/// **Core Responsibility:**
/// Compare decoded judge output against expected output and turn
/// per-case results into outcomes and scores.
///
/// **Critical Properties:**
/// - Knows nothing about HTTP or the judge service
/// - Knows nothing about polling
/// - Pure functions only
///
/// **Normalization Rules:**
/// - Trim leading whitespace: YES
/// - Trim trailing whitespace: YES
/// - Interior whitespace: preserved, must match exactly
/// - Case sensitivity: YES
/// - Numeric tolerance: NO
use crate::error::EvaluationError;
use codejudge_common::types::{SubmissionScore, TestCase, TestOutcome};

/// Normalize output for comparison
///
/// Only surrounding whitespace is removed; `"0  1"` stays distinct from `"0 1"`.
pub fn normalize_output(output: &str) -> &str {
    output.trim()
}

pub fn outputs_match(actual: &str, expected: &str) -> bool {
    normalize_output(actual) == normalize_output(expected)
}

/// Build the Run-mode outcome for one test case
///
/// ## Arguments
/// * `test_case` - The case that was executed
/// * `result` - Decoded stdout, or the reason there is none
///
/// ## Returns
/// TestOutcome; errors always yield `pass = false` and an empty `actual`
pub fn outcome_for(test_case: &TestCase, result: Result<String, EvaluationError>) -> TestOutcome {
    match result {
        Ok(actual) => TestOutcome {
            input: test_case.input.clone(),
            expected: test_case.expected_output.clone(),
            pass: outputs_match(&actual, &test_case.expected_output),
            actual,
            error: None,
        },
        Err(e) => TestOutcome {
            input: test_case.input.clone(),
            expected: test_case.expected_output.clone(),
            actual: String::new(),
            pass: false,
            error: Some(e.to_string()),
        },
    }
}

/// Aggregate pass flags into a score
pub fn score<I>(passes: I) -> SubmissionScore
where
    I: IntoIterator<Item = bool>,
{
    let (correct, total) = passes
        .into_iter()
        .fold((0, 0), |(correct, total), pass| {
            (correct + usize::from(pass), total + 1)
        });
    SubmissionScore::new(correct, total)
}
