// Prometheus metrics for the CodeJudge API

use codejudge_common::types::TestOutcome;
use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    /// Evaluations started, by mode (run / submit / execute)
    pub static ref EVALUATIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("codejudge_evaluations_total", "Evaluations started by mode"),
        &["mode"]
    )
    .expect("metric can be created");

    /// Per-case verdicts (passed / failed / error)
    pub static ref TEST_OUTCOMES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("codejudge_test_outcomes_total", "Test case verdicts"),
        &["verdict"]
    )
    .expect("metric can be created");

    pub static ref PROBLEMS_SOLVED_TOTAL: IntCounter = IntCounter::new(
        "codejudge_problems_solved_total",
        "First-time solves recorded"
    )
    .expect("metric can be created");
}

pub fn register_metrics() -> Result<(), prometheus::Error> {
    REGISTRY.register(Box::new(EVALUATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(TEST_OUTCOMES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(PROBLEMS_SOLVED_TOTAL.clone()))?;
    Ok(())
}

pub fn record_evaluation(mode: &str) {
    EVALUATIONS_TOTAL.with_label_values(&[mode]).inc();
}

pub fn verdict(outcome: &TestOutcome) -> &'static str {
    if outcome.pass {
        "passed"
    } else if outcome.error.is_some() {
        "error"
    } else {
        "failed"
    }
}

pub fn record_outcomes(outcomes: &[TestOutcome]) {
    for outcome in outcomes {
        TEST_OUTCOMES_TOTAL
            .with_label_values(&[verdict(outcome)])
            .inc();
    }
}

/// Text exposition of every registered metric
pub fn render() -> Result<String, String> {
    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&REGISTRY.gather(), &mut buffer)
        .map_err(|e| e.to_string())?;
    String::from_utf8(buffer).map_err(|e| e.to_string())
}
