//! Integration tests for Judge0Client.
//!
//! Uses wiremock for the judge service. Covers the submission wire format,
//! RapidAPI headers, status mapping, repeatable result reads, and one
//! orchestrated run end to end over HTTP.

use std::time::Duration;

use codejudge_common::config::{JudgeConfig, PollPolicy};
use codejudge_common::types::{Language, SubmissionHandle, SubmissionRequest, TestCase};
use codejudge_judge::codec::{decode_field, encode};
use codejudge_judge::{Judge0Client, JudgeClient, JudgeError, Operation, Orchestrator};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_test_client(mock_server: &MockServer) -> Judge0Client {
    let config = JudgeConfig::default().with_base_url(mock_server.uri());
    Judge0Client::new(&config).expect("failed to create client")
}

fn request(source: &str, stdin: &str) -> SubmissionRequest {
    SubmissionRequest {
        source_code: source.to_string(),
        language: Language::Cpp,
        stdin: stdin.to_string(),
    }
}

fn finished(stdout: &str) -> serde_json::Value {
    json!({
        "status": {"id": 3, "description": "Accepted"},
        "stdout": encode(stdout),
        "stderr": null,
        "compile_output": null
    })
}

#[tokio::test]
async fn test_submit_encodes_body_and_query() {
    let mock_server = MockServer::start().await;
    let source = "#include <iostream>\nint main() { return 0; }\n";

    Mock::given(method("POST"))
        .and(path("/submissions"))
        .and(query_param("base64_encoded", "true"))
        .and(query_param("wait", "false"))
        .and(body_json(json!({
            "source_code": encode(source),
            "language_id": 54,
            "stdin": encode("2 7 11 15\n9"),
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"token": "abc-123"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let handle = client
        .submit(&request(source, "2 7 11 15\n9"))
        .await
        .expect("submit failed");

    assert_eq!(handle.as_str(), "abc-123");
}

#[tokio::test]
async fn test_rapidapi_headers_sent_when_key_configured() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/submissions"))
        .and(header("x-rapidapi-key", "secret"))
        .and(header("x-rapidapi-host", "judge0-ce.p.rapidapi.com"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"token": "t"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = JudgeConfig::default()
        .with_base_url(mock_server.uri())
        .with_api_key("secret");
    let client = Judge0Client::new(&config).unwrap();

    client.submit(&request("code", "")).await.expect("submit failed");
}

#[tokio::test]
async fn test_submit_non_success_is_transport_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/submissions"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let err = client.submit(&request("code", "")).await.unwrap_err();

    assert!(matches!(
        err,
        JudgeError::Transport {
            operation: Operation::Submit,
            status: 429
        }
    ));
    assert_eq!(err.status(), Some(429));
}

#[tokio::test]
async fn test_submit_garbage_body_is_invalid_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/submissions"))
        .respond_with(ResponseTemplate::new(201).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let err = client.submit(&request("code", "")).await.unwrap_err();
    assert!(matches!(err, JudgeError::InvalidResponse { .. }));
}

#[tokio::test]
async fn test_fetch_result_reads_status_and_outputs() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/submissions/abc"))
        .and(query_param("base64_encoded", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": {"id": 6, "description": "Compilation Error"},
            "stdout": null,
            "stderr": null,
            "compile_output": encode("main.cpp:1:1: error")
        })))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let result = client
        .fetch_result(&SubmissionHandle("abc".to_string()))
        .await
        .expect("fetch failed");

    assert_eq!(result.status_id, Some(6));
    assert_eq!(result.status_description.as_deref(), Some("Compilation Error"));
    assert!(result.stdout.is_none());
    assert_eq!(
        decode_field("compile_output", result.compile_output.as_deref()).unwrap(),
        "main.cpp:1:1: error"
    );
}

#[tokio::test]
async fn test_fetch_result_is_repeatable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/submissions/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(finished("0 1\n")))
        .expect(3)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let handle = SubmissionHandle("abc".to_string());

    let mut outputs = Vec::new();
    for _ in 0..3 {
        let result = client.fetch_result(&handle).await.expect("fetch failed");
        assert!(result.is_finished());
        outputs.push(decode_field("stdout", result.stdout.as_deref()).unwrap());
    }
    assert!(outputs.iter().all(|o| o == "0 1\n"));
}

#[tokio::test]
async fn test_fetch_result_non_success_is_transport_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/submissions/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let err = client
        .fetch_result(&SubmissionHandle("missing".to_string()))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        JudgeError::Transport {
            operation: Operation::FetchResult,
            status: 404
        }
    ));
}

#[tokio::test]
async fn test_orchestrated_run_over_http() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/submissions"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"token": "tok"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    // two polls still processing, then finished
    Mock::given(method("GET"))
        .and(path("/submissions/tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": {"id": 2, "description": "Processing"},
            "stdout": null
        })))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/submissions/tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(finished("0 1\n")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let policy = PollPolicy {
        interval: Duration::from_millis(5),
        ..PollPolicy::default()
    };
    let orchestrator = Orchestrator::new(create_test_client(&mock_server), Language::Cpp, policy);

    let outcomes = orchestrator
        .run_visible("code", &[TestCase::new("2 7 11 15\n9", "0 1\n")])
        .await;

    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].pass, "outcome: {:?}", outcomes[0]);
    assert_eq!(outcomes[0].actual, "0 1\n");
}

#[tokio::test]
async fn test_orchestrated_run_times_out_over_http() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/submissions"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"token": "slow"})))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/submissions/slow"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": {"id": 1, "description": "In Queue"}
        })))
        .expect(3)
        .mount(&mock_server)
        .await;

    let policy = PollPolicy {
        interval: Duration::from_millis(5),
        max_attempts: 3,
        stop_on_error_status: false,
    };
    let orchestrator = Orchestrator::new(create_test_client(&mock_server), Language::Cpp, policy);

    let outcomes = orchestrator
        .run_visible("code", &[TestCase::new("", "anything")])
        .await;

    assert!(!outcomes[0].pass);
    assert_eq!(outcomes[0].actual, "");
    assert_eq!(outcomes[0].error.as_deref(), Some("Timeout"));
}
