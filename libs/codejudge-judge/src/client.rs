/// Judge Client - Request Layer for the Remote Execution Service
///
/// **Core Responsibility:**
/// Turn a submission request into one remote call, and a handle into one
/// status read.
///
/// **Critical Architectural Boundary:**
/// - Client knows the wire format (endpoints, JSON shape, base64)
/// - Client does NOT retry, back off, or poll
/// - Client does NOT decode outputs or judge correctness
///
/// Polling policy lives entirely in the orchestrator.
use crate::codec;
use crate::error::{JudgeError, Operation};
use async_trait::async_trait;
use codejudge_common::config::JudgeConfig;
use codejudge_common::types::{SubmissionHandle, SubmissionRequest, SubmissionResult};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

const USER_AGENT_VALUE: &str = concat!("codejudge/", env!("CARGO_PKG_VERSION"));
const RAPIDAPI_KEY_HEADER: &str = "x-rapidapi-key";
const RAPIDAPI_HOST_HEADER: &str = "x-rapidapi-host";

/// Seam between the orchestrator and whatever runs the code
#[async_trait]
pub trait JudgeClient: Send + Sync {
    /// Create a submission; returns as soon as the judge has queued it
    async fn submit(&self, request: &SubmissionRequest) -> Result<SubmissionHandle, JudgeError>;

    /// Read the current state of a submission; safe to repeat
    async fn fetch_result(&self, handle: &SubmissionHandle) -> Result<SubmissionResult, JudgeError>;
}

#[async_trait]
impl<T: JudgeClient + ?Sized> JudgeClient for Arc<T> {
    async fn submit(&self, request: &SubmissionRequest) -> Result<SubmissionHandle, JudgeError> {
        (**self).submit(request).await
    }

    async fn fetch_result(&self, handle: &SubmissionHandle) -> Result<SubmissionResult, JudgeError> {
        (**self).fetch_result(handle).await
    }
}

#[derive(Debug, Serialize)]
struct CreateSubmissionBody {
    source_code: String,
    language_id: i32,
    stdin: String,
}

#[derive(Debug, Deserialize)]
struct CreateSubmissionResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
struct StatusBody {
    id: i32,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SubmissionBody {
    #[serde(default)]
    status: Option<StatusBody>,
    #[serde(default)]
    stdout: Option<String>,
    #[serde(default)]
    stderr: Option<String>,
    #[serde(default)]
    compile_output: Option<String>,
}

impl From<SubmissionBody> for SubmissionResult {
    fn from(body: SubmissionBody) -> Self {
        let (status_id, status_description) = match body.status {
            Some(status) => (Some(status.id), status.description),
            None => (None, None),
        };
        SubmissionResult {
            status_id,
            status_description,
            stdout: body.stdout,
            stderr: body.stderr,
            compile_output: body.compile_output,
        }
    }
}

/// HTTP client for a Judge0-compatible service
#[derive(Debug, Clone)]
pub struct Judge0Client {
    client: reqwest::Client,
    base_url: String,
}

impl Judge0Client {
    pub fn new(config: &JudgeConfig) -> Result<Self, JudgeError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        if let Some(key) = &config.api_key {
            headers.insert(
                HeaderName::from_static(RAPIDAPI_KEY_HEADER),
                header_value(key, "api key")?,
            );
            headers.insert(
                HeaderName::from_static(RAPIDAPI_HOST_HEADER),
                header_value(&config.api_host, "api host")?,
            );
        }

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| JudgeError::Config {
                message: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn submissions_url(&self) -> String {
        format!("{}/submissions", self.base_url)
    }

    fn submission_url(&self, handle: &SubmissionHandle) -> String {
        format!("{}/submissions/{}", self.base_url, handle)
    }
}

fn header_value(value: &str, what: &str) -> Result<HeaderValue, JudgeError> {
    HeaderValue::from_str(value).map_err(|_| JudgeError::Config {
        message: format!("{} contains characters not allowed in a header", what),
    })
}

fn ensure_success(response: &reqwest::Response, operation: Operation) -> Result<(), JudgeError> {
    let status = response.status();
    if !status.is_success() {
        return Err(JudgeError::Transport {
            operation,
            status: status.as_u16(),
        });
    }
    Ok(())
}

#[async_trait]
impl JudgeClient for Judge0Client {
    async fn submit(&self, request: &SubmissionRequest) -> Result<SubmissionHandle, JudgeError> {
        let body = CreateSubmissionBody {
            source_code: codec::encode(&request.source_code),
            language_id: request.language.id(),
            stdin: codec::encode(&request.stdin),
        };

        let response = self
            .client
            .post(self.submissions_url())
            .query(&[("base64_encoded", "true"), ("wait", "false")])
            .json(&body)
            .send()
            .await?;
        ensure_success(&response, Operation::Submit)?;

        let created: CreateSubmissionResponse =
            response
                .json()
                .await
                .map_err(|e| JudgeError::InvalidResponse {
                    message: format!("failed to parse submission response: {}", e),
                })?;

        debug!(token = %created.token, language_id = body.language_id, "Submission created");
        Ok(SubmissionHandle(created.token))
    }

    async fn fetch_result(&self, handle: &SubmissionHandle) -> Result<SubmissionResult, JudgeError> {
        let response = self
            .client
            .get(self.submission_url(handle))
            .query(&[("base64_encoded", "true")])
            .send()
            .await?;
        ensure_success(&response, Operation::FetchResult)?;

        let body: SubmissionBody =
            response
                .json()
                .await
                .map_err(|e| JudgeError::InvalidResponse {
                    message: format!("failed to parse submission status: {}", e),
                })?;

        let result = SubmissionResult::from(body);
        debug!(token = %handle, status = ?result.status_id, "Submission status fetched");
        Ok(result)
    }
}
