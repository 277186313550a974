//! Error types for the judge client and the orchestrator.

use std::fmt;

/// Remote call that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Submit,
    FetchResult,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Submit => write!(f, "submit"),
            Operation::FetchResult => write!(f, "fetch result"),
        }
    }
}

/// Judge client errors.
#[derive(Debug, thiserror::Error)]
pub enum JudgeError {
    /// Judge answered with a non-success HTTP status.
    #[error("judge {operation} failed with status {status}")]
    Transport { operation: Operation, status: u16 },

    /// Request never got an answer (connect, TLS, timeout).
    #[error("judge request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// Body could not be understood.
    #[error("invalid judge response: {message}")]
    InvalidResponse { message: String },

    /// An output field was not valid base64.
    #[error("failed to decode {field}: {source}")]
    Decode {
        field: &'static str,
        #[source]
        source: base64::DecodeError,
    },

    /// Client could not be built from configuration.
    #[error("invalid judge client configuration: {message}")]
    Config { message: String },
}

impl JudgeError {
    /// HTTP status carried by a transport error
    pub fn status(&self) -> Option<u16> {
        match self {
            JudgeError::Transport { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Why a single test case produced no comparable output.
#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    #[error(transparent)]
    Judge(#[from] JudgeError),

    /// Poll budget exhausted without a terminal status.
    #[error("Timeout")]
    Timeout { attempts: u32 },

    /// Judge finished with a failure status (only when early stop is enabled).
    #[error("{description}")]
    Rejected { status: i32, description: String },
}
