pub mod client;
pub mod codec;
pub mod error;
pub mod evaluator;
pub mod orchestrator;
pub mod service;
pub mod state;

pub use client::{Judge0Client, JudgeClient};
pub use error::{EvaluationError, JudgeError, Operation};
pub use orchestrator::Orchestrator;
pub use service::{EvaluationService, ServiceError, SubmitReport};
pub use state::{EvaluationPhase, EvaluationState};
