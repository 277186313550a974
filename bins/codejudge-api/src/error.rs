// HTTP error mapping for the CodeJudge API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use codejudge_common::progress::ProgressError;
use codejudge_common::session::SessionError;
use codejudge_judge::ServiceError;
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("sign in required")]
    Unauthorized,

    #[error("problem not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Progress(#[from] ProgressError),

    #[error("failed to render metrics: {0}")]
    Metrics(String),
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        ApiError::Service(ServiceError::Session(err))
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Service(ServiceError::Session(SessionError::SignedOut)) => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::Service(ServiceError::Session(SessionError::DisplayNameTooShort)) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Service(_) | ApiError::Progress(_) | ApiError::Metrics(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }
        (
            status,
            Json(serde_json::json!({
                "error": self.to_string()
            })),
        )
            .into_response()
    }
}
