//! Run outcome to HTTP response conversion.
//!
//! Failed runs answer with the run id and the stage that failed. The cause
//! stays in the log: it can carry local paths and remote error bodies.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use rf_pipeline::{PipelineError, RunFailure};

#[derive(Debug)]
pub enum AppError {
    /// The run stopped at a stage.
    Run(RunFailure),
    /// The run could not be driven to an outcome (e.g. its task panicked).
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Run(failure) => match failure.error {
                PipelineError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                PipelineError::Cancelled { .. } => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RunFailure> for AppError {
    fn from(failure: RunFailure) -> Self {
        AppError::Run(failure)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match &self {
            AppError::Run(failure) => {
                tracing::warn!(
                    run_id = %failure.run_id,
                    stage = %failure.stage(),
                    status = %status,
                    "Run request failed"
                );
                json!({
                    "status": "failed",
                    "run_id": failure.run_id,
                    "stage": failure.stage(),
                })
            }
            AppError::Internal(message) => {
                tracing::error!(status = %status, error = %message, "Run request aborted");
                json!({ "status": "failed" })
            }
        };

        (status, axum::Json(body)).into_response()
    }
}
