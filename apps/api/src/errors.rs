use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::analysis::AnalysisError;
use crate::llm_client::LlmError;
use crate::store::StoreError;
use crate::telephony::TelephonyError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// "Recording not ready" is deliberately absent: it is an outcome, not an error.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("No call has been started for lead {0}")]
    NotStarted(String),

    #[error("Record store error: {0}")]
    Store(#[from] StoreError),

    #[error("Telephony error: {0}")]
    Telephony(#[from] TelephonyError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Unparseable analysis: {reason}")]
    UnparseableAnalysis { reason: String, raw: String },

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<AnalysisError> for AppError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::Llm(e) => AppError::Llm(e),
            AnalysisError::Unparseable { reason, raw } => {
                AppError::UnparseableAnalysis { reason, raw }
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::NotStarted(_) => (StatusCode::CONFLICT, "NOT_STARTED", self.to_string()),
            // Remote failures carry the upstream status and body so the operator can act on them.
            AppError::Store(e) => {
                tracing::error!("Record store error: {e}");
                (StatusCode::BAD_GATEWAY, "STORE_ERROR", e.to_string())
            }
            AppError::Telephony(e) => {
                tracing::error!("Telephony error: {e}");
                (StatusCode::BAD_GATEWAY, "TELEPHONY_ERROR", e.to_string())
            }
            AppError::Llm(e) => {
                tracing::error!("LLM error: {e}");
                (StatusCode::BAD_GATEWAY, "LLM_ERROR", e.to_string())
            }
            // The raw reply goes to the log and the lead row, never to the client.
            AppError::UnparseableAnalysis { reason, raw } => {
                tracing::warn!("Unparseable analysis ({reason}), model replied: {raw}");
                (
                    StatusCode::BAD_GATEWAY,
                    "UNPARSEABLE_ANALYSIS",
                    format!("The model reply could not be read as a lead analysis: {reason}"),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
