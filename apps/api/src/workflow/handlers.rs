//! Axum route handlers for the lead workflow. One handler per operator action.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::analysis::NextTurn;
use crate::errors::AppError;
use crate::models::lead::{Lead, LeadId};
use crate::state::AppState;
use crate::telephony::CallStatus;
use crate::workflow::{AnalyzeOutcome, NewLeadRequest, SubmittedLead};

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AnalyzeResponse {
    Analyzed {
        lead: Lead,
    },
    NotReady {
        message: String,
        last_call_status: CallStatus,
    },
}

#[derive(Debug, Deserialize)]
pub struct NextQuestionRequest {
    #[serde(default)]
    pub transcript: String,
}

#[derive(Debug, Serialize)]
pub struct NextQuestionResponse {
    pub question: Option<String>,
    pub end: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/leads
///
/// Creates the lead and places the outbound call.
pub async fn handle_submit_lead(
    State(state): State<AppState>,
    Json(request): Json<NewLeadRequest>,
) -> Result<(StatusCode, Json<SubmittedLead>), AppError> {
    let submitted = state.workflow.submit_new_lead(request).await?;
    Ok((StatusCode::CREATED, Json(submitted)))
}

/// GET /api/v1/leads/:id
pub async fn handle_get_lead(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Lead>, AppError> {
    let lead = state.workflow.view(&LeadId::new(id)).await?;
    Ok(Json(lead))
}

/// POST /api/v1/leads/:id/analyze
///
/// Blocks while the call is polled (up to the configured timeout). Answers 202 when the
/// recording is not available yet; the operator retries later.
pub async fn handle_analyze_lead(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let response = match state.workflow.analyze(&LeadId::new(id)).await? {
        AnalyzeOutcome::Analyzed(lead) => {
            (StatusCode::OK, Json(AnalyzeResponse::Analyzed { lead })).into_response()
        }
        AnalyzeOutcome::NotReady { last_status } => (
            StatusCode::ACCEPTED,
            Json(AnalyzeResponse::NotReady {
                message: "Recording not ready yet. Try again in a minute.".to_string(),
                last_call_status: last_status,
            }),
        )
            .into_response(),
    };
    Ok(response)
}

/// POST /api/v1/conversation/next-question
///
/// Stateless: the whole conversation so far is sent with every request.
pub async fn handle_next_question(
    State(state): State<AppState>,
    Json(request): Json<NextQuestionRequest>,
) -> Result<Json<NextQuestionResponse>, AppError> {
    let response = match state.workflow.next_question(&request.transcript).await? {
        NextTurn::Ask(question) => NextQuestionResponse {
            question: Some(question),
            end: false,
        },
        NextTurn::End => NextQuestionResponse {
            question: None,
            end: true,
        },
    };
    Ok(Json(response))
}
