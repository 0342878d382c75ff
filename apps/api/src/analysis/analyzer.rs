//! Transcript Analyzer — fills one of the two prompt templates with a transcript and asks
//! the model. The extract-and-score reply is parsed into a `LeadAnalysis`; a reply that
//! does not parse is reported as `AnalysisError::Unparseable` with the raw text attached.

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use crate::analysis::models::{parse_lead_analysis, LeadAnalysis};
use crate::analysis::prompts::{
    render, END_SENTINEL, EXTRACT_AND_SCORE_PROMPT, NEXT_QUESTION_PROMPT, NEXT_QUESTION_SYSTEM,
};
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{LlmClient, LlmError};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("model output could not be parsed as a lead analysis: {reason}")]
    Unparseable { reason: String, raw: String },
}

/// Outcome of the next-question prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextTurn {
    Ask(String),
    End,
}

/// Parsed analysis plus the exact model reply it came from.
#[derive(Debug, Clone)]
pub struct AnalyzedTranscript {
    pub raw: String,
    pub analysis: LeadAnalysis,
}

#[async_trait]
pub trait LeadAnalyzer: Send + Sync {
    /// Asks for the next question to put to the lead, or the end of the conversation.
    async fn next_question(&self, transcript: &str) -> Result<NextTurn, AnalysisError>;

    /// Extracts qualification fields, score, category and summary from a finished call.
    async fn analyze(&self, transcript: &str) -> Result<AnalyzedTranscript, AnalysisError>;
}

pub struct LlmLeadAnalyzer(pub LlmClient);

#[async_trait]
impl LeadAnalyzer for LlmLeadAnalyzer {
    async fn next_question(&self, transcript: &str) -> Result<NextTurn, AnalysisError> {
        let prompt = render(NEXT_QUESTION_PROMPT, transcript);
        let reply = self.0.complete(&prompt, NEXT_QUESTION_SYSTEM).await?;
        debug!("Next-question reply: {reply}");
        Ok(interpret_next_question(&reply))
    }

    async fn analyze(&self, transcript: &str) -> Result<AnalyzedTranscript, AnalysisError> {
        let prompt = render(EXTRACT_AND_SCORE_PROMPT, transcript);
        let raw = self.0.complete(&prompt, JSON_ONLY_SYSTEM).await?;

        match parse_lead_analysis(&raw) {
            Ok(analysis) => Ok(AnalyzedTranscript { raw, analysis }),
            Err(reason) => {
                warn!("Unparseable lead analysis: {reason}");
                Err(AnalysisError::Unparseable { reason, raw })
            }
        }
    }
}

/// Maps a next-question reply to `NextTurn`. The sentinel matches regardless of case,
/// surrounding whitespace, quotes, or trailing punctuation.
pub fn interpret_next_question(reply: &str) -> NextTurn {
    let trimmed = reply.trim();
    let bare = trimmed
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '*')
        .trim_end_matches(['.', '!'])
        .trim();
    if bare.eq_ignore_ascii_case(END_SENTINEL) {
        NextTurn::End
    } else {
        NextTurn::Ask(trimmed.to_string())
    }
}
