//! Lead Workflow — orchestrates the record store, telephony provider and analyzer.
//!
//! Flow: submit (create → call → mark calling), then on demand analyze (fetch → poll →
//! download → transcribe → analyze → mark analyzed). Nothing runs in the background and
//! nothing is retried automatically; every step failure stops the action and is reported.
//! A failure after the call was placed leaves the lead as it is, with no compensation.

use std::sync::Arc;

use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::analysis::{AnalysisError, LeadAnalyzer, NextTurn, Transcriber};
use crate::errors::AppError;
use crate::models::lead::{Lead, LeadId, LeadPatch, LeadStatus, NewLead};
use crate::store::LeadStore;
use crate::telephony::{
    callback_url_for, CallPoller, CallSid, CallStatus, PollOutcome, Telephony,
};

const MIN_E164_DIGITS: usize = 8;
const MAX_E164_DIGITS: usize = 15;

#[derive(Debug, Clone, Deserialize)]
pub struct NewLeadRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmittedLead {
    pub lead_id: LeadId,
    pub call_sid: CallSid,
    pub status: LeadStatus,
}

#[derive(Debug, Clone)]
pub enum AnalyzeOutcome {
    Analyzed(Lead),
    /// The recording is not available yet. Not an error: run the action again later.
    NotReady { last_status: CallStatus },
}

#[derive(Clone)]
pub struct LeadWorkflow {
    store: Arc<dyn LeadStore>,
    telephony: Arc<dyn Telephony>,
    transcriber: Arc<dyn Transcriber>,
    analyzer: Arc<dyn LeadAnalyzer>,
    voice_start_url: Url,
    poller: CallPoller,
}

impl LeadWorkflow {
    pub fn new(
        store: Arc<dyn LeadStore>,
        telephony: Arc<dyn Telephony>,
        transcriber: Arc<dyn Transcriber>,
        analyzer: Arc<dyn LeadAnalyzer>,
        voice_start_url: Url,
        poller: CallPoller,
    ) -> Self {
        Self {
            store,
            telephony,
            transcriber,
            analyzer,
            voice_start_url,
            poller,
        }
    }

    /// Creates the lead, places the call and marks the lead as calling.
    pub async fn submit_new_lead(
        &self,
        request: NewLeadRequest,
    ) -> Result<SubmittedLead, AppError> {
        let new_lead = validate_new_lead(request)?;

        let lead_id = self.store.create(&new_lead).await?;
        info!("Lead {lead_id} created");

        let callback_url = callback_url_for(&self.voice_start_url, &lead_id);
        let call_sid = self.telephony.initiate(&new_lead.phone, &callback_url).await?;
        info!("Call {call_sid} started for lead {lead_id}");

        let patch = LeadPatch {
            status: Some(LeadStatus::Calling),
            call_sid: Some(call_sid.as_str().to_string()),
            ..Default::default()
        };
        if let Err(e) = self.store.update(&lead_id, &patch).await {
            warn!("Call {call_sid} was placed but lead {lead_id} could not be marked as calling");
            return Err(e.into());
        }

        Ok(SubmittedLead {
            lead_id,
            call_sid,
            status: LeadStatus::Calling,
        })
    }

    /// Waits for the lead's call recording, analyzes it and stores the result.
    pub async fn analyze(&self, lead_id: &LeadId) -> Result<AnalyzeOutcome, AppError> {
        let lead = self.fetch_existing(lead_id).await?;
        let call_sid = match lead.call_sid.as_deref().map(str::trim) {
            Some(sid) if !sid.is_empty() => CallSid::new(sid),
            _ => return Err(AppError::NotStarted(lead_id.to_string())),
        };

        info!(
            "Polling call {call_sid} for lead {lead_id} (up to {}s)",
            self.poller.timeout().as_secs()
        );
        let recording = match self.poller.poll(self.telephony.as_ref(), &call_sid).await? {
            PollOutcome::Ready(recording) => recording,
            PollOutcome::NotReady { last_status } => {
                info!("Recording for lead {lead_id} not ready (call {last_status})");
                return Ok(AnalyzeOutcome::NotReady { last_status });
            }
        };

        let audio = self.telephony.download(&recording).await?;
        let transcript = self.transcriber.transcribe(&audio).await?;
        let analyzed = match self.analyzer.analyze(&transcript).await {
            Ok(analyzed) => analyzed,
            Err(AnalysisError::Unparseable { reason, raw }) => {
                warn!("Analysis for lead {lead_id} is unparseable: {reason}");
                // Status and the typed fields stay as they were.
                let patch = LeadPatch {
                    transcript: Some(transcript),
                    analysis_raw: Some(raw.clone()),
                    ..Default::default()
                };
                self.store.update(lead_id, &patch).await?;
                return Err(AppError::UnparseableAnalysis { reason, raw });
            }
            Err(e) => return Err(e.into()),
        };
        let analysis = analyzed.analysis;
        info!(
            "Lead {lead_id} scored {} ({:?})",
            analysis.score, analysis.category
        );

        let extracted_fields = serde_json::to_value(&analysis.extracted_fields)
            .map_err(|e| AppError::Internal(e.into()))?;
        let patch = LeadPatch {
            status: Some(LeadStatus::Analyzed),
            transcript: Some(transcript),
            analysis_raw: Some(analyzed.raw),
            extracted_fields: Some(extracted_fields),
            score: Some(analysis.score),
            category: Some(analysis.category),
            summary: Some(analysis.summary),
            ..Default::default()
        };
        self.store.update(lead_id, &patch).await?;

        let lead = self.fetch_existing(lead_id).await?;
        Ok(AnalyzeOutcome::Analyzed(lead))
    }

    /// Current stored state of the lead.
    pub async fn view(&self, lead_id: &LeadId) -> Result<Lead, AppError> {
        self.fetch_existing(lead_id).await
    }

    pub async fn next_question(&self, transcript: &str) -> Result<NextTurn, AppError> {
        if transcript.trim().is_empty() {
            return Err(AppError::Validation("transcript cannot be empty".to_string()));
        }
        Ok(self.analyzer.next_question(transcript).await?)
    }

    async fn fetch_existing(&self, lead_id: &LeadId) -> Result<Lead, AppError> {
        self.store
            .fetch(lead_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Lead {lead_id} not found")))
    }
}

/// Trims the form fields and rejects empty ones or a phone number that is not E.164.
fn validate_new_lead(request: NewLeadRequest) -> Result<NewLead, AppError> {
    let name = request.name.trim().to_string();
    let phone = request.phone.trim().to_string();
    let query = request.query.trim().to_string();

    let missing: Vec<&str> = [("name", &name), ("phone", &phone), ("query", &query)]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(field, _)| field)
        .collect();
    if !missing.is_empty() {
        return Err(AppError::Validation(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    }

    if !is_e164(&phone) {
        return Err(AppError::Validation(format!(
            "phone must be in E.164 format (e.g. +911234567890), got '{phone}'"
        )));
    }

    Ok(NewLead {
        name,
        phone,
        query,
        status: LeadStatus::Created,
    })
}

fn is_e164(phone: &str) -> bool {
    let Some(digits) = phone.strip_prefix('+') else {
        return false;
    };
    (MIN_E164_DIGITS..=MAX_E164_DIGITS).contains(&digits.len())
        && !digits.starts_with('0')
        && digits.bytes().all(|b| b.is_ascii_digit())
}
