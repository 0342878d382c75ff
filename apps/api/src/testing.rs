//! In-memory fakes of the external collaborators, shared by unit tests.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::time::Instant;

use serde_json::{json, Value};

use crate::analysis::analyzer::AnalyzedTranscript;
use crate::analysis::models::{parse_lead_analysis, LeadAnalysis};
use crate::analysis::{AnalysisError, LeadAnalyzer, NextTurn};
use crate::models::lead::{Lead, LeadId, LeadPatch, LeadStatus, NewLead};
use crate::store::{LeadStore, StoreError};
use crate::telephony::{CallSid, CallStatus, RecordingRef, Telephony, TelephonyError};

pub const ANALYSIS_REPLY: &str = r#"{
    "extracted_fields": {
        "interest_level": "high",
        "budget": "20 lakh INR",
        "timeline": "2027 intake",
        "program_interest": "MBA"
    },
    "score": 82,
    "category": "Hot",
    "summary": "Interested in the full-time MBA for the 2027 intake."
}"#;

// ────────────────────────────────────────────────────────────────────────────
// Record store
// ────────────────────────────────────────────────────────────────────────────

/// A stored row as the record store would return it.
pub fn stored_lead(id: &str, status: LeadStatus, call_sid: Option<&str>) -> Lead {
    serde_json::from_value(json!({
        "id": id,
        "name": "Ravi",
        "phone": "+15550002222",
        "query": "Data science",
        "status": status,
        "call_sid": call_sid,
    }))
    .unwrap()
}

fn to_value<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap()
}

#[derive(Default)]
struct StoreState {
    leads: BTreeMap<String, Lead>,
    creates: Vec<NewLead>,
    updates: Vec<(LeadId, LeadPatch)>,
    fetches: usize,
}

#[derive(Default)]
pub struct FakeStore {
    state: Mutex<StoreState>,
    fail_updates: bool,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_updates(mut self) -> Self {
        self.fail_updates = true;
        self
    }

    /// Seeds a lead directly, bypassing `create`.
    pub fn insert(&self, lead: Lead) {
        let mut state = self.state.lock().unwrap();
        state.leads.insert(lead.id.to_string(), lead);
    }

    pub fn lead(&self, id: &str) -> Option<Lead> {
        self.state.lock().unwrap().leads.get(id).cloned()
    }

    pub fn creates(&self) -> Vec<NewLead> {
        self.state.lock().unwrap().creates.clone()
    }

    pub fn updates(&self) -> Vec<(LeadId, LeadPatch)> {
        self.state.lock().unwrap().updates.clone()
    }

    pub fn remote_calls(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.creates.len() + state.updates.len() + state.fetches
    }
}

fn apply(lead: &mut Lead, patch: &LeadPatch) {
    if let Some(status) = &patch.status {
        lead.status = to_value(status).as_str().map(String::from);
    }
    if let Some(v) = &patch.call_sid {
        lead.call_sid = Some(v.clone());
    }
    if let Some(v) = &patch.transcript {
        lead.transcript = Some(v.clone());
    }
    if let Some(v) = &patch.analysis_raw {
        lead.analysis_raw = Some(v.clone());
    }
    if let Some(v) = &patch.extracted_fields {
        lead.extracted_fields = Some(v.clone());
    }
    if let Some(score) = &patch.score {
        lead.score = Some(to_value(score));
    }
    if let Some(category) = &patch.category {
        lead.category = Some(to_value(category));
    }
    if let Some(v) = &patch.summary {
        lead.summary = Some(v.clone());
    }
}

#[async_trait]
impl LeadStore for FakeStore {
    async fn create(&self, new_lead: &NewLead) -> Result<LeadId, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.creates.push(new_lead.clone());
        let id = LeadId::new(format!("L{}", state.creates.len()));
        let mut lead: Lead = serde_json::from_value(json!({ "id": id })).unwrap();
        lead.name = Some(new_lead.name.clone());
        lead.phone = Some(new_lead.phone.clone());
        lead.query = Some(new_lead.query.clone());
        lead.status = to_value(&new_lead.status).as_str().map(String::from);
        state.leads.insert(id.to_string(), lead);
        Ok(id)
    }

    async fn update(&self, id: &LeadId, patch: &LeadPatch) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.updates.push((id.clone(), patch.clone()));
        if self.fail_updates {
            return Err(StoreError::Api {
                status: 500,
                message: "update rejected".to_string(),
            });
        }
        if let Some(lead) = state.leads.get_mut(id.as_str()) {
            apply(lead, patch);
        }
        Ok(())
    }

    async fn fetch(&self, id: &LeadId) -> Result<Option<Lead>, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.fetches += 1;
        Ok(state.leads.get(id.as_str()).cloned())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Telephony
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct TelephonyState {
    initiated: Vec<(String, String)>,
    status_checks: Vec<Instant>,
    listings: usize,
    downloads: usize,
}

/// Replays a scripted status sequence; the last status repeats once the script runs out.
pub struct FakeTelephony {
    statuses: Vec<CallStatus>,
    recordings_from_check: usize,
    fail_status: bool,
    state: Mutex<TelephonyState>,
}

impl FakeTelephony {
    pub fn new(statuses: Vec<CallStatus>) -> Self {
        Self {
            statuses,
            recordings_from_check: 1,
            fail_status: false,
            state: Mutex::new(TelephonyState::default()),
        }
    }

    /// Recordings are listed only from the `n`-th status check onwards (1-based).
    pub fn with_recordings_from_check(mut self, n: usize) -> Self {
        self.recordings_from_check = n;
        self
    }

    pub fn failing_status(mut self) -> Self {
        self.fail_status = true;
        self
    }

    pub fn initiated(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().initiated.clone()
    }

    pub fn status_checks(&self) -> usize {
        self.state.lock().unwrap().status_checks.len()
    }

    pub fn status_check_times(&self) -> Vec<Instant> {
        self.state.lock().unwrap().status_checks.clone()
    }

    pub fn recording_listings(&self) -> usize {
        self.state.lock().unwrap().listings
    }

    pub fn downloads(&self) -> usize {
        self.state.lock().unwrap().downloads
    }

    pub fn remote_calls(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.initiated.len() + state.status_checks.len() + state.listings + state.downloads
    }
}

#[async_trait]
impl Telephony for FakeTelephony {
    async fn initiate(&self, to: &str, callback_url: &str) -> Result<CallSid, TelephonyError> {
        let mut state = self.state.lock().unwrap();
        state
            .initiated
            .push((to.to_string(), callback_url.to_string()));
        Ok(CallSid::new(format!("C{}", state.initiated.len())))
    }

    async fn fetch_status(&self, _call: &CallSid) -> Result<CallStatus, TelephonyError> {
        let mut state = self.state.lock().unwrap();
        state.status_checks.push(Instant::now());
        if self.fail_status {
            return Err(TelephonyError::Api {
                status: 404,
                message: "call not found".to_string(),
            });
        }
        let index = (state.status_checks.len() - 1).min(self.statuses.len().saturating_sub(1));
        Ok(self.statuses.get(index).copied().unwrap_or(CallStatus::Unknown))
    }

    async fn list_recordings(&self, _call: &CallSid) -> Result<Vec<RecordingRef>, TelephonyError> {
        let mut state = self.state.lock().unwrap();
        state.listings += 1;
        if state.status_checks.len() < self.recordings_from_check {
            return Ok(vec![]);
        }
        Ok(vec![RecordingRef {
            sid: "RE1".to_string(),
            uri: "/2010-04-01/Accounts/AC1/Recordings/RE1.json".to_string(),
        }])
    }

    async fn download(&self, _recording: &RecordingRef) -> Result<Bytes, TelephonyError> {
        self.state.lock().unwrap().downloads += 1;
        Ok(Bytes::from_static(b"RIFF-fake-audio"))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Analyzer
// ────────────────────────────────────────────────────────────────────────────

pub struct FakeAnalyzer {
    reply: String,
    next_turn: NextTurn,
    transcripts: Mutex<Vec<String>>,
}

impl FakeAnalyzer {
    pub fn new() -> Self {
        Self::replying(ANALYSIS_REPLY)
    }

    /// Parses `reply` the same way the model-backed analyzer does.
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            next_turn: NextTurn::Ask("What is your budget?".to_string()),
            transcripts: Mutex::new(vec![]),
        }
    }

    pub fn with_next_turn(mut self, turn: NextTurn) -> Self {
        self.next_turn = turn;
        self
    }

    pub fn calls(&self) -> usize {
        self.transcripts.lock().unwrap().len()
    }

    pub fn analysis() -> LeadAnalysis {
        parse_lead_analysis(ANALYSIS_REPLY).unwrap()
    }
}

#[async_trait]
impl LeadAnalyzer for FakeAnalyzer {
    async fn next_question(&self, transcript: &str) -> Result<NextTurn, AnalysisError> {
        self.transcripts.lock().unwrap().push(transcript.to_string());
        Ok(self.next_turn.clone())
    }

    async fn analyze(&self, transcript: &str) -> Result<AnalyzedTranscript, AnalysisError> {
        self.transcripts.lock().unwrap().push(transcript.to_string());
        match parse_lead_analysis(&self.reply) {
            Ok(analysis) => Ok(AnalyzedTranscript {
                raw: self.reply.clone(),
                analysis,
            }),
            Err(reason) => Err(AnalysisError::Unparseable {
                reason,
                raw: self.reply.clone(),
            }),
        }
    }
}

/// Convenience bundle of shared fakes.
pub struct Fakes {
    pub store: Arc<FakeStore>,
    pub telephony: Arc<FakeTelephony>,
    pub analyzer: Arc<FakeAnalyzer>,
}

impl Fakes {
    pub fn new(statuses: Vec<CallStatus>) -> Self {
        Self {
            store: Arc::new(FakeStore::new()),
            telephony: Arc::new(FakeTelephony::new(statuses)),
            analyzer: Arc::new(FakeAnalyzer::new()),
        }
    }
}
