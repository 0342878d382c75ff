//! Telephony Client — outbound call placement, call status, recordings.
//!
//! `initiate` places a real phone call and costs money; it is never retried, on any error.

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::lead::LeadId;

pub mod poller;
pub mod twilio;

pub use poller::{CallPoller, PollOutcome, MAX_POLL_TIMEOUT};
pub use twilio::TwilioClient;

#[derive(Debug, Error)]
pub enum TelephonyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Telephony API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

/// Provider-issued call identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallSid(String);

impl CallSid {
    pub fn new(sid: impl Into<String>) -> Self {
        Self(sid.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallSid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Call status as reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CallStatus {
    Queued,
    Ringing,
    InProgress,
    Completed,
    Busy,
    Failed,
    NoAnswer,
    Canceled,
    #[serde(other)]
    Unknown,
}

impl CallStatus {
    pub fn is_completed(self) -> bool {
        self == CallStatus::Completed
    }
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CallStatus::Queued => "queued",
            CallStatus::Ringing => "ringing",
            CallStatus::InProgress => "in-progress",
            CallStatus::Completed => "completed",
            CallStatus::Busy => "busy",
            CallStatus::Failed => "failed",
            CallStatus::NoAnswer => "no-answer",
            CallStatus::Canceled => "canceled",
            CallStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Handle to one stored recording.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingRef {
    pub sid: String,
    /// Provider resource path, e.g. `/2010-04-01/Accounts/AC…/Recordings/RE….json`.
    #[serde(default)]
    pub uri: String,
}

#[async_trait]
pub trait Telephony: Send + Sync {
    /// Places an outbound call to `to`; the provider fetches call instructions from
    /// `callback_url` once the call connects.
    async fn initiate(&self, to: &str, callback_url: &str) -> Result<CallSid, TelephonyError>;

    async fn fetch_status(&self, call: &CallSid) -> Result<CallStatus, TelephonyError>;

    /// Recordings for the call, most recent first.
    async fn list_recordings(&self, call: &CallSid) -> Result<Vec<RecordingRef>, TelephonyError>;

    async fn download(&self, recording: &RecordingRef) -> Result<Bytes, TelephonyError>;
}

/// Appends `lead_id=<id>` to the voice-start URL, keeping any query it already has.
pub fn callback_url_for(base: &Url, lead_id: &LeadId) -> String {
    let mut url = base.clone();
    url.query_pairs_mut().append_pair("lead_id", lead_id.as_str());
    url.to_string()
}
