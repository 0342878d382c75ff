use bytes::Bytes;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::{CallSid, CallStatus, RecordingRef, Telephony, TelephonyError};

pub const DEFAULT_API_BASE: &str = "https://api.twilio.com";
const API_VERSION: &str = "2010-04-01";

/// Twilio REST client for the Calls and Recordings resources. Uses HTTP basic auth with
/// the account SID and auth token.
#[derive(Clone)]
pub struct TwilioClient {
    client: Client,
    api_base: String,
    account_sid: String,
    auth_token: String,
    from_number: String,
}

#[derive(Deserialize)]
struct CallResource {
    sid: String,
    status: CallStatus,
}

#[derive(Deserialize)]
struct RecordingList {
    #[serde(default)]
    recordings: Vec<RecordingRef>,
}

impl TwilioClient {
    pub fn new(
        api_base: String,
        account_sid: String,
        auth_token: String,
        from_number: String,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            api_base: api_base.trim_end_matches('/').to_string(),
            account_sid,
            auth_token,
            from_number,
        }
    }

    fn account_url(&self) -> String {
        format!(
            "{}/{API_VERSION}/Accounts/{}",
            self.api_base, self.account_sid
        )
    }

    fn call_url(&self, call: &CallSid) -> String {
        format!("{}/Calls/{call}", self.account_url())
    }

    /// Audio URL for a recording. The listed `uri` points at the JSON metadata; swapping
    /// the extension selects the WAV media.
    fn media_url(&self, recording: &RecordingRef) -> String {
        match recording.uri.strip_suffix(".json") {
            Some(path) if !path.is_empty() => format!("{}{path}.wav", self.api_base),
            _ => format!(
                "{}/Recordings/{}.wav",
                self.account_url(),
                recording.sid
            ),
        }
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request.basic_auth(&self.account_sid, Some(&self.auth_token))
    }

    async fn check(response: Response) -> Result<Response, TelephonyError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        warn!("Telephony API returned {status}: {message}");
        Err(TelephonyError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait::async_trait]
impl Telephony for TwilioClient {
    async fn initiate(&self, to: &str, callback_url: &str) -> Result<CallSid, TelephonyError> {
        let params = [
            ("To", to),
            ("From", self.from_number.as_str()),
            ("Url", callback_url),
        ];
        let response = self
            .authed(self.client.post(format!("{}/Calls.json", self.account_url())))
            .form(&params)
            .send()
            .await?;
        let call: CallResource = Self::check(response).await?.json().await?;
        info!("Call {} placed to {to} (status {})", call.sid, call.status);
        Ok(CallSid::new(call.sid))
    }

    async fn fetch_status(&self, call: &CallSid) -> Result<CallStatus, TelephonyError> {
        let response = self
            .authed(self.client.get(format!("{}.json", self.call_url(call))))
            .send()
            .await?;
        let resource: CallResource = Self::check(response).await?.json().await?;
        debug!("Call {call} status: {}", resource.status);
        Ok(resource.status)
    }

    async fn list_recordings(&self, call: &CallSid) -> Result<Vec<RecordingRef>, TelephonyError> {
        let response = self
            .authed(
                self.client
                    .get(format!("{}/Recordings.json", self.call_url(call))),
            )
            .send()
            .await?;
        let list: RecordingList = Self::check(response).await?.json().await?;
        debug!("Call {call} has {} recording(s)", list.recordings.len());
        Ok(list.recordings)
    }

    async fn download(&self, recording: &RecordingRef) -> Result<Bytes, TelephonyError> {
        let url = self.media_url(recording);
        debug!("Downloading recording {} from {url}", recording.sid);
        let response = self.authed(self.client.get(url)).send().await?;
        let audio = Self::check(response).await?.bytes().await?;
        debug!("Recording {} downloaded ({} bytes)", recording.sid, audio.len());
        Ok(audio)
    }
}
