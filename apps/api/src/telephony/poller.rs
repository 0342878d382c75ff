//! Call Poller — waits for a call to complete and its recording to appear.
//!
//! Polls at a fixed interval until the deadline. Running out of time is not an error:
//! the caller gets `PollOutcome::NotReady` and is expected to ask again later. A call
//! that completed before its recording is available looks the same as one still in
//! progress.

use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, info};

use super::{CallSid, CallStatus, RecordingRef, Telephony, TelephonyError};

/// Upper bound for both the timeout and the interval: one hour.
pub const MAX_POLL_TIMEOUT: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The newest recording of a completed call.
    Ready(RecordingRef),
    NotReady { last_status: CallStatus },
}

#[derive(Debug, Clone, Copy)]
pub struct CallPoller {
    timeout: Duration,
    interval: Duration,
}

impl CallPoller {
    /// `interval` must be non-zero; `Config` rejects a zero interval at startup.
    /// Both durations are capped at `MAX_POLL_TIMEOUT`.
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self {
            timeout: timeout.min(MAX_POLL_TIMEOUT),
            interval: interval.min(MAX_POLL_TIMEOUT),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn poll(
        &self,
        telephony: &dyn Telephony,
        call: &CallSid,
    ) -> Result<PollOutcome, TelephonyError> {
        let deadline = Instant::now() + self.timeout;
        let mut checks = 0u32;

        loop {
            checks += 1;
            let status = telephony.fetch_status(call).await?;
            debug!("Poll #{checks} for call {call}: {status}");

            if status.is_completed() {
                let recordings = telephony.list_recordings(call).await?;
                if let Some(newest) = recordings.into_iter().next() {
                    info!(
                        "Call {call} completed; recording {} ready after {checks} check(s)",
                        newest.sid
                    );
                    return Ok(PollOutcome::Ready(newest));
                }
                debug!("Call {call} completed but no recording is listed yet");
            }

            if Instant::now() + self.interval > deadline {
                info!("Call {call} not ready after {checks} check(s) (last status {status})");
                return Ok(PollOutcome::NotReady {
                    last_status: status,
                });
            }
            sleep(self.interval).await;
        }
    }
}
