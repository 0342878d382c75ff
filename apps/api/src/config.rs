use std::fmt;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::Url;

use crate::llm_client;
use crate::telephony::{twilio, MAX_POLL_TIMEOUT};

const DEFAULT_POLL_TIMEOUT_SECS: u64 = 180;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;

/// Application configuration loaded from environment variables.
///
/// A local `.env` file and hosted secrets both end up as environment variables, so this
/// is the only configuration path. Startup fails if a required variable is missing.
#[derive(Clone)]
pub struct Config {
    pub twilio_account_sid: String,
    pub twilio_auth_token: String,
    pub twilio_from_number: String,
    pub twilio_api_base: String,
    /// Voice instructions URL; the lead id is appended as `?lead_id=`.
    pub voice_start_url: Url,
    pub db_url: String,
    pub db_key: String,
    pub groq_api_key: String,
    pub llm_api_url: String,
    pub llm_model: String,
    pub poll_timeout: Duration,
    pub poll_interval: Duration,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key → value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let require = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("Required environment variable '{key}' is not set"))
        };
        let optional =
            |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let voice_start_url = require("TWILIO_VOICE_START_URL")?;
        let voice_start_url = Url::parse(&voice_start_url).with_context(|| {
            format!("TWILIO_VOICE_START_URL is not a valid URL: {voice_start_url}")
        })?;

        let poll_timeout = optional(
            "CALL_POLL_TIMEOUT_SECS",
            &DEFAULT_POLL_TIMEOUT_SECS.to_string(),
        )
        .parse::<u64>()
        .context("CALL_POLL_TIMEOUT_SECS must be a whole number of seconds")?;
        let max_timeout = MAX_POLL_TIMEOUT.as_secs();
        if poll_timeout > max_timeout {
            bail!("CALL_POLL_TIMEOUT_SECS ({poll_timeout}) must not exceed {max_timeout}");
        }
        let poll_interval = optional(
            "CALL_POLL_INTERVAL_SECS",
            &DEFAULT_POLL_INTERVAL_SECS.to_string(),
        )
        .parse::<u64>()
        .context("CALL_POLL_INTERVAL_SECS must be a whole number of seconds")?;
        if poll_interval == 0 {
            bail!("CALL_POLL_INTERVAL_SECS must be greater than zero");
        }
        if poll_interval > poll_timeout {
            bail!(
                "CALL_POLL_INTERVAL_SECS ({poll_interval}) must not exceed \
                 CALL_POLL_TIMEOUT_SECS ({poll_timeout})"
            );
        }

        Ok(Config {
            twilio_account_sid: require("TWILIO_ACCOUNT_SID")?,
            twilio_auth_token: require("TWILIO_AUTH_TOKEN")?,
            twilio_from_number: require("TWILIO_FROM_NUMBER")?,
            twilio_api_base: optional("TWILIO_API_BASE", twilio::DEFAULT_API_BASE),
            voice_start_url,
            db_url: require("DB_URL")?,
            db_key: require("DB_KEY")?,
            groq_api_key: require("GROQ_API_KEY")?,
            llm_api_url: optional("LLM_API_URL", llm_client::DEFAULT_API_URL),
            llm_model: optional("LLM_MODEL", llm_client::DEFAULT_MODEL),
            poll_timeout: Duration::from_secs(poll_timeout),
            poll_interval: Duration::from_secs(poll_interval),
            port: optional("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: optional("RUST_LOG", "info"),
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("twilio_account_sid", &self.twilio_account_sid)
            .field("twilio_auth_token", &"<redacted>")
            .field("twilio_from_number", &self.twilio_from_number)
            .field("twilio_api_base", &self.twilio_api_base)
            .field("voice_start_url", &self.voice_start_url.as_str())
            .field("db_url", &self.db_url)
            .field("db_key", &"<redacted>")
            .field("groq_api_key", &"<redacted>")
            .field("llm_api_url", &self.llm_api_url)
            .field("llm_model", &self.llm_model)
            .field("poll_timeout", &self.poll_timeout)
            .field("poll_interval", &self.poll_interval)
            .field("port", &self.port)
            .field("rust_log", &self.rust_log)
            .finish()
    }
}
