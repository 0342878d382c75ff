mod analysis;
mod config;
mod errors;
mod llm_client;
mod models;
mod routes;
mod state;
mod store;
mod telephony;
#[cfg(test)]
mod testing;
mod workflow;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::{LlmLeadAnalyzer, PlaceholderTranscriber};
use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::RestLeadStore;
use crate::telephony::{CallPoller, TwilioClient};
use crate::workflow::LeadWorkflow;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Engagement API v{}", env!("CARGO_PKG_VERSION"));
    tracing::debug!("Configuration: {config:?}");

    let store = RestLeadStore::new(config.db_url.clone(), config.db_key.clone());
    info!("Record store client initialized ({})", config.db_url);

    let telephony = TwilioClient::new(
        config.twilio_api_base.clone(),
        config.twilio_account_sid.clone(),
        config.twilio_auth_token.clone(),
        config.twilio_from_number.clone(),
    );
    info!("Telephony client initialized (from {})", config.twilio_from_number);

    let llm = LlmClient::new(
        config.llm_api_url.clone(),
        config.groq_api_key.clone(),
        config.llm_model.clone(),
    );
    info!("LLM client initialized (model: {})", llm.model());

    let poller = CallPoller::new(config.poll_timeout, config.poll_interval);
    info!(
        "Call poller: timeout {}s, interval {}s",
        config.poll_timeout.as_secs(),
        config.poll_interval.as_secs()
    );

    let workflow = LeadWorkflow::new(
        Arc::new(store),
        Arc::new(telephony),
        Arc::new(PlaceholderTranscriber),
        Arc::new(LlmLeadAnalyzer(llm)),
        config.voice_start_url.clone(),
        poller,
    );

    let state = AppState { workflow };

    // Build router
    // TODO: restrict CORS to the dashboard origin once it is hosted
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
