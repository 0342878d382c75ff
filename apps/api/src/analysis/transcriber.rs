//! Speech-to-text seam. Only a placeholder exists: recordings are downloaded but not
//! actually transcribed.

use async_trait::async_trait;
use bytes::Bytes;

use crate::errors::AppError;

#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &Bytes) -> Result<String, AppError>;
}

/// Returns a fixed stand-in transcript that records how much audio was received.
pub struct PlaceholderTranscriber;

#[async_trait]
impl Transcriber for PlaceholderTranscriber {
    async fn transcribe(&self, audio: &Bytes) -> Result<String, AppError> {
        Ok(format!(
            "[placeholder transcript: speech-to-text is not configured; received {} bytes of call audio]",
            audio.len()
        ))
    }
}
