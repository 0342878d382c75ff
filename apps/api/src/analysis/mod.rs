// Transcript analysis: speech-to-text (placeholder) and the two model prompts used to
// qualify a lead. All model calls go through llm_client.

pub mod analyzer;
pub mod models;
pub mod prompts;
pub mod transcriber;

pub use analyzer::{AnalysisError, LeadAnalyzer, LlmLeadAnalyzer, NextTurn};
pub use transcriber::{PlaceholderTranscriber, Transcriber};
