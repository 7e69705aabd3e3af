//! # Audio Services
//!
//! Everything between the HTTP handlers and the upstream APIs.
//!
//! ## Key Components:
//! - **asr**: Paraformer speech recognition client (plus the unimplemented Whisper path)
//! - **llm**: OpenAI-compatible chat client that polishes and summarizes transcripts
//! - **mock**: deterministic placeholder results
//! - **audio**: the orchestrator deciding between real clients and mock content
//! - **probes**: connectivity checks for the status endpoint
//!
//! The clients sit behind the [`Transcriber`] and [`Polisher`] traits so the orchestrator
//! can be exercised without network access.

pub mod asr;
pub mod audio;
pub mod llm;
pub mod mock;
pub mod probes;

pub use asr::{AudioFormat, ParaformerClient, TranscriptionError, WhisperApiClient};
pub use audio::AudioService;
pub use llm::{PolishClient, PolishError};
pub use mock::MockGenerator;
pub use probes::{ConnectivityProbes, ProbeResult};

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Speech-to-text provider.
///
/// The upload is handed over as [`Bytes`] so it reaches the HTTP body without a copy.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(
        &self,
        audio: Bytes,
        filename: &str,
    ) -> Result<String, TranscriptionError>;
}

/// Transcript cleanup provider.
#[async_trait]
pub trait Polisher: Send + Sync {
    async fn polish(&self, text: &str) -> Result<PolishedText, PolishError>;
}

/// Polished rewrite, summary and keywords of a transcript.
///
/// The field names match the JSON object the LLM is asked to return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolishedText {
    pub polished_text: String,
    pub summary: String,
    pub keywords: Vec<String>,
}

/// Result of the transcribe flow as returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscriptionOutcome {
    pub success: bool,
    pub transcript: String,
    pub error: Option<String>,
}

impl TranscriptionOutcome {
    pub fn success(transcript: String) -> Self {
        Self {
            success: true,
            transcript,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            transcript: String::new(),
            error: Some(error.into()),
        }
    }
}

/// Result of the polish flow as returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolishOutcome {
    pub success: bool,
    pub polished_text: String,
    pub summary: String,
    pub keywords: Vec<String>,
    pub error: Option<String>,
}

impl PolishOutcome {
    pub fn success(result: PolishedText) -> Self {
        Self {
            success: true,
            polished_text: result.polished_text,
            summary: result.summary,
            keywords: result.keywords,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            polished_text: String::new(),
            summary: String::new(),
            keywords: Vec::new(),
            error: Some(error.into()),
        }
    }
}
