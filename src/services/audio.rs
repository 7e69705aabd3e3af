//! # Audio Processing Orchestrator
//!
//! Decides per request whether the real upstream client or the mock generator answers.
//!
//! ## Transcribe / Polish flow:
//! 1. Mock mode enabled → mock result, no upstream call
//! 2. Credential present → real client; its success is returned as-is
//! 3. Real client failed or no credential → the failure is logged and the mock result
//!    is returned (or, with `mock.fallback = false`, the failure itself)
//!
//! The mock result is always a success, so with the default configuration neither flow
//! ever reports `success = false`.

use crate::config::AppConfig;
use crate::services::{
    MockGenerator, ParaformerClient, PolishClient, PolishOutcome, Polisher, Transcriber,
    TranscriptionOutcome,
};
use bytes::Bytes;
use std::sync::Arc;

pub struct AudioService {
    mock_mode: bool,
    fallback: bool,
    mock: MockGenerator,
    transcriber: Option<Arc<dyn Transcriber>>,
    polisher: Option<Arc<dyn Polisher>>,
}

impl AudioService {
    pub fn new(
        mock_mode: bool,
        fallback: bool,
        mock: MockGenerator,
        transcriber: Option<Arc<dyn Transcriber>>,
        polisher: Option<Arc<dyn Polisher>>,
    ) -> Self {
        Self {
            mock_mode,
            fallback,
            mock,
            transcriber,
            polisher,
        }
    }

    /// Wire the real clients for whichever credentials are configured.
    pub fn from_config(config: &AppConfig) -> Self {
        let transcriber = ParaformerClient::from_config(config)
            .map(|client| Arc::new(client) as Arc<dyn Transcriber>);

        // Either key enables the polish path; a key for the wrong provider surfaces as a
        // "not configured" failure from the client and falls back like any other error.
        let polisher = config
            .has_llm_credential()
            .then(|| Arc::new(PolishClient::from_config(config)) as Arc<dyn Polisher>);

        Self::new(
            config.mock.enabled,
            config.mock.fallback,
            MockGenerator::from_config(&config.mock),
            transcriber,
            polisher,
        )
    }

    pub fn mock_mode(&self) -> bool {
        self.mock_mode
    }

    pub async fn transcribe(&self, audio: Bytes, filename: &str) -> TranscriptionOutcome {
        if self.mock_mode {
            return TranscriptionOutcome::success(self.mock.transcribe(filename).await);
        }

        let failure = match &self.transcriber {
            Some(transcriber) => match transcriber.transcribe(audio, filename).await {
                Ok(transcript) => return TranscriptionOutcome::success(transcript),
                Err(e) => {
                    tracing::warn!(error = %e, filename = %filename, "ASR request failed");
                    e.to_string()
                }
            },
            None => "DashScope API key not configured".to_string(),
        };

        if !self.fallback {
            return TranscriptionOutcome::failure(failure);
        }

        tracing::info!(reason = %failure, "Falling back to mock transcription");
        TranscriptionOutcome::success(self.mock.transcribe(filename).await)
    }

    pub async fn polish(&self, text: &str) -> PolishOutcome {
        if self.mock_mode {
            return PolishOutcome::success(self.mock.polish(text).await);
        }

        let failure = match &self.polisher {
            Some(polisher) => match polisher.polish(text).await {
                Ok(result) => return PolishOutcome::success(result),
                Err(e) => {
                    tracing::warn!(error = %e, "LLM request failed");
                    e.to_string()
                }
            },
            None => "No LLM API key configured".to_string(),
        };

        if !self.fallback {
            return PolishOutcome::failure(failure);
        }

        tracing::info!(reason = %failure, "Falling back to mock polish");
        PolishOutcome::success(self.mock.polish(text).await)
    }
}
