//! # Speech Recognition Client
//!
//! Wraps a single call to the DashScope Paraformer transcription endpoint
//! (`/compatible-mode/v1/audio/transcriptions`, OpenAI-compatible multipart upload).
//!
//! ## Outcome classification:
//! - 2xx with text → transcript
//! - 2xx without text → [`TranscriptionError::EmptyResult`]
//! - non-2xx → [`TranscriptionError::Api`] with status code and body
//! - timeout → [`TranscriptionError::Timeout`]
//! - any other transport or decoding failure → [`TranscriptionError::Request`]

use crate::config::AppConfig;
use crate::services::Transcriber;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum TranscriptionError {
    #[error("Audio content is empty")]
    EmptyAudio,
    #[error("Empty transcription result")]
    EmptyResult,
    #[error("ASR API error ({status}): {body}")]
    Api { status: u16, body: String },
    #[error("ASR request timeout")]
    Timeout,
    #[error("ASR error: {0}")]
    Request(String),
    #[error("{0} not implemented")]
    NotImplemented(&'static str),
}

impl From<reqwest::Error> for TranscriptionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TranscriptionError::Timeout
        } else {
            TranscriptionError::Request(err.to_string())
        }
    }
}

/// Audio container hint sent along with the upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Mp3,
    Wav,
    /// `.m4a` and `.mp4` are both uploaded as MP4 audio.
    Mp4,
    Flac,
    Ogg,
}

impl AudioFormat {
    /// Used when the filename has no recognised extension.
    pub const DEFAULT: AudioFormat = AudioFormat::Mp3;

    /// Resolve the format from the extension after the last `.`.
    pub fn from_filename(filename: &str) -> Self {
        let Some((_, ext)) = filename.rsplit_once('.') else {
            return Self::DEFAULT;
        };

        match ext.to_lowercase().as_str() {
            "mp3" => AudioFormat::Mp3,
            "wav" => AudioFormat::Wav,
            "m4a" | "mp4" => AudioFormat::Mp4,
            "flac" => AudioFormat::Flac,
            "ogg" => AudioFormat::Ogg,
            _ => Self::DEFAULT,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Wav => "wav",
            AudioFormat::Mp4 => "mp4",
            AudioFormat::Flac => "flac",
            AudioFormat::Ogg => "ogg",
        }
    }

    pub fn mime_type(&self) -> String {
        format!("audio/{}", self.as_str())
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    text: String,
}

/// Client for the Paraformer file transcription API.
pub struct ParaformerClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    language: String,
    timeout: Duration,
}

impl ParaformerClient {
    pub fn new(
        api_key: String,
        base_url: String,
        model: String,
        language: String,
        timeout: Duration,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            language,
            timeout,
        }
    }

    /// Build the client when the DashScope credential is configured.
    pub fn from_config(config: &AppConfig) -> Option<Self> {
        if !config.has_asr_credential() {
            return None;
        }

        Some(Self::new(
            config.dashscope.api_key.clone(),
            config.dashscope.base_url.clone(),
            config.asr.model.clone(),
            config.asr.language.clone(),
            Duration::from_secs(config.asr.timeout_secs),
        ))
    }

    fn endpoint(&self) -> String {
        format!("{}/compatible-mode/v1/audio/transcriptions", self.base_url)
    }
}

#[async_trait]
impl Transcriber for ParaformerClient {
    async fn transcribe(
        &self,
        audio: Bytes,
        filename: &str,
    ) -> Result<String, TranscriptionError> {
        if audio.is_empty() {
            return Err(TranscriptionError::EmptyAudio);
        }

        let format = AudioFormat::from_filename(filename);
        let size = audio.len();
        let file_part = multipart::Part::stream_with_length(audio, size as u64)
            .file_name(filename.to_string())
            .mime_str(&format.mime_type())?;

        let form = multipart::Form::new()
            .part("file", file_part)
            .text("model", self.model.clone())
            .text("language", self.language.clone());

        tracing::debug!(
            model = %self.model,
            format = %format,
            bytes = size,
            "Sending audio to Paraformer"
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .multipart(form)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(TranscriptionError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let result: TranscriptionResponse = response.json().await?;
        if result.text.is_empty() {
            return Err(TranscriptionError::EmptyResult);
        }

        tracing::info!(chars = result.text.chars().count(), "Paraformer transcription completed");
        Ok(result.text)
    }
}

/// Secondary transcription path through the OpenAI Whisper API.
///
/// Declared so the provider set is complete, but there is no implementation behind it:
/// every call fails with [`TranscriptionError::NotImplemented`].
#[derive(Debug, Default)]
pub struct WhisperApiClient;

#[async_trait]
impl Transcriber for WhisperApiClient {
    async fn transcribe(
        &self,
        _audio: Bytes,
        _filename: &str,
    ) -> Result<String, TranscriptionError> {
        Err(TranscriptionError::NotImplemented("Whisper API"))
    }
}
