//! # Polishing Client
//!
//! Sends a transcript to an OpenAI-compatible chat completion endpoint (DashScope Qwen or
//! DeepSeek) and turns the reply into a polished text, a summary and a keyword list.
//!
//! ## Tolerant reply parsing:
//! Models like to wrap the requested JSON in a fenced code block or to answer in prose.
//! [`parse_polish_reply`] extracts the fenced payload when there is one and, when the
//! payload still is not the expected object, degrades to returning the whole reply as the
//! polished text. A reply we cannot parse is not a service failure.

use crate::config::{AppConfig, LlmProfile, LlmProvider};
use crate::services::{PolishedText, Polisher};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Input beyond this many characters is silently dropped before prompting.
pub const MAX_INPUT_CHARS: usize = 10_000;

/// Summary used when the reply could not be parsed.
pub const SUMMARY_PLACEHOLDER: &str = "无法自动生成摘要";

const SYSTEM_PROMPT: &str = "你是一位专业的文字编辑，擅长整理和润色文本。请始终以JSON格式返回结果。";

#[derive(Debug, thiserror::Error)]
pub enum PolishError {
    #[error("LLM not configured. Provider: {0}")]
    NotConfigured(LlmProvider),
    #[error("API returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("{0}")]
    Request(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for PolishError {
    fn from(err: reqwest::Error) -> Self {
        PolishError::Request(err.to_string())
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Chat client bound to the provider selected in the configuration.
pub struct PolishClient {
    client: reqwest::Client,
    provider: LlmProvider,
    profile: Option<LlmProfile>,
    timeout: Duration,
}

impl PolishClient {
    pub fn new(provider: LlmProvider, profile: Option<LlmProfile>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            provider,
            profile,
            timeout,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.llm_provider(),
            config.llm_profile(),
            Duration::from_secs(config.llm.timeout_secs),
        )
    }

    pub fn provider(&self) -> LlmProvider {
        self.provider
    }

    fn profile(&self) -> Result<&LlmProfile, PolishError> {
        self.profile
            .as_ref()
            .ok_or(PolishError::NotConfigured(self.provider))
    }

    /// Send one chat completion and return the text of the first choice.
    async fn chat(
        &self,
        messages: Vec<ChatMessage<'_>>,
        temperature: Option<f32>,
        max_tokens: u32,
    ) -> Result<String, PolishError> {
        let profile = self.profile()?;
        let request = ChatCompletionRequest {
            model: &profile.model,
            messages,
            temperature,
            max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", profile.base_url))
            .bearer_auth(&profile.api_key)
            .json(&request)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(PolishError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatCompletionResponse = response.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| PolishError::InvalidResponse("no choices in completion".to_string()))
    }

    /// Minimal round trip used by the connectivity probe.
    pub async fn ping(&self) -> Result<String, PolishError> {
        let profile = self.profile()?;
        self.chat(
            vec![ChatMessage {
                role: "user",
                content: "Hello",
            }],
            None,
            10,
        )
        .await?;
        Ok(format!("Connected to {} ({})", self.provider, profile.model))
    }
}

#[async_trait]
impl Polisher for PolishClient {
    async fn polish(&self, text: &str) -> Result<PolishedText, PolishError> {
        let prompt = build_prompt(text);
        tracing::debug!(
            provider = %self.provider,
            prompt_chars = prompt.chars().count(),
            "Requesting polish from LLM"
        );

        let reply = self
            .chat(
                vec![
                    ChatMessage {
                        role: "system",
                        content: SYSTEM_PROMPT,
                    },
                    ChatMessage {
                        role: "user",
                        content: &prompt,
                    },
                ],
                Some(0.3),
                4096,
            )
            .await?;

        Ok(parse_polish_reply(&reply))
    }
}

/// Build the user prompt, keeping at most [`MAX_INPUT_CHARS`] characters of the transcript.
pub fn build_prompt(text: &str) -> String {
    let text: String = text.chars().take(MAX_INPUT_CHARS).collect();

    format!(
        "你是一位专业的文字编辑和内容整理专家。请对以下语音转录文本进行处理：\n\n\
         【原始转录文本】\n\
         {text}\n\n\
         请完成以下任务：\n\
         1. **润色文本**：删除语气词（如\"那个\"、\"呃\"、\"嗯\"等），修正语法错误，优化句子结构，使其符合书面语规范，但保留原意。\n\
         2. **生成摘要**：用3-5句话概括文本的核心内容。\n\
         3. **提取关键词**：提取5-8个最相关的关键词或短语。\n\n\
         请严格按照以下JSON格式返回结果（不要添加任何其他内容）：\n\
         {{\n  \"polishedText\": \"润色后的完整文本\",\n  \"summary\": \"内容摘要\",\n  \"keywords\": [\"关键词1\", \"关键词2\", \"关键词3\"]\n}}\n"
    )
}

/// Pick the JSON payload out of a model reply.
///
/// A ```` ```json ```` block wins; otherwise the first fenced block; otherwise the reply
/// itself. An unterminated fence extends to the end of the reply.
pub fn extract_json_block(reply: &str) -> &str {
    if let Some((_, rest)) = reply.split_once("```json") {
        rest.split("```").next().unwrap_or(rest)
    } else if reply.contains("```") {
        reply.split("```").nth(1).unwrap_or_default()
    } else {
        reply
    }
}

/// Parse a model reply into a [`PolishedText`], degrading instead of failing.
///
/// Only a JSON object carrying all three keys counts; arrays and other values degrade.
pub fn parse_polish_reply(reply: &str) -> PolishedText {
    let parsed = serde_json::from_str::<serde_json::Value>(extract_json_block(reply).trim())
        .and_then(|value| {
            if value.is_object() {
                serde_json::from_value::<PolishedText>(value)
            } else {
                Err(<serde_json::Error as serde::de::Error>::custom(format!(
                    "expected a JSON object, got {}",
                    json_kind(&value)
                )))
            }
        });

    match parsed {
        Ok(result) => result,
        Err(e) => {
            tracing::warn!(error = %e, "LLM reply is not the expected JSON, returning it unparsed");
            PolishedText {
                polished_text: reply.to_string(),
                summary: SUMMARY_PLACEHOLDER.to_string(),
                keywords: Vec::new(),
            }
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
