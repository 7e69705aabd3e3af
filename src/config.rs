//! # Configuration Management
//!
//! Loads the process-wide service configuration once at startup from several sources:
//! - Built-in defaults (the `Default` impl below)
//! - An optional `config.toml` next to the binary
//! - Environment variables with the `APP_` prefix (`APP_SERVER__PORT=3002`)
//! - The well-known flat variables used in `.env` files (`DASHSCOPE_API_KEY`, `USE_MOCK`, ...)
//!
//! ## Configuration Priority (highest to lowest):
//! 1. Flat variables (`HOST`, `PORT`, `LLM_PROVIDER`, ...)
//! 2. `APP_` prefixed variables
//! 3. Configuration file (config.toml)
//! 4. Default values
//!
//! The resulting [`AppConfig`] is immutable for the lifetime of the process. It is wrapped in
//! an `Arc` and handed to each component when it is constructed.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;

/// Main application configuration.
///
/// ## Sections:
/// - `server`: bind address, debug flag and CORS origins
/// - `dashscope`: the Aliyun DashScope credential shared by ASR and the Qwen LLM profile
/// - `asr`: Paraformer speech recognition settings
/// - `llm`: provider selector and per-provider settings for polishing
/// - `mock`: mock mode and fallback behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub dashscope: DashScopeConfig,
    pub asr: AsrConfig,
    pub llm: LlmConfig,
    pub mock: MockConfig,
}

/// Server-specific configuration settings.
///
/// ## Fields:
/// - `host`: IP address to bind to (`0.0.0.0` accepts connections from anywhere)
/// - `port`: TCP port to listen on
/// - `debug`: verbose logging and the docs hint on `GET /`
/// - `cors_origins`: comma-separated list of allowed browser origins (`*` allows any)
/// - `max_upload_bytes`: largest audio upload accepted by `POST /api/transcribe`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub debug: bool,
    pub cors_origins: String,
    pub max_upload_bytes: usize,
}

/// DashScope account settings.
///
/// The same API key authorizes both the Paraformer transcription endpoint and the
/// OpenAI-compatible Qwen chat endpoint, so it lives in its own section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashScopeConfig {
    pub api_key: String,
    pub base_url: String,
}

/// Speech recognition settings.
///
/// `access_key_id`, `access_key_secret` and `app_key` are the Aliyun NLS credential triple.
/// They are accepted so existing `.env` files keep loading; requests are authorized with
/// the DashScope API key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AsrConfig {
    pub access_key_id: String,
    pub access_key_secret: String,
    pub app_key: String,
    pub model: String,
    pub language: String,
    pub timeout_secs: u64,
}

/// LLM polishing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// One of `dashscope`, `deepseek` or `openai` (case-insensitive)
    pub provider: String,
    pub dashscope_model: String,
    pub deepseek_api_key: String,
    pub deepseek_base_url: String,
    pub deepseek_model: String,
    pub timeout_secs: u64,
}

/// Mock mode settings.
///
/// - `enabled`: bypass every real service and always answer with placeholder content
/// - `fallback`: answer with placeholder content when a real service is missing or fails;
///   when `false` the failure is reported to the caller instead
/// - `transcribe_delay_ms` / `polish_delay_ms`: simulated latency of the placeholder results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockConfig {
    pub enabled: bool,
    pub fallback: bool,
    pub transcribe_delay_ms: u64,
    pub polish_delay_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3001,
                debug: true,
                cors_origins: "http://localhost:3000".to_string(),
                max_upload_bytes: 50 * 1024 * 1024,
            },
            dashscope: DashScopeConfig {
                api_key: String::new(),
                base_url: "https://dashscope.aliyuncs.com".to_string(),
            },
            asr: AsrConfig {
                access_key_id: String::new(),
                access_key_secret: String::new(),
                app_key: String::new(),
                model: "paraformer-v2".to_string(),
                language: "zh".to_string(),
                timeout_secs: 120, // real transcription of long recordings is slow
            },
            llm: LlmConfig {
                provider: "dashscope".to_string(),
                dashscope_model: "qwen-max".to_string(),
                deepseek_api_key: String::new(),
                deepseek_base_url: "https://api.deepseek.com/v1".to_string(),
                deepseek_model: "deepseek-chat".to_string(),
                timeout_secs: 60,
            },
            mock: MockConfig {
                enabled: true,
                fallback: true,
                transcribe_delay_ms: 2000,
                polish_delay_ms: 1500,
            },
        }
    }
}

/// Flat environment variables and the config keys they override.
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("HOST", "server.host"),
    ("PORT", "server.port"),
    ("DEBUG", "server.debug"),
    ("CORS_ORIGINS", "server.cors_origins"),
    ("MAX_UPLOAD_BYTES", "server.max_upload_bytes"),
    ("DASHSCOPE_API_KEY", "dashscope.api_key"),
    ("ALIYUN_ACCESS_KEY_ID", "asr.access_key_id"),
    ("ALIYUN_ACCESS_KEY_SECRET", "asr.access_key_secret"),
    ("ALIYUN_APP_KEY", "asr.app_key"),
    ("LLM_PROVIDER", "llm.provider"),
    ("DEEPSEEK_API_KEY", "llm.deepseek_api_key"),
    ("DEEPSEEK_BASE_URL", "llm.deepseek_base_url"),
    ("USE_MOCK", "mock.enabled"),
    ("MOCK_FALLBACK", "mock.fallback"),
];

impl AppConfig {
    /// Load configuration from all sources in priority order.
    ///
    /// ## Environment Variable Examples:
    /// - `DASHSCOPE_API_KEY=sk-...`: enable Paraformer and the Qwen profile
    /// - `LLM_PROVIDER=deepseek`: polish with DeepSeek instead of Qwen
    /// - `USE_MOCK=false`: try the real services
    /// - `APP_ASR__TIMEOUT_SECS=300`: any nested key through the `APP_` prefix
    pub fn load() -> Result<Self> {
        let mut settings = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(config::File::with_name("config").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__"),
            );

        for (var, key) in ENV_OVERRIDES {
            if let Ok(value) = env::var(var) {
                settings = settings.set_override(*key, value)?;
            }
        }

        let config = settings.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Validate that the configuration values make sense.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(anyhow::anyhow!("Server port cannot be 0"));
        }

        if self.server.max_upload_bytes == 0 {
            return Err(anyhow::anyhow!("Maximum upload size cannot be 0"));
        }

        self.llm.provider.parse::<LlmProvider>()?;

        if self.asr.timeout_secs == 0 || self.llm.timeout_secs == 0 {
            return Err(anyhow::anyhow!("Upstream timeouts must be greater than 0"));
        }

        Ok(())
    }

    /// Split the comma-separated CORS setting into individual origins.
    pub fn cors_origins_list(&self) -> Vec<String> {
        self.server
            .cors_origins
            .split(',')
            .map(|origin| origin.trim())
            .filter(|origin| !origin.is_empty())
            .map(String::from)
            .collect()
    }

    /// Whether the DashScope credential is present.
    ///
    /// This is the speech recognition credential as well as the Qwen LLM credential.
    pub fn has_asr_credential(&self) -> bool {
        !self.dashscope.api_key.trim().is_empty()
    }

    /// Whether either supported LLM provider has a credential configured.
    pub fn has_llm_credential(&self) -> bool {
        self.has_asr_credential() || !self.llm.deepseek_api_key.trim().is_empty()
    }

    /// The selected LLM provider.
    ///
    /// Unknown names are rejected by [`AppConfig::validate`], so this falls back to
    /// DashScope only for configs that skipped validation.
    pub fn llm_provider(&self) -> LlmProvider {
        self.llm.provider.parse().unwrap_or(LlmProvider::DashScope)
    }

    /// Resolve the endpoint profile for the selected provider.
    ///
    /// Returns `None` when the provider's credential is absent or the provider has no
    /// wired profile (`openai`).
    pub fn llm_profile(&self) -> Option<LlmProfile> {
        match self.llm_provider() {
            LlmProvider::DashScope if self.has_asr_credential() => Some(LlmProfile {
                api_key: self.dashscope.api_key.clone(),
                base_url: format!(
                    "{}/compatible-mode/v1",
                    self.dashscope.base_url.trim_end_matches('/')
                ),
                model: self.llm.dashscope_model.clone(),
            }),
            LlmProvider::DeepSeek if !self.llm.deepseek_api_key.trim().is_empty() => {
                Some(LlmProfile {
                    api_key: self.llm.deepseek_api_key.clone(),
                    base_url: self.llm.deepseek_base_url.trim_end_matches('/').to_string(),
                    model: self.llm.deepseek_model.clone(),
                })
            }
            _ => None,
        }
    }
}

/// The closed set of LLM providers the service knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    DashScope,
    DeepSeek,
    /// Accepted by the selector but without an endpoint profile.
    OpenAi,
}

impl LlmProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmProvider::DashScope => "dashscope",
            LlmProvider::DeepSeek => "deepseek",
            LlmProvider::OpenAi => "openai",
        }
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LlmProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "dashscope" => Ok(LlmProvider::DashScope),
            "deepseek" => Ok(LlmProvider::DeepSeek),
            "openai" => Ok(LlmProvider::OpenAi),
            other => Err(anyhow::anyhow!(
                "Unknown LLM provider '{}'. Expected dashscope, deepseek or openai",
                other
            )),
        }
    }
}

/// Credential, endpoint and model of one OpenAI-compatible chat API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmProfile {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}
