//! Connectivity checks behind `GET /api/config`. Not used on the request-serving path.

use crate::config::AppConfig;
use crate::services::{PolishClient, PolishError};
use reqwest::StatusCode;
use std::time::Duration;

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Statuses that prove the ASR endpoint exists even though a bare GET is not a valid call.
const REACHABLE_STATUSES: [StatusCode; 3] = [
    StatusCode::OK,
    StatusCode::BAD_REQUEST,
    StatusCode::METHOD_NOT_ALLOWED,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub reachable: bool,
    pub message: String,
}

impl ProbeResult {
    fn reachable(message: impl Into<String>) -> Self {
        Self {
            reachable: true,
            message: message.into(),
        }
    }

    fn unreachable(message: impl Into<String>) -> Self {
        Self {
            reachable: false,
            message: message.into(),
        }
    }

    /// Status label shown by the config endpoint.
    pub fn status(&self) -> &'static str {
        if self.reachable {
            "connected"
        } else {
            "not configured"
        }
    }
}

pub struct ConnectivityProbes {
    client: reqwest::Client,
    asr_api_key: Option<String>,
    asr_url: String,
    llm: PolishClient,
}

impl ConnectivityProbes {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            asr_api_key: config
                .has_asr_credential()
                .then(|| config.dashscope.api_key.clone()),
            asr_url: format!(
                "{}/api/v1/services/audio/asr/transcription",
                config.dashscope.base_url.trim_end_matches('/')
            ),
            llm: PolishClient::from_config(config),
        }
    }

    pub async fn check_asr(&self) -> ProbeResult {
        let Some(api_key) = &self.asr_api_key else {
            return ProbeResult::unreachable(
                "DashScope API key not configured. Set DASHSCOPE_API_KEY in .env",
            );
        };

        let response = self
            .client
            .get(&self.asr_url)
            .bearer_auth(api_key)
            .timeout(PROBE_TIMEOUT)
            .send()
            .await;

        match response {
            Ok(response) if REACHABLE_STATUSES.contains(&response.status()) => {
                ProbeResult::reachable("DashScope ASR API reachable")
            }
            Ok(response) => ProbeResult::unreachable(format!(
                "API returned status {}",
                response.status().as_u16()
            )),
            Err(e) => ProbeResult::unreachable(e.to_string()),
        }
    }

    pub async fn check_llm(&self) -> ProbeResult {
        match self.llm.ping().await {
            Ok(message) => ProbeResult::reachable(message),
            Err(PolishError::NotConfigured(provider)) => ProbeResult::unreachable(format!(
                "LLM not configured. Set {}_API_KEY in .env",
                provider.as_str().to_uppercase()
            )),
            Err(e) => ProbeResult::unreachable(e.to_string()),
        }
    }

    /// Run both probes concurrently: `(llm, asr)`.
    pub async fn check_all(&self) -> (ProbeResult, ProbeResult) {
        tokio::join!(self.check_llm(), self.check_asr())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> AppConfig {
        let mut config = AppConfig::default();
        config.dashscope.api_key = "sk-test".to_string();
        config.dashscope.base_url = server.uri();
        config
    }

    #[tokio::test]
    async fn test_missing_credentials_short_circuit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut config = AppConfig::default();
        config.dashscope.base_url = server.uri();
        config.llm.provider = "deepseek".to_string();
        let probes = ConnectivityProbes::from_config(&config);

        let (llm, asr) = probes.check_all().await;
        assert_eq!(asr.status(), "not configured");
        assert!(asr.message.contains("DASHSCOPE_API_KEY"));
        assert!(!llm.reachable);
        assert_eq!(llm.message, "LLM not configured. Set DEEPSEEK_API_KEY in .env");
    }

    #[tokio::test]
    async fn test_method_not_allowed_counts_as_reachable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/services/audio/asr/transcription"))
            .respond_with(ResponseTemplate::new(405))
            .mount(&server)
            .await;

        let probes = ConnectivityProbes::from_config(&config_for(&server));
        let result = probes.check_asr().await;
        assert!(result.reachable);
        assert_eq!(result.status(), "connected");
    }

    #[tokio::test]
    async fn test_server_error_is_unreachable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let probes = ConnectivityProbes::from_config(&config_for(&server));
        let result = probes.check_asr().await;
        assert!(!result.reachable);
        assert_eq!(result.message, "API returned status 503");
    }

    #[tokio::test]
    async fn test_llm_probe_uses_selected_profile() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/compatible-mode/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "content": "Hi" } }]
            })))
            .mount(&server)
            .await;

        let probes = ConnectivityProbes::from_config(&config_for(&server));
        let result = probes.check_llm().await;
        assert!(result.reachable);
        assert_eq!(result.message, "Connected to dashscope (qwen-max)");
    }
}
