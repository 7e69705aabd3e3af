//! Deterministic placeholder results used in mock mode and as the last-resort fallback.

use crate::config::MockConfig;
use crate::services::PolishedText;
use std::time::Duration;

/// Number of input characters echoed back in the mock polish result.
const PREVIEW_CHARS: usize = 100;

/// Produces fixed template content after an artificial delay, so the frontend sees
/// realistic latency without any upstream service.
#[derive(Debug, Clone)]
pub struct MockGenerator {
    transcribe_delay: Duration,
    polish_delay: Duration,
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new(Duration::from_millis(2000), Duration::from_millis(1500))
    }
}

impl MockGenerator {
    pub fn new(transcribe_delay: Duration, polish_delay: Duration) -> Self {
        Self {
            transcribe_delay,
            polish_delay,
        }
    }

    pub fn from_config(config: &MockConfig) -> Self {
        Self::new(
            Duration::from_millis(config.transcribe_delay_ms),
            Duration::from_millis(config.polish_delay_ms),
        )
    }

    /// Placeholder transcript mentioning the uploaded file name.
    pub async fn transcribe(&self, filename: &str) -> String {
        tokio::time::sleep(self.transcribe_delay).await;
        tracing::debug!(filename = %filename, "Returning mock transcript");

        format!(
            "这是文件 \"{filename}\" 的转写结果。\n\n\
             在这个架构中，音频流被发送到了后端服务，并转发给了阿里云 Paraformer 语音识别服务。\n\
             阿里云的中文识别准确率非常高，特别是在处理中文长语音和方言方面。\n\
             这段文字代表了原始的、未经润色的语音识别输出，可能包含一些语气词，比如那个，呃，然后之类的。\n\
             后端服务目前运行在 Mock 模式，请配置 DASHSCOPE_API_KEY 以启用真实的语音识别功能。"
        )
    }

    /// Placeholder polish result that echoes a preview of the input.
    pub async fn polish(&self, text: &str) -> PolishedText {
        tokio::time::sleep(self.polish_delay).await;
        let preview = preview(text, PREVIEW_CHARS);
        tracing::debug!(preview_chars = preview.chars().count(), "Returning mock polish result");

        PolishedText {
            polished_text: format!(
                "这是经过 AI 模型润色后的结果。\n\n\
                 原始转写文本已被发送到后端，然后调用通义千问或 DeepSeek 的 API 进行处理。\n\
                 这种方式不仅成本低廉，而且由于数据中心位于国内，响应速度极快。\n\n\
                 模型已删除了原始文本中的语气词（如\"那个\"、\"呃\"），并优化了句子结构，使其更符合书面语规范。\n\n\
                 [Mock 模式] 原文预览: {preview}"
            ),
            summary: "本音频主要演示了 Sonote 的后端架构流程：前端上传音频至后端服务，\
                      后端集成阿里云 ASR 进行转写，随后使用 LLM 模型进行文本润色。\
                      该方案在成本控制和访问速度上具有显著优势。[Mock 模式]"
                .to_string(),
            keywords: ["音频转录", "语音识别", "文本润色", "AI处理", "Mock模式"]
                .iter()
                .map(|k| k.to_string())
                .collect(),
        }
    }
}

/// First `max_chars` characters of `text`, with `...` appended when something was cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[test]
    fn test_preview_short_text_is_untouched() {
        assert_eq!(preview("hello", 100), "hello");
        assert_eq!(preview("", 100), "");
    }

    #[test]
    fn test_preview_truncates_by_characters() {
        let text = "语".repeat(101);
        let result = preview(&text, 100);
        assert!(result.ends_with("..."));
        assert_eq!(result.chars().count(), 103);

        let exact = "a".repeat(100);
        assert_eq!(preview(&exact, 100), exact);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transcribe_waits_and_mentions_filename() {
        let mock = MockGenerator::default();
        let start = Instant::now();

        let transcript = mock.transcribe("sample.m4a").await;

        assert!(start.elapsed() >= Duration::from_millis(2000));
        assert!(transcript.contains("\"sample.m4a\""));
    }

    #[tokio::test(start_paused = true)]
    async fn test_polish_is_deterministic() {
        let mock = MockGenerator::default();
        let start = Instant::now();

        let first = mock.polish("那个，呃，今天开会").await;
        let second = mock.polish("那个，呃，今天开会").await;

        assert!(start.elapsed() >= Duration::from_millis(3000));
        assert_eq!(first, second);
        assert!(first.polished_text.ends_with("原文预览: 那个，呃，今天开会"));
        assert_eq!(first.keywords.len(), 5);
    }

    #[tokio::test]
    async fn test_polish_empty_text_has_empty_preview() {
        let mock = MockGenerator::new(Duration::ZERO, Duration::ZERO);
        let result = mock.polish("").await;
        assert!(result.polished_text.ends_with("[Mock 模式] 原文预览: "));
        assert!(!result.summary.is_empty());
    }
}
