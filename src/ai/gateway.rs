use std::sync::Arc;

use async_trait::async_trait;

use crate::config::AiConfig;
use crate::error::GatewayError;

/// Sampling settings sent with every completion request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationSettings {
    pub temperature: f32,
    pub max_tokens: u32,
}

/// A text-in/text-out generation service
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(
        &self,
        prompt: &str,
        settings: &GenerationSettings,
    ) -> Result<String, GatewayError>;
}

/// Builds summarization prompts and forwards them to a [`CompletionBackend`].
#[derive(Clone)]
pub struct SummaryGateway {
    backend: Arc<dyn CompletionBackend>,
    settings: GenerationSettings,
    max_input_chars: usize,
}

impl SummaryGateway {
    pub fn new(backend: Arc<dyn CompletionBackend>, config: &AiConfig) -> Self {
        Self {
            backend,
            settings: GenerationSettings {
                temperature: config.temperature,
                max_tokens: config.max_tokens,
            },
            max_input_chars: config.max_input_chars,
        }
    }

    /// Summarize `text` under `prompt_header`.
    ///
    /// Only the first `max_input_chars` characters of `text` are sent.
    pub async fn summarize(&self, text: &str, prompt_header: &str) -> Result<String, GatewayError> {
        let prompt = build_prompt(text, prompt_header, self.max_input_chars);

        tracing::debug!(
            input_chars = text.chars().count(),
            prompt_len = prompt.len(),
            "Requesting summary"
        );

        let summary = self.backend.complete(&prompt, &self.settings).await?;
        Ok(summary.trim().to_string())
    }
}

fn build_prompt(text: &str, prompt_header: &str, max_input_chars: usize) -> String {
    let truncated = match text.char_indices().nth(max_input_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    };
    format!("{prompt_header}\n\n{truncated}")
}
