//! Title inference via a chat-completion service.
//!
//! Defines the [`TitleModel`] trait and concrete implementations:
//! - **[`DisabledModel`]** — returns errors; used when inference is not configured.
//! - **[`OpenAiTitleModel`]** — calls an OpenAI-compatible chat-completions
//!   endpoint with a fixed instruction prompt, retry, and backoff.
//!
//! # Retry Strategy
//!
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors and timeouts → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)
//!
//! Exhausting the retries surfaces an error to the processor, which treats
//! it as a per-document failure.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::time::Duration;

use crate::config::InferenceConfig;

const SYSTEM_PROMPT: &str = "You are an assistant that extracts specific information from documents.";

/// Proposes a title for a document's extracted text.
///
/// The extracted text may be OCR-noisy or empty — an empty input still
/// produces a prompt and a model call; what the model does with it is the
/// model's business. Tests substitute fakes for this trait.
pub trait TitleModel: Send + Sync {
    fn infer_title(&self, text: &str) -> Result<String>;
}

// ============ Disabled Model ============

/// A no-op title model that always returns errors.
///
/// Used when `inference.provider = "disabled"` in the configuration, so the
/// rest of the tool (`check`, scanning, extraction) works without credentials.
pub struct DisabledModel;

impl TitleModel for DisabledModel {
    fn infer_title(&self, _text: &str) -> Result<String> {
        bail!("Inference provider is disabled")
    }
}

// ============ OpenAI Model ============

/// Title model backed by an OpenAI-compatible `POST /chat/completions`
/// endpoint. The API key is read from the environment variable named by
/// `inference.api_key_env` at construction time.
#[derive(Debug)]
pub struct OpenAiTitleModel {
    client: reqwest::blocking::Client,
    api_key: String,
    model: String,
    base_url: String,
    max_retries: u32,
}

impl OpenAiTitleModel {
    /// Create a new model from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key environment variable is not set or
    /// the HTTP client cannot be built.
    pub fn new(config: &InferenceConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| anyhow::anyhow!("{} environment variable not set", config.api_key_env))?;

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key,
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_retries: config.max_retries,
        })
    }

    fn request_completion(&self, prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": prompt },
            ],
        });

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s, 8s, ...
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                std::thread::sleep(delay);
            }

            let resp = self
                .client
                .post(format!("{}/chat/completions", self.base_url))
                .header("Authorization", format!("Bearer {}", self.api_key))
                .header("Content-Type", "application/json")
                .json(&body)
                .send();

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let parsed: CompletionResponse =
                            response.json().context("Invalid completion response")?;
                        let content = parsed
                            .choices
                            .into_iter()
                            .next()
                            .map(|c| c.message.content)
                            .ok_or_else(|| {
                                anyhow::anyhow!("Completion response has no choices")
                            })?;
                        return Ok(content.trim().to_string());
                    }

                    // Rate limited or server error — retry
                    if status.as_u16() == 429 || status.is_server_error() {
                        let body_text = response.text().unwrap_or_default();
                        last_err = Some(anyhow::anyhow!(
                            "Completion API error {}: {}",
                            status,
                            body_text
                        ));
                        continue;
                    }

                    // Client error (not 429) — don't retry
                    let body_text = response.text().unwrap_or_default();
                    bail!("Completion API error {}: {}", status, body_text);
                }
                Err(e) => {
                    last_err = Some(e.into());
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("Title inference failed after retries")))
    }
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: String,
}

impl TitleModel for OpenAiTitleModel {
    fn infer_title(&self, text: &str) -> Result<String> {
        let prompt = format!(
            "The following text was extracted from a scanned document:\n\n{}\n\nReply with only the title of this document. No additional description.",
            text
        );
        self.request_completion(&prompt)
    }
}

/// Create the appropriate [`TitleModel`] based on configuration.
pub fn create_model(config: &InferenceConfig) -> Result<Box<dyn TitleModel>> {
    match config.provider.as_str() {
        "disabled" => Ok(Box::new(DisabledModel)),
        "openai" => Ok(Box::new(OpenAiTitleModel::new(config)?)),
        other => bail!("Unknown inference provider: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_model_always_errors() {
        assert!(DisabledModel.infer_title("some text").is_err());
        assert!(DisabledModel.infer_title("").is_err());
    }

    #[test]
    fn create_model_rejects_unknown_provider() {
        let config = InferenceConfig {
            provider: "carrier-pigeon".to_string(),
            ..Default::default()
        };
        assert!(create_model(&config).is_err());
    }

    #[test]
    fn openai_model_requires_api_key() {
        let config = InferenceConfig {
            api_key_env: "TITLEDROP_TEST_UNSET_KEY".to_string(),
            ..Default::default()
        };
        let err = OpenAiTitleModel::new(&config).unwrap_err();
        assert!(err.to_string().contains("TITLEDROP_TEST_UNSET_KEY"));
    }
}
