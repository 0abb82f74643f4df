//! Hosted chat-completion client.
//!
//! [`ChatModel`] is the only seam between the assistant and a language
//! model: one request in, one string out. [`OpenAiCompatibleClient`] speaks
//! the `/chat/completions` dialect shared by Groq, OpenAI, Ollama and most
//! self-hosted gateways; providers differ only by base URL, default model
//! and API-key variable.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::config::LlmConfig;
use crate::error::{AssistError, AssistResult};
use crate::http::send_with_retry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Generation parameters for one call. The model name lives on the client.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerateParams {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl GenerateParams {
    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }
}

/// A hosted (or local) language model.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Model identifier sent upstream (e.g. `"llama-3.1-8b-instant"`).
    fn model_name(&self) -> &str;

    /// Generate a reply to `messages`. Returns the trimmed text of the first choice.
    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: &GenerateParams,
    ) -> AssistResult<String>;
}

/// Static description of a known provider.
struct ProviderDefaults {
    base_url: &'static str,
    model: &'static str,
    api_key_env: Option<&'static str>,
}

fn provider_defaults(provider: &str) -> Option<ProviderDefaults> {
    match provider {
        "groq" => Some(ProviderDefaults {
            base_url: "https://api.groq.com/openai/v1",
            model: "llama-3.1-8b-instant",
            api_key_env: Some("GROQ_API_KEY"),
        }),
        "openai" => Some(ProviderDefaults {
            base_url: "https://api.openai.com/v1",
            model: "gpt-4o-mini",
            api_key_env: Some("OPENAI_API_KEY"),
        }),
        "ollama" => Some(ProviderDefaults {
            base_url: "http://localhost:11434/v1",
            model: "llama3.1",
            api_key_env: None,
        }),
        "custom" => Some(ProviderDefaults {
            base_url: "",
            model: "default",
            api_key_env: Some("CUSTOM_API_KEY"),
        }),
        _ => None,
    }
}

/// Chat client for any OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiCompatibleClient {
    provider: String,
    model: String,
    base_url: String,
    /// Empty when the provider needs no auth (Ollama).
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatibleClient {
    /// Build from `[llm]` config.
    ///
    /// Resolution order:
    /// - API key: env var `llm.api_key_env` > provider default env var > none
    /// - Base URL: `llm.base_url` > provider default
    pub fn from_config(config: &LlmConfig) -> anyhow::Result<Self> {
        let defaults = provider_defaults(&config.provider)
            .ok_or_else(|| anyhow::anyhow!("Unknown llm provider: {}", config.provider))?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| defaults.base_url.to_string())
            .trim_end_matches('/')
            .to_string();
        if base_url.is_empty() {
            anyhow::bail!("llm.base_url must be set for provider '{}'", config.provider);
        }

        let key_env = config.api_key_env.as_deref().or(defaults.api_key_env);
        let api_key = key_env
            .and_then(|k| std::env::var(k).ok())
            .unwrap_or_default();
        if api_key.is_empty() {
            if let Some(k) = key_env {
                // Each call reports the missing key as a TransportFailure.
                tracing::warn!(provider = %config.provider, env = k, "API key not set");
            }
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            provider: config.provider.clone(),
            model: config
                .model
                .clone()
                .unwrap_or_else(|| defaults.model.to_string()),
            base_url,
            api_key,
            client,
        })
    }

    fn requires_key(&self) -> bool {
        provider_defaults(&self.provider)
            .map(|d| d.api_key_env.is_some())
            .unwrap_or(true)
    }
}

#[async_trait]
impl ChatModel for OpenAiCompatibleClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: &GenerateParams,
    ) -> AssistResult<String> {
        if self.requires_key() && self.api_key.is_empty() {
            return Err(AssistError::transport(format!(
                "no API key configured for provider '{}'",
                self.provider
            )));
        }

        let body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "max_tokens": params.max_tokens,
            "temperature": params.temperature,
        });

        let mut request = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&body);
        if !self.api_key.is_empty() {
            request = request.header("Authorization", format!("Bearer {}", self.api_key));
        }

        tracing::debug!(provider = %self.provider, model = %self.model, "chat completion request");
        let json = send_with_retry(&self.provider, request, 0).await?;
        parse_chat_response(&json)
    }
}

/// Extract `choices[0].message.content`.
fn parse_chat_response(json: &serde_json::Value) -> AssistResult<String> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(|s| s.trim().to_string())
        .ok_or_else(|| AssistError::transport("invalid chat response: missing choices[0].message.content"))
}

/// Create the configured chat model.
pub fn create_chat_model(config: &LlmConfig) -> anyhow::Result<Arc<dyn ChatModel>> {
    Ok(Arc::new(OpenAiCompatibleClient::from_config(config)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_serialization() {
        let msg = ChatMessage::system("be brief");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json, serde_json::json!({ "role": "system", "content": "be brief" }));
    }

    #[test]
    fn test_parse_chat_response() {
        let json = serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": "  BCA, B.Com, BBA \n" } }]
        });
        assert_eq!(parse_chat_response(&json).unwrap(), "BCA, B.Com, BBA");
    }

    #[test]
    fn test_parse_chat_response_missing_choices() {
        let err = parse_chat_response(&serde_json::json!({ "error": "x" })).unwrap_err();
        assert!(matches!(err, AssistError::TransportFailure(_)));
    }

    #[test]
    fn test_defaults_resolve_per_provider() {
        let cfg = LlmConfig {
            provider: "ollama".into(),
            ..LlmConfig::default()
        };
        let client = OpenAiCompatibleClient::from_config(&cfg).unwrap();
        assert_eq!(client.base_url, "http://localhost:11434/v1");
        assert_eq!(client.model_name(), "llama3.1");
        assert!(!client.requires_key());
    }

    #[test]
    fn test_base_url_override_trims_slash() {
        let cfg = LlmConfig {
            provider: "groq".into(),
            base_url: Some("http://127.0.0.1:9/v1/".into()),
            model: Some("mixtral".into()),
            ..LlmConfig::default()
        };
        let client = OpenAiCompatibleClient::from_config(&cfg).unwrap();
        assert_eq!(client.base_url, "http://127.0.0.1:9/v1");
        assert_eq!(client.model_name(), "mixtral");
    }

    #[tokio::test]
    async fn test_missing_key_is_transport_failure() {
        let cfg = LlmConfig {
            provider: "groq".into(),
            api_key_env: Some("CAMPUS_TEST_KEY_THAT_IS_NEVER_SET".into()),
            ..LlmConfig::default()
        };
        let client = OpenAiCompatibleClient::from_config(&cfg).unwrap();
        let err = client
            .complete(
                &[ChatMessage::user("hi")],
                &GenerateParams::from_config(&cfg),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AssistError::TransportFailure(_)));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_failure() {
        let cfg = LlmConfig {
            provider: "ollama".into(),
            base_url: Some("http://127.0.0.1:1/v1".into()),
            timeout_secs: 2,
            ..LlmConfig::default()
        };
        let client = OpenAiCompatibleClient::from_config(&cfg).unwrap();
        let err = client
            .complete(
                &[ChatMessage::user("hi")],
                &GenerateParams::from_config(&cfg),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AssistError::TransportFailure(_)));
    }
}
