use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{check_status, BackendConfig, GatewayError, ModelBackend, ModelRequest};

const ANTHROPIC_MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";

/// Sampling settings for the Anthropic API
#[derive(Debug, Clone)]
pub struct AnthropicSettings {
    /// Temperature (0-1, lower = more deterministic)
    pub temperature: f64,
    /// Maximum tokens in response
    pub max_tokens: u32,
}

impl Default for AnthropicSettings {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            max_tokens: 8192,
        }
    }
}

/// Anthropic Messages API backend
pub struct AnthropicBackend {
    client: Client,
    config: BackendConfig,
    settings: AnthropicSettings,
}

impl AnthropicBackend {
    pub fn new(config: BackendConfig) -> Self {
        Self::with_settings(config, AnthropicSettings::default())
    }

    pub fn with_settings(config: BackendConfig, settings: AnthropicSettings) -> Self {
        Self {
            client: Client::new(),
            config,
            settings,
        }
    }

    fn build_request(&self, request: &ModelRequest) -> AnthropicRequest {
        AnthropicRequest {
            model: self.config.model_id.clone(),
            max_tokens: self.settings.max_tokens,
            temperature: Some(self.settings.temperature),
            system: Some(request.system_prompt.clone()),
            messages: vec![Message {
                role: "user".to_string(),
                content: request.user_content.clone(),
            }],
        }
    }
}

#[async_trait]
impl ModelBackend for AnthropicBackend {
    /// Send a message to Claude and get a response
    async fn complete(&self, request: &ModelRequest) -> Result<String, GatewayError> {
        let body = self.build_request(request);
        debug!(
            "Anthropic {} request: model={}, {} chars",
            request.role,
            body.model,
            request.user_content.len()
        );

        let response = self
            .client
            .post(ANTHROPIC_MESSAGES_URL)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;
        let response = check_status(self.name(), response).await?;

        let response: AnthropicResponse = response.json().await.map_err(|e| {
            GatewayError::MalformedResponse(format!("Failed to parse Anthropic API response: {}", e))
        })?;

        first_text(&response)
    }

    fn name(&self) -> &'static str {
        "Anthropic"
    }
}

/// Extract text from the first text content block
fn first_text(response: &AnthropicResponse) -> Result<String, GatewayError> {
    response
        .content
        .iter()
        .find(|c| c.content_type == "text")
        .map(|c| c.text.clone())
        .ok_or_else(|| GatewayError::MalformedResponse("No text content in response".to_string()))
}

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{Provider, StageRole};

    #[test]
    fn test_request_body() {
        let backend = AnthropicBackend::new(BackendConfig {
            provider: Provider::Anthropic,
            api_key: "test".to_string(),
            model_id: "claude-sonnet-4-20250514".to_string(),
            reasoning_level: None,
        });
        let request = ModelRequest::new(StageRole::Analyst, "sys", "chunk");
        let body = serde_json::to_value(backend.build_request(&request)).unwrap();

        assert_eq!(body["model"], "claude-sonnet-4-20250514");
        assert_eq!(body["max_tokens"], 8192);
        assert_eq!(body["system"], "sys");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "chunk");
    }

    #[test]
    fn test_first_text_block() {
        let response: AnthropicResponse = serde_json::from_str(
            r#"{"content": [{"type": "thinking", "thinking": "..."}, {"type": "text", "text": "hello"}]}"#,
        )
        .unwrap();
        assert_eq!(first_text(&response).unwrap(), "hello");

        let empty: AnthropicResponse = serde_json::from_str(r#"{"content": []}"#).unwrap();
        assert!(first_text(&empty).is_err());
    }
}
