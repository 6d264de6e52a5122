use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{check_status, BackendConfig, GatewayError, ModelBackend, ModelRequest, ReasoningLevel};

const OPENAI_RESPONSES_URL: &str = "https://api.openai.com/v1/responses";

/// OpenAI Responses API backend
pub struct OpenAiBackend {
    client: Client,
    config: BackendConfig,
    url: String,
}

impl OpenAiBackend {
    pub fn new(config: BackendConfig) -> Self {
        Self {
            client: Client::new(),
            config,
            url: OPENAI_RESPONSES_URL.to_string(),
        }
    }

    fn build_request(&self, request: &ModelRequest) -> OpenAiRequest {
        // `minimal` is a Gemini level; OpenAI only takes low/medium/high
        let reasoning = self
            .config
            .reasoning_level
            .filter(|level| *level != ReasoningLevel::Minimal)
            .map(|level| Reasoning {
                effort: level.as_str(),
            });

        let text = request.expects_json.then_some(TextOptions {
            format: TextFormat {
                format_type: "json_object",
            },
        });

        OpenAiRequest {
            model: self.config.model_id.clone(),
            input: vec![
                InputMessage {
                    role: "system",
                    content: request.system_prompt.clone(),
                },
                InputMessage {
                    role: "user",
                    content: request.user_content.clone(),
                },
            ],
            reasoning,
            text,
        }
    }
}

#[async_trait]
impl ModelBackend for OpenAiBackend {
    async fn complete(&self, request: &ModelRequest) -> Result<String, GatewayError> {
        let body = self.build_request(request);
        debug!(
            "OpenAI {} request: model={}, {} chars",
            request.role,
            body.model,
            request.user_content.len()
        );

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;
        let response = check_status(self.name(), response).await?;

        let response: OpenAiResponse = response.json().await.map_err(|e| {
            GatewayError::MalformedResponse(format!("Failed to parse OpenAI response: {}", e))
        })?;

        output_text(&response)
    }

    fn name(&self) -> &'static str {
        "OpenAI"
    }
}

/// Concatenate every `output_text` part of every message item
fn output_text(response: &OpenAiResponse) -> Result<String, GatewayError> {
    let text: String = response
        .output
        .iter()
        .filter(|item| item.item_type == "message")
        .flat_map(|item| item.content.iter())
        .filter(|c| c.content_type == "output_text")
        .map(|c| c.text.as_str())
        .collect();

    if text.is_empty() {
        return Err(GatewayError::MalformedResponse(
            "No text content in OpenAI response".to_string(),
        ));
    }
    Ok(text)
}

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    input: Vec<InputMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning: Option<Reasoning>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<TextOptions>,
}

#[derive(Debug, Serialize)]
struct InputMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct Reasoning {
    effort: &'static str,
}

#[derive(Debug, Serialize)]
struct TextOptions {
    format: TextFormat,
}

#[derive(Debug, Serialize)]
struct TextFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(rename = "type")]
    item_type: String,
    #[serde(default)]
    content: Vec<OutputContent>,
}

#[derive(Debug, Deserialize)]
struct OutputContent {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{Provider, StageRole};

    fn backend(reasoning_level: Option<ReasoningLevel>) -> OpenAiBackend {
        OpenAiBackend::new(BackendConfig {
            provider: Provider::OpenAi,
            api_key: "test".to_string(),
            model_id: "gpt-5.2".to_string(),
            reasoning_level,
        })
    }

    #[test]
    fn test_request_body_for_json_stage() {
        let request = ModelRequest::new(StageRole::Analyst, "sys", "chunk");
        let body = serde_json::to_value(backend(Some(ReasoningLevel::High)).build_request(&request)).unwrap();

        assert_eq!(body["model"], "gpt-5.2");
        assert_eq!(body["input"][0]["role"], "system");
        assert_eq!(body["input"][1]["content"], "chunk");
        assert_eq!(body["reasoning"]["effort"], "high");
        assert_eq!(body["text"]["format"]["type"], "json_object");
    }

    #[test]
    fn test_request_body_for_report_stage() {
        let request = ModelRequest::new(StageRole::Reporter, "sys", "facts");
        let body = serde_json::to_value(backend(Some(ReasoningLevel::Minimal)).build_request(&request)).unwrap();

        assert!(body.get("reasoning").is_none());
        assert!(body.get("text").is_none());
    }

    #[test]
    fn test_output_text_joins_message_parts() {
        let response: OpenAiResponse = serde_json::from_str(
            r#"{
                "output": [
                    {"type": "reasoning", "summary": []},
                    {"type": "message", "content": [
                        {"type": "output_text", "text": "{\"admissions\": "},
                        {"type": "output_text", "text": "[]}"}
                    ]}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(output_text(&response).unwrap(), r#"{"admissions": []}"#);
    }

    #[test]
    fn test_output_text_missing() {
        let response: OpenAiResponse = serde_json::from_str(r#"{"output": []}"#).unwrap();
        assert!(matches!(
            output_text(&response),
            Err(GatewayError::MalformedResponse(_))
        ));
    }
}
