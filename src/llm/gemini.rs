use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{check_status, BackendConfig, GatewayError, ModelBackend, ModelRequest};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Google Gemini `generateContent` backend
pub struct GeminiBackend {
    client: Client,
    config: BackendConfig,
    api_base: String,
}

impl GeminiBackend {
    pub fn new(config: BackendConfig) -> Self {
        Self {
            client: Client::new(),
            config,
            api_base: GEMINI_API_BASE.to_string(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.api_base.trim_end_matches('/'),
            self.config.model_id
        )
    }

    fn build_request(&self, request: &ModelRequest) -> GeminiRequest {
        GeminiRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part::text(&request.system_prompt)],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part::text(&request.user_content)],
            }],
            generation_config: GenerationConfig {
                thinking_config: self.config.reasoning_level.map(|level| ThinkingConfig {
                    thinking_level: level.as_str().to_ascii_uppercase(),
                }),
                response_mime_type: request.expects_json.then_some("application/json"),
            },
        }
    }
}

#[async_trait]
impl ModelBackend for GeminiBackend {
    async fn complete(&self, request: &ModelRequest) -> Result<String, GatewayError> {
        let body = self.build_request(request);
        debug!(
            "Gemini {} request: model={}, {} chars",
            request.role,
            self.config.model_id,
            request.user_content.len()
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await?;
        let response = check_status(self.name(), response).await?;

        let response: GeminiResponse = response.json().await.map_err(|e| {
            GatewayError::MalformedResponse(format!("Failed to parse Gemini response: {}", e))
        })?;

        candidate_text(&response)
    }

    fn name(&self) -> &'static str {
        "Gemini"
    }
}

/// Text of the first candidate, skipping thought parts
fn candidate_text(response: &GeminiResponse) -> Result<String, GatewayError> {
    let text: String = response
        .candidates
        .first()
        .map(|c| {
            c.content
                .parts
                .iter()
                .filter(|p| !p.thought)
                .filter_map(|p| p.text.as_deref())
                .collect()
        })
        .unwrap_or_default();

    if text.is_empty() {
        return Err(GatewayError::MalformedResponse(
            "No text content in Gemini response".to_string(),
        ));
    }
    Ok(text)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

impl Part {
    fn text(text: &str) -> Self {
        Self {
            text: text.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking_config: Option<ThinkingConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_level: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: CandidateContent,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{Provider, ReasoningLevel, StageRole};

    fn backend() -> GeminiBackend {
        GeminiBackend::new(BackendConfig {
            provider: Provider::Gemini,
            api_key: "test".to_string(),
            model_id: "gemini-3-pro-preview".to_string(),
            reasoning_level: Some(ReasoningLevel::Low),
        })
    }

    #[test]
    fn test_endpoint() {
        let backend = backend().with_api_base("http://localhost:9000/v1beta/");
        assert_eq!(
            backend.endpoint(),
            "http://localhost:9000/v1beta/models/gemini-3-pro-preview:generateContent"
        );
    }

    #[test]
    fn test_request_body() {
        let request = ModelRequest::new(StageRole::Critic, "sys", "draft");
        let body = serde_json::to_value(backend().build_request(&request)).unwrap();

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "sys");
        assert!(body["systemInstruction"].get("role").is_none());
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "draft");
        assert_eq!(body["generationConfig"]["thinkingConfig"]["thinkingLevel"], "LOW");
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");

        let request = ModelRequest::new(StageRole::Reporter, "sys", "facts");
        let body = serde_json::to_value(backend().build_request(&request)).unwrap();
        assert!(body["generationConfig"].get("responseMimeType").is_none());
    }

    #[test]
    fn test_candidate_text_skips_thoughts() {
        let response: GeminiResponse = serde_json::from_str(
            r#"{"candidates": [{"content": {"role": "model", "parts": [
                {"text": "thinking...", "thought": true},
                {"text": "보고서 본문"}
            ]}}]}"#,
        )
        .unwrap();

        assert_eq!(candidate_text(&response).unwrap(), "보고서 본문");
    }

    #[test]
    fn test_candidate_text_missing() {
        let response: GeminiResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        assert!(candidate_text(&response).is_err());
    }
}
