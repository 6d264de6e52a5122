use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use reqwest::Response;
use thiserror::Error;

use super::{retry_with_policy, AnthropicBackend, GeminiBackend, OpenAiBackend, RetryPolicy};

/// Errors from a single logical model call
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("unsupported provider: {0} (expected openai, gemini or anthropic)")]
    UnsupportedProvider(String),
    #[error("{0} environment variable not set")]
    MissingApiKey(&'static str),
    #[error("unsupported reasoning level: {0}")]
    UnsupportedReasoningLevel(String),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{provider} API error: {status} - {body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl GatewayError {
    /// Configuration errors fail fast; everything else is worth another attempt
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            GatewayError::UnsupportedProvider(_)
                | GatewayError::MissingApiKey(_)
                | GatewayError::UnsupportedReasoningLevel(_)
        )
    }
}

/// Supported model providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAi,
    Gemini,
    Anthropic,
}

impl Provider {
    pub fn name(self) -> &'static str {
        match self {
            Provider::OpenAi => "OpenAI",
            Provider::Gemini => "Gemini",
            Provider::Anthropic => "Anthropic",
        }
    }

    /// Environment variables checked for the API key, in order
    pub fn api_key_vars(self) -> &'static [&'static str] {
        match self {
            Provider::OpenAi => &["OPENAI_API_KEY"],
            Provider::Gemini => &["GOOGLE_API_KEY", "GEMINI_API_KEY"],
            Provider::Anthropic => &["ANTHROPIC_API_KEY"],
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            Provider::OpenAi => "gpt-5.2",
            Provider::Gemini => "gemini-3-flash-preview",
            Provider::Anthropic => "claude-sonnet-4-20250514",
        }
    }

    /// Reasoning levels the given model accepts; empty if reasoning is not configurable
    pub fn reasoning_levels(self, model_id: &str) -> &'static [ReasoningLevel] {
        use ReasoningLevel::*;
        match self {
            Provider::OpenAi => &[Low, Medium, High],
            Provider::Gemini if model_id.contains("pro") => &[Low, High],
            Provider::Gemini => &[Minimal, Low, Medium, High],
            Provider::Anthropic => &[],
        }
    }

    /// Middle of the supported range
    pub fn default_reasoning(self, model_id: &str) -> Option<ReasoningLevel> {
        let levels = self.reasoning_levels(model_id);
        levels.get(levels.len() / 2).copied()
    }
}

impl FromStr for Provider {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAi),
            "gemini" | "google" => Ok(Provider::Gemini),
            "anthropic" | "claude" => Ok(Provider::Anthropic),
            _ => Err(GatewayError::UnsupportedProvider(s.to_string())),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How hard the model should think before answering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReasoningLevel {
    Minimal,
    Low,
    Medium,
    High,
}

impl ReasoningLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            ReasoningLevel::Minimal => "minimal",
            ReasoningLevel::Low => "low",
            ReasoningLevel::Medium => "medium",
            ReasoningLevel::High => "high",
        }
    }
}

impl FromStr for ReasoningLevel {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minimal" => Ok(ReasoningLevel::Minimal),
            "low" => Ok(ReasoningLevel::Low),
            "medium" => Ok(ReasoningLevel::Medium),
            "high" => Ok(ReasoningLevel::High),
            _ => Err(GatewayError::UnsupportedReasoningLevel(s.to_string())),
        }
    }
}

/// Backend selection and credentials, read-only for the whole run
#[derive(Clone)]
pub struct BackendConfig {
    pub provider: Provider,
    pub api_key: String,
    pub model_id: String,
    pub reasoning_level: Option<ReasoningLevel>,
}

impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("provider", &self.provider)
            .field("api_key", &"<redacted>")
            .field("model_id", &self.model_id)
            .field("reasoning_level", &self.reasoning_level)
            .finish()
    }
}

impl BackendConfig {
    /// Create config from environment variables
    pub fn from_env(
        provider: Provider,
        model_id: Option<String>,
        reasoning_level: Option<ReasoningLevel>,
    ) -> Result<Self, GatewayError> {
        Self::from_lookup(provider, model_id, reasoning_level, |name| {
            std::env::var(name).ok()
        })
    }

    /// Create config, resolving the API key through `lookup`
    pub fn from_lookup(
        provider: Provider,
        model_id: Option<String>,
        reasoning_level: Option<ReasoningLevel>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, GatewayError> {
        let vars = provider.api_key_vars();
        let api_key = vars
            .iter()
            .filter_map(|name| lookup(name))
            .map(|key| key.trim().to_string())
            .find(|key| !key.is_empty())
            .ok_or(GatewayError::MissingApiKey(vars[0]))?;

        let model_id = model_id.unwrap_or_else(|| provider.default_model().to_string());

        let supported = provider.reasoning_levels(&model_id);
        let reasoning_level = match reasoning_level {
            Some(level) if supported.contains(&level) => Some(level),
            Some(level) => {
                return Err(GatewayError::UnsupportedReasoningLevel(format!(
                    "{} for {} {}",
                    level.as_str(),
                    provider,
                    model_id
                )));
            }
            None => provider.default_reasoning(&model_id),
        };

        Ok(Self {
            provider,
            api_key,
            model_id,
            reasoning_level,
        })
    }
}

/// Which pipeline stage is calling the model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageRole {
    Analyst,
    Critic,
    Reporter,
}

impl StageRole {
    /// Analyst and Critic answer in JSON; the Reporter writes Markdown
    pub fn expects_json(self) -> bool {
        matches!(self, StageRole::Analyst | StageRole::Critic)
    }
}

impl fmt::Display for StageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StageRole::Analyst => "analyst",
            StageRole::Critic => "critic",
            StageRole::Reporter => "reporter",
        })
    }
}

/// One provider-independent model request
#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub role: StageRole,
    pub system_prompt: String,
    pub user_content: String,
    /// Structured-output hint for providers that support a JSON mode
    pub expects_json: bool,
}

impl ModelRequest {
    pub fn new(role: StageRole, system_prompt: &str, user_content: &str) -> Self {
        Self {
            role,
            system_prompt: system_prompt.to_string(),
            user_content: user_content.to_string(),
            expects_json: role.expects_json(),
        }
    }
}

/// A provider that turns one request into one text response, no retries
#[async_trait]
pub trait ModelBackend: Send + Sync {
    async fn complete(&self, request: &ModelRequest) -> Result<String, GatewayError>;

    /// Provider name for logs
    fn name(&self) -> &'static str;
}

/// The single operation the pipeline needs from a language model
#[async_trait]
pub trait ModelGateway: Send + Sync {
    async fn invoke(
        &self,
        role: StageRole,
        system_prompt: &str,
        user_content: &str,
    ) -> Result<String, GatewayError>;
}

/// Gateway that applies a retry policy around any backend
pub struct RetryingGateway {
    backend: Box<dyn ModelBackend>,
    policy: RetryPolicy,
}

impl RetryingGateway {
    pub fn new(backend: Box<dyn ModelBackend>, policy: RetryPolicy) -> Self {
        Self { backend, policy }
    }
}

#[async_trait]
impl ModelGateway for RetryingGateway {
    async fn invoke(
        &self,
        role: StageRole,
        system_prompt: &str,
        user_content: &str,
    ) -> Result<String, GatewayError> {
        let request = ModelRequest::new(role, system_prompt, user_content);
        let label = format!("{} call to {}", role, self.backend.name());
        retry_with_policy(&self.policy, &label, || self.backend.complete(&request)).await
    }
}

/// Build the gateway for the configured provider
pub fn build_gateway(
    config: &BackendConfig,
    policy: RetryPolicy,
) -> Result<RetryingGateway, GatewayError> {
    if config.api_key.trim().is_empty() {
        return Err(GatewayError::MissingApiKey(config.provider.api_key_vars()[0]));
    }

    let backend: Box<dyn ModelBackend> = match config.provider {
        Provider::OpenAi => Box::new(OpenAiBackend::new(config.clone())),
        Provider::Gemini => Box::new(GeminiBackend::new(config.clone())),
        Provider::Anthropic => Box::new(AnthropicBackend::new(config.clone())),
    };

    Ok(RetryingGateway::new(backend, policy))
}

/// Turn a non-success HTTP status into a retryable error carrying the body
pub(crate) async fn check_status(
    provider: &'static str,
    response: Response,
) -> Result<Response, GatewayError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(GatewayError::Status {
        provider,
        status,
        body,
    })
}
