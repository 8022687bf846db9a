use std::time::Duration;

use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;
use url::Url;

use super::gateway::{
    LlmGateway, LlmGatewayError, LlmGatewayFuture, LlmGatewayRequest, LlmGatewayResponse,
    LlmTokenUsage,
};
use super::prompts::ResponseFormat;
use crate::config::ConfigError;
use crate::config_env::{optional_trimmed_env, parse_optional_u64_env};
use crate::models::Turn;

const DEFAULT_CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4o";

#[derive(Debug, Clone)]
pub struct OpenAiGatewayConfig {
    pub chat_completions_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout_ms: Option<u64>,
}

impl OpenAiGatewayConfig {
    pub fn from_env() -> Result<Self, OpenAiConfigError> {
        let api_key =
            optional_trimmed_env("OPENAI_API_KEY").ok_or(OpenAiConfigError::MissingApiKey)?;
        let chat_completions_url = optional_trimmed_env("OPENAI_CHAT_COMPLETIONS_URL")
            .unwrap_or_else(|| DEFAULT_CHAT_COMPLETIONS_URL.to_string());
        validate_endpoint_url(&chat_completions_url)?;

        Ok(Self {
            chat_completions_url,
            api_key,
            model: optional_trimmed_env("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            timeout_ms: parse_optional_u64_env("OPENAI_TIMEOUT_MS")?,
        })
    }
}

#[derive(Debug, Error)]
pub enum OpenAiConfigError {
    #[error("OPENAI_API_KEY is not set")]
    MissingApiKey,
    #[error(transparent)]
    Env(#[from] ConfigError),
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("failed to build OpenAI http client: {0}")]
    HttpClient(String),
}

#[derive(Clone)]
pub struct OpenAiGateway {
    client: reqwest::Client,
    config: OpenAiGatewayConfig,
}

impl OpenAiGateway {
    pub fn new(config: OpenAiGatewayConfig) -> Result<Self, OpenAiConfigError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout_ms) = config.timeout_ms {
            builder = builder.timeout(Duration::from_millis(timeout_ms));
        }
        let client = builder
            .build()
            .map_err(|err| OpenAiConfigError::HttpClient(err.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    async fn send_once(
        &self,
        request: &LlmGatewayRequest,
    ) -> Result<LlmGatewayResponse, LlmGatewayError> {
        let request_body = build_request_body(&self.config.model, request);

        let response = self
            .client
            .post(&self.config.chat_completions_url)
            .bearer_auth(&self.config.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    LlmGatewayError::Timeout
                } else {
                    LlmGatewayError::Transport("request_unavailable".to_string())
                }
            })?;

        let status = response.status();
        let header_request_id = header_request_id(response.headers());
        let body = response.text().await.map_err(|err| {
            if err.is_timeout() {
                LlmGatewayError::Timeout
            } else {
                LlmGatewayError::Transport("response_body_read_failed".to_string())
            }
        })?;

        if !status.is_success() {
            return Err(LlmGatewayError::ProviderStatus {
                status: status.as_u16(),
                message: parse_provider_error_message(&body),
            });
        }

        let parsed: OpenAiSuccessResponse = serde_json::from_str(&body).map_err(|_| {
            LlmGatewayError::InvalidProviderPayload("response_json_parse_failed".to_string())
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content);

        Ok(LlmGatewayResponse {
            model: parsed.model.unwrap_or_else(|| self.config.model.clone()),
            provider_request_id: header_request_id.or(parsed.id),
            content,
            usage: parsed.usage.map(|usage| LlmTokenUsage {
                prompt_tokens: clamp_u64_to_u32(usage.prompt_tokens.unwrap_or(0)),
                completion_tokens: clamp_u64_to_u32(usage.completion_tokens.unwrap_or(0)),
                total_tokens: clamp_u64_to_u32(usage.total_tokens.unwrap_or(0)),
            }),
        })
    }
}

impl LlmGateway for OpenAiGateway {
    fn generate<'a>(&'a self, request: LlmGatewayRequest) -> LlmGatewayFuture<'a> {
        Box::pin(async move { self.send_once(&request).await })
    }
}

fn build_request_body(model: &str, request: &LlmGatewayRequest) -> Value {
    let mut messages = Vec::with_capacity(request.messages.len() + 1);
    messages.push(json!({ "role": "system", "content": request.system_prompt }));
    messages.extend(request.messages.iter().map(message_payload));

    let mut body = json!({
        "model": model,
        "messages": messages,
        "max_tokens": request.max_tokens,
        "temperature": request.temperature,
    });

    if request.response_format == ResponseFormat::JsonObject {
        body["response_format"] = json!({ "type": "json_object" });
    }

    body
}

fn message_payload(turn: &Turn) -> Value {
    match turn.image_base64.as_deref() {
        Some(image_url) => json!({
            "role": turn.role.as_str(),
            "content": [
                { "type": "text", "text": turn.content },
                { "type": "image_url", "image_url": { "url": image_url } }
            ]
        }),
        None => json!({ "role": turn.role.as_str(), "content": turn.content }),
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiSuccessResponse {
    id: Option<String>,
    model: Option<String>,
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: Option<OpenAiMessage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: Option<u64>,
    completion_tokens: Option<u64>,
    total_tokens: Option<u64>,
}

fn validate_endpoint_url(raw: &str) -> Result<(), OpenAiConfigError> {
    let url = Url::parse(raw).map_err(|err| {
        OpenAiConfigError::InvalidConfiguration(format!(
            "OPENAI_CHAT_COMPLETIONS_URL is not a valid URL: {err}"
        ))
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(OpenAiConfigError::InvalidConfiguration(
            "OPENAI_CHAT_COMPLETIONS_URL must start with http:// or https://".to_string(),
        ));
    }

    Ok(())
}

fn header_request_id(headers: &reqwest::header::HeaderMap) -> Option<String> {
    headers
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .map(ToString::to_string)
}

fn parse_provider_error_message(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ProviderErrorEnvelope {
        error: Option<ProviderErrorDetails>,
    }

    #[derive(Deserialize)]
    struct ProviderErrorDetails {
        message: Option<String>,
    }

    serde_json::from_str::<ProviderErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error)
        .and_then(|details| details.message)
        .filter(|message| !message.trim().is_empty())
}

fn clamp_u64_to_u32(value: u64) -> u32 {
    value.min(u32::MAX as u64) as u32
}
