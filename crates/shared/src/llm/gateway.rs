use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::contracts::LlmOperation;
use super::prompts::{PromptTemplate, ResponseFormat};
use crate::models::Turn;

pub type LlmGatewayFuture<'a> =
    Pin<Box<dyn Future<Output = Result<LlmGatewayResponse, LlmGatewayError>> + Send + 'a>>;

#[derive(Debug, Clone)]
pub struct LlmGatewayRequest {
    pub operation: LlmOperation,
    pub system_prompt: String,
    pub messages: Vec<Turn>,
    pub response_format: ResponseFormat,
    pub max_tokens: u32,
    pub temperature: f64,
}

impl LlmGatewayRequest {
    pub fn from_template(template: PromptTemplate, messages: Vec<Turn>) -> Self {
        Self {
            operation: template.operation,
            system_prompt: template.system_prompt.to_string(),
            messages,
            response_format: template.response_format,
            max_tokens: template.max_tokens,
            temperature: template.temperature,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmTokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmGatewayResponse {
    pub model: String,
    pub provider_request_id: Option<String>,
    /// First choice's message content; `None` when the provider sent none.
    pub content: Option<String>,
    pub usage: Option<LlmTokenUsage>,
}

#[derive(Debug, Error)]
pub enum LlmGatewayError {
    #[error("llm provider request timed out")]
    Timeout,
    #[error("llm provider request failed: {0}")]
    Transport(String),
    #[error("llm provider returned status {status}")]
    ProviderStatus {
        status: u16,
        message: Option<String>,
    },
    #[error("llm provider returned an invalid payload: {0}")]
    InvalidProviderPayload(String),
}

impl LlmGatewayError {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Transport(_) => "transport",
            Self::ProviderStatus { .. } => "provider_status",
            Self::InvalidProviderPayload(_) => "invalid_provider_payload",
        }
    }
}

pub trait LlmGateway: Send + Sync {
    fn generate<'a>(&'a self, request: LlmGatewayRequest) -> LlmGatewayFuture<'a>;
}
