use std::time::Duration;

use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::conversation::{ConversationStore, GENERATION_THRESHOLD};
use crate::llm::contracts::DialogEnvelope;
use crate::models::{
    DialogTurnRequest, ErrorResponse, GenerateInstructionRequest, GenerateInstructionResponse,
    Turn,
};

const DIALOG_TURN_PATH: &str = "dialog-turn";
const GENERATE_INSTRUCTION_PATH: &str = "generate-instruction";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid base url: {0}")]
    InvalidBaseUrl(String),
    #[error("request failed: {0}")]
    Transport(String),
    #[error("server returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("server response could not be decoded: {0}")]
    InvalidResponse(String),
    #[error("instruction generation returned no usable text")]
    EmptyResult,
    #[error("generation needs {required} checked items, have {checked}")]
    GenerationNotReady { checked: usize, required: usize },
}

/// Talks to the two backend endpoints and keeps a [`ConversationStore`] in
/// step with their answers.
#[derive(Debug, Clone)]
pub struct EdupromptClient {
    base_url: Url,
    http_client: reqwest::Client,
}

impl EdupromptClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_timeout(base_url, None)
    }

    pub fn with_timeout(base_url: &str, timeout: Option<Duration>) -> Result<Self, ClientError> {
        let mut base_url =
            Url::parse(base_url).map_err(|err| ClientError::InvalidBaseUrl(err.to_string()))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ClientError::InvalidBaseUrl(format!(
                "unsupported scheme {}",
                base_url.scheme()
            )));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder
            .build()
            .map_err(|err| ClientError::Transport(err.to_string()))?;

        Ok(Self {
            base_url,
            http_client,
        })
    }

    pub async fn dialog_turn(&self, messages: &[Turn]) -> Result<DialogEnvelope, ClientError> {
        let body = DialogTurnRequest {
            messages: Some(messages.to_vec()),
        };
        self.post_json(DIALOG_TURN_PATH, &body).await
    }

    pub async fn generate_instruction(&self, chat: &[Turn]) -> Result<String, ClientError> {
        let body = GenerateInstructionRequest {
            chat: Some(chat.to_vec()),
        };
        let response: GenerateInstructionResponse =
            self.post_json(GENERATE_INSTRUCTION_PATH, &body).await?;
        Ok(response.result)
    }

    /// Submits one user message. Returns `Ok(None)` without a request when
    /// there is nothing to send. On failure, including an envelope with an
    /// empty reply, the user turn stays in the store and no assistant turn
    /// is added.
    pub async fn send_message(
        &self,
        store: &mut ConversationStore,
        text: &str,
        image: Option<String>,
    ) -> Result<Option<DialogEnvelope>, ClientError> {
        let Some(history) = store.begin_user_turn(text, image) else {
            return Ok(None);
        };

        let envelope = self.dialog_turn(history).await?;
        if envelope.reply.trim().is_empty() {
            warn!("dialog turn answered without reply text");
            return Err(ClientError::InvalidResponse(
                "dialog reply is empty".to_string(),
            ));
        }
        store.apply_dialog_envelope(&envelope);
        debug!(
            checked = store.checked_count(),
            generation_enabled = store.generation_enabled(),
            "dialog turn applied"
        );
        Ok(Some(envelope))
    }

    pub async fn generate(&self, store: &mut ConversationStore) -> Result<String, ClientError> {
        if !store.generation_enabled() {
            return Err(ClientError::GenerationNotReady {
                checked: store.checked_count(),
                required: GENERATION_THRESHOLD,
            });
        }

        let result = self
            .generate_instruction(&store.history_for_synthesis())
            .await?;
        store.set_generation_result(result.as_str());

        match store.generation_result() {
            Some(text) => Ok(text.to_string()),
            None => Err(ClientError::EmptyResult),
        }
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self
            .base_url
            .join(path)
            .map_err(|err| ClientError::InvalidBaseUrl(err.to_string()))?;

        let response = self
            .http_client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|err| ClientError::Transport(err.to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| ClientError::Transport(err.to_string()))?;

        if !status.is_success() {
            let message = error_message(status, &bytes);
            warn!(status = status.as_u16(), path, "backend request failed");
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_slice(&bytes).map_err(|err| ClientError::InvalidResponse(err.to_string()))
    }
}

fn error_message(status: StatusCode, body: &[u8]) -> String {
    serde_json::from_slice::<ErrorResponse>(body)
        .map(|payload| payload.error)
        .unwrap_or_else(|_| {
            status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string()
        })
}
