use axum::Json;
use axum::body::Body;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use shared::llm::{LlmGatewayError, SynthesisError, synthesize_instruction};
use shared::models::{GenerateInstructionRequest, GenerateInstructionResponse};
use tracing::{info, warn};

use super::{AppState, read_body};
use super::errors::{bad_request_response, internal_error_response, missing_api_key_response};
use super::observability::RequestContext;

const INVALID_CHAT_MESSAGE: &str = "Invalid chat.";
const UPSTREAM_ERROR_MESSAGE: &str = "OpenAI API error.";
const SERVER_ERROR_MESSAGE: &str = "Server error.";

pub(super) async fn generate_instruction(
    State(state): State<AppState>,
    Extension(request_context): Extension<RequestContext>,
    body: Body,
) -> Response {
    let Some(llm_gateway) = state.llm_gateway.as_deref() else {
        warn!(request_id = %request_context.request_id, "instruction rejected: no api key configured");
        return missing_api_key_response();
    };
    let body = match read_body(body, state.max_body_bytes).await {
        Ok(body) => body,
        Err(response) => return response,
    };

    let chat = match serde_json::from_slice::<GenerateInstructionRequest>(&body) {
        Ok(GenerateInstructionRequest { chat: Some(chat) }) if !chat.is_empty() => chat,
        _ => return bad_request_response(INVALID_CHAT_MESSAGE),
    };

    match synthesize_instruction(llm_gateway, &chat).await {
        Ok(result) => {
            if result.trim().is_empty() {
                warn!(request_id = %request_context.request_id, "instruction synthesis returned empty text");
            } else {
                info!(
                    request_id = %request_context.request_id,
                    turn_count = chat.len(),
                    result_len = result.len(),
                    "instruction synthesis completed"
                );
            }
            (StatusCode::OK, Json(GenerateInstructionResponse { result })).into_response()
        }
        Err(err) => {
            warn!(request_id = %request_context.request_id, "instruction synthesis failed: {err}");
            match err {
                SynthesisError::EmptyHistory => bad_request_response(INVALID_CHAT_MESSAGE),
                SynthesisError::Gateway(LlmGatewayError::ProviderStatus { message, .. }) => {
                    internal_error_response(message.as_deref().unwrap_or(UPSTREAM_ERROR_MESSAGE))
                }
                SynthesisError::Gateway(_) => internal_error_response(SERVER_ERROR_MESSAGE),
            }
        }
    }
}
