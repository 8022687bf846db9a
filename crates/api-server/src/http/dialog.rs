use axum::Json;
use axum::body::Body;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use shared::llm::{DialogError, EnvelopeSource, LlmGatewayError, run_dialog_turn};
use shared::models::{DialogTurnRequest, DialogTurnResponse};
use tracing::{info, warn};

use super::{AppState, read_body};
use super::errors::{
    bad_request_response, error_response, internal_error_response, missing_api_key_response,
    upstream_status,
};
use super::observability::RequestContext;

const NO_MESSAGES_MESSAGE: &str = "Keine Nachrichten übermittelt.";
const UPSTREAM_ERROR_MESSAGE: &str = "Fehler von der OpenAI API.";
const EMPTY_RESPONSE_MESSAGE: &str = "Leere Antwort von der OpenAI API.";
const INTERNAL_ERROR_MESSAGE: &str = "Ein interner Serverfehler ist aufgetreten.";

pub(super) async fn dialog_turn(
    State(state): State<AppState>,
    Extension(request_context): Extension<RequestContext>,
    body: Body,
) -> Response {
    let Some(llm_gateway) = state.llm_gateway.as_deref() else {
        warn!(request_id = %request_context.request_id, "dialog turn rejected: no api key configured");
        return missing_api_key_response();
    };
    let body = match read_body(body, state.max_body_bytes).await {
        Ok(body) => body,
        Err(response) => return response,
    };

    let messages = match serde_json::from_slice::<DialogTurnRequest>(&body) {
        Ok(DialogTurnRequest {
            messages: Some(messages),
        }) if !messages.is_empty() => messages,
        _ => return bad_request_response(NO_MESSAGES_MESSAGE),
    };
    let turn_count = messages.len();

    match run_dialog_turn(llm_gateway, messages).await {
        Ok(outcome) => {
            info!(
                request_id = %request_context.request_id,
                turn_count,
                envelope_source = outcome.source.as_str(),
                checked = outcome.envelope.checklist.true_count(),
                "dialog turn completed"
            );
            if outcome.source == EnvelopeSource::Fallback {
                warn!(
                    request_id = %request_context.request_id,
                    model = %outcome.model,
                    "dialog turn answered with fallback envelope"
                );
            }
            let response: DialogTurnResponse = outcome.envelope;
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => dialog_error_response(&request_context.request_id, err),
    }
}

fn dialog_error_response(request_id: &str, err: DialogError) -> Response {
    warn!(request_id = %request_id, "dialog turn failed: {err}");
    match err {
        DialogError::EmptyHistory => bad_request_response(NO_MESSAGES_MESSAGE),
        DialogError::InvalidImage { index, .. } => {
            bad_request_response(&format!("Ungültiges Bild in Nachricht {}.", index + 1))
        }
        DialogError::EmptyResponse => internal_error_response(EMPTY_RESPONSE_MESSAGE),
        DialogError::Gateway(LlmGatewayError::ProviderStatus { status, .. }) => {
            error_response(upstream_status(status), UPSTREAM_ERROR_MESSAGE)
        }
        DialogError::Gateway(LlmGatewayError::Timeout | LlmGatewayError::Transport(_)) => {
            error_response(StatusCode::BAD_GATEWAY, UPSTREAM_ERROR_MESSAGE)
        }
        DialogError::Gateway(LlmGatewayError::InvalidProviderPayload(_)) => {
            internal_error_response(INTERNAL_ERROR_MESSAGE)
        }
    }
}
