use std::sync::Arc;

use axum::body::{Body, Bytes, to_bytes};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Router, middleware};
use shared::llm::LlmGateway;

mod dialog;
mod errors;
mod health;
mod instruction;
mod observability;

use errors::error_response;

#[derive(Clone)]
pub struct AppState {
    /// `None` when no upstream credential is configured. Both LLM endpoints
    /// then answer 500 instead of the process refusing to start.
    pub llm_gateway: Option<Arc<dyn LlmGateway>>,
    pub max_body_bytes: usize,
}

const BODY_TOO_LARGE_MESSAGE: &str = "Request body too large.";

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health::healthz))
        .route("/dialog-turn", post(dialog::dialog_turn))
        .route(
            "/generate-instruction",
            post(instruction::generate_instruction),
        )
        .layer(middleware::from_fn(
            observability::request_observability_middleware,
        ))
        .with_state(app_state)
}

/// Buffers a request body up to `limit` bytes. Runs after the credential
/// check in each handler.
async fn read_body(body: Body, limit: usize) -> Result<Bytes, Response> {
    to_bytes(body, limit)
        .await
        .map_err(|_| error_response(StatusCode::PAYLOAD_TOO_LARGE, BODY_TOO_LARGE_MESSAGE))
}
