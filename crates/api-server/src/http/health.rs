use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use shared::models::HealthResponse;

use super::AppState;

pub(super) async fn healthz(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            ok: true,
            llm_configured: state.llm_gateway.is_some(),
        }),
    )
}
