use std::time::Instant;

use axum::extract::{MatchedPath, Request};
use axum::http::{HeaderName, HeaderValue, StatusCode, header};
use axum::middleware::Next;
use axum::response::Response;
use tracing::{info, warn};
use uuid::Uuid;

const REQUEST_ID_HEADER: &str = "x-request-id";
const MAX_REQUEST_ID_LEN: usize = 128;
const LLM_ROUTES: [&str; 2] = ["/dialog-turn", "/generate-instruction"];

#[derive(Clone, Debug)]
pub(super) struct RequestContext {
    pub(super) request_id: String,
}

/// How a finished request is reported in the request log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PromptRequestOutcome {
    Answered,
    Rejected,
    UpstreamFailed,
    Failed,
}

impl PromptRequestOutcome {
    fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::TOO_MANY_REQUESTS
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT => Self::UpstreamFailed,
            status if status.is_server_error() => Self::Failed,
            status if status.is_client_error() => Self::Rejected,
            _ => Self::Answered,
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Answered => "answered",
            Self::Rejected => "rejected",
            Self::UpstreamFailed => "upstream_failed",
            Self::Failed => "failed",
        }
    }
}

pub(super) async fn request_observability_middleware(mut req: Request, next: Next) -> Response {
    let request_id = resolve_request_id(&req);
    req.extensions_mut().insert(RequestContext {
        request_id: request_id.clone(),
    });

    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    let llm_route = LLM_ROUTES.contains(&route.as_str());
    let request_bytes = declared_body_len(&req);
    let started_at = Instant::now();

    let mut response = next.run(req).await;
    if let Ok(header_value) = HeaderValue::from_str(&request_id) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), header_value);
    }

    let status = response.status();
    let outcome = PromptRequestOutcome::from_status(status);
    let latency_ms = u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX);
    match outcome {
        PromptRequestOutcome::Answered | PromptRequestOutcome::Rejected => info!(
            request_id = %request_id,
            route = %route,
            llm_route,
            request_bytes,
            status = status.as_u16(),
            outcome = outcome.as_str(),
            latency_ms,
            metric_name = "prompt_api_request",
            "prompt api request finished"
        ),
        PromptRequestOutcome::UpstreamFailed | PromptRequestOutcome::Failed => warn!(
            request_id = %request_id,
            route = %route,
            llm_route,
            request_bytes,
            status = status.as_u16(),
            outcome = outcome.as_str(),
            latency_ms,
            metric_name = "prompt_api_request",
            "prompt api request failed"
        ),
    }

    response
}

/// Size the caller announced, or zero without a usable `content-length`.
fn declared_body_len(req: &Request) -> u64 {
    req.headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok())
        .unwrap_or(0)
}

fn resolve_request_id(req: &Request) -> String {
    req.headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(accept_caller_request_id)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

fn accept_caller_request_id(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.len() > MAX_REQUEST_ID_LEN {
        return None;
    }

    trimmed
        .bytes()
        .all(|byte| byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.'))
        .then(|| trimmed.to_string())
}
