use std::time::{Duration, Instant};

use tracing::{info, warn};

use super::gateway::{LlmGateway, LlmGatewayError, LlmGatewayRequest, LlmGatewayResponse};

#[derive(Debug, Clone)]
pub struct LlmTelemetryEvent {
    pub operation: &'static str,
    pub outcome: &'static str,
    pub latency_ms: u64,
    pub model: Option<String>,
    pub provider_request_id: Option<String>,
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
    pub total_tokens: Option<u32>,
    pub error_type: Option<&'static str>,
}

impl LlmTelemetryEvent {
    pub fn emit(&self) {
        if self.outcome == "success" {
            info!(
                operation = self.operation,
                outcome = self.outcome,
                latency_ms = self.latency_ms,
                model = self.model.as_deref().unwrap_or("unknown"),
                provider_request_id = self.provider_request_id.as_deref().unwrap_or("none"),
                prompt_tokens = self.prompt_tokens.unwrap_or(0),
                completion_tokens = self.completion_tokens.unwrap_or(0),
                total_tokens = self.total_tokens.unwrap_or(0),
                metric_name = "llm_request",
                "llm request metrics"
            );
        } else {
            warn!(
                operation = self.operation,
                outcome = self.outcome,
                latency_ms = self.latency_ms,
                error_type = self.error_type.unwrap_or("unknown"),
                metric_name = "llm_request",
                "llm request failed"
            );
        }
    }
}

pub async fn generate_with_telemetry(
    llm_gateway: &dyn LlmGateway,
    request: LlmGatewayRequest,
) -> (
    Result<LlmGatewayResponse, LlmGatewayError>,
    LlmTelemetryEvent,
) {
    let operation = request.operation.as_str();
    let started_at = Instant::now();
    let result = llm_gateway.generate(request).await;
    let telemetry = telemetry_for_result(operation, started_at.elapsed(), &result);
    (result, telemetry)
}

fn telemetry_for_result(
    operation: &'static str,
    latency: Duration,
    result: &Result<LlmGatewayResponse, LlmGatewayError>,
) -> LlmTelemetryEvent {
    let latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
    match result {
        Ok(response) => {
            let usage = response.usage.as_ref();
            LlmTelemetryEvent {
                operation,
                outcome: "success",
                latency_ms,
                model: Some(response.model.clone()),
                provider_request_id: response.provider_request_id.clone(),
                prompt_tokens: usage.map(|usage| usage.prompt_tokens),
                completion_tokens: usage.map(|usage| usage.completion_tokens),
                total_tokens: usage.map(|usage| usage.total_tokens),
                error_type: None,
            }
        }
        Err(err) => LlmTelemetryEvent {
            operation,
            outcome: "failure",
            latency_ms,
            model: None,
            provider_request_id: None,
            prompt_tokens: None,
            completion_tokens: None,
            total_tokens: None,
            error_type: Some(err.kind()),
        },
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::telemetry_for_result;
    use crate::llm::gateway::{LlmGatewayError, LlmGatewayResponse, LlmTokenUsage};

    #[test]
    fn success_event_carries_usage() {
        let result = Ok(LlmGatewayResponse {
            model: "gpt-4o".to_string(),
            provider_request_id: Some("req-1".to_string()),
            content: Some("{}".to_string()),
            usage: Some(LlmTokenUsage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
        });

        let event = telemetry_for_result("dialog_turn", Duration::from_millis(42), &result);
        assert_eq!(event.outcome, "success");
        assert_eq!(event.latency_ms, 42);
        assert_eq!(event.total_tokens, Some(15));
        assert_eq!(event.error_type, None);
    }

    #[test]
    fn failure_event_records_error_kind() {
        let result = Err(LlmGatewayError::ProviderStatus {
            status: 429,
            message: None,
        });

        let event = telemetry_for_result("instruction_synthesis", Duration::ZERO, &result);
        assert_eq!(event.outcome, "failure");
        assert_eq!(event.error_type, Some("provider_status"));
        assert_eq!(event.model, None);
    }
}
