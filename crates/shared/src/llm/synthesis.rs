use thiserror::Error;

use super::contracts::LlmOperation;
use super::gateway::{LlmGateway, LlmGatewayError, LlmGatewayRequest};
use super::observability::generate_with_telemetry;
use super::prompts::template_for_operation;
use crate::models::Turn;

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("no chat history supplied")]
    EmptyHistory,
    #[error(transparent)]
    Gateway(#[from] LlmGatewayError),
}

/// Distills the conversation into one instruction text. Images are not
/// forwarded. An empty string is a valid (if unusable) result.
pub async fn synthesize_instruction(
    llm_gateway: &dyn LlmGateway,
    chat: &[Turn],
) -> Result<String, SynthesisError> {
    if chat.is_empty() {
        return Err(SynthesisError::EmptyHistory);
    }

    let messages = chat.iter().map(Turn::without_image).collect();
    let request = LlmGatewayRequest::from_template(
        template_for_operation(LlmOperation::InstructionSynthesis),
        messages,
    );
    let (result, telemetry) = generate_with_telemetry(llm_gateway, request).await;
    telemetry.emit();

    Ok(result?.content.unwrap_or_default())
}
