use thiserror::Error;
use tracing::warn;

use super::contracts::{DialogEnvelope, LlmOperation};
use super::fallback::{EnvelopeSource, resolve_dialog_envelope};
use super::gateway::{LlmGateway, LlmGatewayError, LlmGatewayRequest};
use super::observability::generate_with_telemetry;
use super::prompts::template_for_operation;
use crate::inline_image::{InlineImageError, parse_image_data_uri};
use crate::models::Turn;

#[derive(Debug, Error)]
pub enum DialogError {
    #[error("no messages supplied")]
    EmptyHistory,
    #[error("message {index} carries an invalid inline image: {source}")]
    InvalidImage {
        index: usize,
        #[source]
        source: InlineImageError,
    },
    #[error("llm provider returned an empty response")]
    EmptyResponse,
    #[error(transparent)]
    Gateway(#[from] LlmGatewayError),
}

#[derive(Debug, Clone)]
pub struct DialogTurnOutcome {
    pub envelope: DialogEnvelope,
    pub source: EnvelopeSource,
    pub model: String,
}

pub fn validate_dialog_history(messages: &[Turn]) -> Result<(), DialogError> {
    if messages.is_empty() {
        return Err(DialogError::EmptyHistory);
    }

    for (index, turn) in messages.iter().enumerate() {
        if let Some(image) = turn.image_base64.as_deref() {
            parse_image_data_uri(image)
                .map_err(|source| DialogError::InvalidImage { index, source })?;
        }
    }

    Ok(())
}

/// Asks the model for the next clarifying question and a recomputed
/// checklist. Unusable model output resolves to the fallback envelope.
pub async fn run_dialog_turn(
    llm_gateway: &dyn LlmGateway,
    messages: Vec<Turn>,
) -> Result<DialogTurnOutcome, DialogError> {
    validate_dialog_history(&messages)?;

    let request = LlmGatewayRequest::from_template(
        template_for_operation(LlmOperation::DialogTurn),
        messages,
    );
    let (result, telemetry) = generate_with_telemetry(llm_gateway, request).await;
    telemetry.emit();
    let response = result?;

    let content = response
        .content
        .filter(|content| !content.is_empty())
        .ok_or(DialogError::EmptyResponse)?;

    let resolution = resolve_dialog_envelope(&content);
    if let Some(rejection) = resolution.rejection.as_ref() {
        warn!(
            model = %response.model,
            error = %rejection,
            content_len = content.len(),
            "dialog output did not match envelope; returning fallback envelope"
        );
    }

    Ok(DialogTurnOutcome {
        envelope: resolution.envelope,
        source: resolution.source,
        model: response.model,
    })
}

#[cfg(test)]
mod tests {
    use super::{DialogError, validate_dialog_history};
    use crate::inline_image::InlineImageError;
    use crate::models::Turn;

    #[test]
    fn empty_history_is_rejected() {
        assert!(matches!(
            validate_dialog_history(&[]),
            Err(DialogError::EmptyHistory)
        ));
    }

    #[test]
    fn invalid_image_reports_turn_index() {
        let messages = vec![
            Turn::assistant("Hallo!"),
            Turn::user("Bild").with_image("not-a-data-uri"),
        ];
        let err = validate_dialog_history(&messages).expect_err("image is malformed");
        assert!(matches!(
            err,
            DialogError::InvalidImage {
                index: 1,
                source: InlineImageError::NotADataUri
            }
        ));
    }
}
