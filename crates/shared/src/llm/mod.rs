pub mod contracts;
pub mod dialog;
pub mod fallback;
pub mod gateway;
pub mod observability;
pub mod openai;
pub mod prompts;
pub mod synthesis;
pub mod validation;

pub use contracts::{DialogEnvelope, EnvelopeChecklist, LlmOperation, envelope_schema};
pub use dialog::{DialogError, DialogTurnOutcome, run_dialog_turn, validate_dialog_history};
pub use fallback::{
    EnvelopeResolution, EnvelopeSource, FALLBACK_REPLY_PREFIX, fallback_envelope,
    resolve_dialog_envelope,
};
pub use gateway::{
    LlmGateway, LlmGatewayError, LlmGatewayFuture, LlmGatewayRequest, LlmGatewayResponse,
    LlmTokenUsage,
};
pub use observability::{LlmTelemetryEvent, generate_with_telemetry};
pub use openai::{OpenAiConfigError, OpenAiGateway, OpenAiGatewayConfig};
pub use prompts::{PromptTemplate, ResponseFormat, template_for_operation};
pub use synthesis::{SynthesisError, synthesize_instruction};
pub use validation::{EnvelopeError, validate_envelope_json, validate_envelope_value};
