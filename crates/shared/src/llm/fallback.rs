use super::contracts::{DialogEnvelope, EnvelopeChecklist};
use super::validation::{EnvelopeError, validate_envelope_json};

pub const FALLBACK_REPLY_PREFIX: &str = "Es gab einen Fehler beim Verarbeiten der Antwort. ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeSource {
    ModelOutput,
    Fallback,
}

impl EnvelopeSource {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ModelOutput => "model_output",
            Self::Fallback => "fallback",
        }
    }
}

#[derive(Debug)]
pub struct EnvelopeResolution {
    pub envelope: DialogEnvelope,
    pub source: EnvelopeSource,
    pub rejection: Option<EnvelopeError>,
}

/// Resolves raw model text to an envelope. Anything that is not a valid
/// envelope becomes the fallback envelope instead of an error.
pub fn resolve_dialog_envelope(raw_output: &str) -> EnvelopeResolution {
    match validate_envelope_json(raw_output) {
        Ok(envelope) => EnvelopeResolution {
            envelope,
            source: EnvelopeSource::ModelOutput,
            rejection: None,
        },
        Err(err) => EnvelopeResolution {
            envelope: fallback_envelope(raw_output),
            source: EnvelopeSource::Fallback,
            rejection: Some(err),
        },
    }
}

pub fn fallback_envelope(raw_output: &str) -> DialogEnvelope {
    DialogEnvelope {
        reply: format!("{FALLBACK_REPLY_PREFIX}{raw_output}"),
        checklist: EnvelopeChecklist::default(),
    }
}
