use jsonschema::JSONSchema;
use serde_json::Value;
use std::sync::LazyLock;
use thiserror::Error;

use super::contracts::{DialogEnvelope, envelope_schema};

#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("dialog output is not valid json: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("dialog envelope schema failed to compile: {0}")]
    SchemaCompile(String),
    #[error("dialog output failed schema validation: {errors:?}")]
    SchemaViolation { errors: Vec<String> },
}

pub fn validate_envelope_json(raw_json: &str) -> Result<DialogEnvelope, EnvelopeError> {
    let payload: Value = serde_json::from_str(raw_json.trim())?;
    validate_envelope_value(&payload)
}

pub fn validate_envelope_value(payload: &Value) -> Result<DialogEnvelope, EnvelopeError> {
    let validator = ENVELOPE_VALIDATOR
        .as_ref()
        .map_err(|message| EnvelopeError::SchemaCompile(message.clone()))?;

    if let Err(validation_errors) = validator.validate(payload) {
        let errors = validation_errors
            .map(|err| err.to_string())
            .collect::<Vec<_>>();
        return Err(EnvelopeError::SchemaViolation { errors });
    }

    Ok(serde_json::from_value(payload.clone())?)
}

static ENVELOPE_VALIDATOR: LazyLock<Result<JSONSchema, String>> =
    LazyLock::new(|| JSONSchema::compile(&envelope_schema()).map_err(|err| err.to_string()));

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{EnvelopeError, validate_envelope_json, validate_envelope_value};

    #[test]
    fn accepts_complete_envelope() {
        let envelope = validate_envelope_value(&json!({
            "reply": "Für welche Klassenstufe ist der Unterricht gedacht?",
            "checklist": {
                "thema": true,
                "zielgruppe": false,
                "rolleKi": false,
                "ausgabeformat": false,
                "lerneffekt": false
            }
        }))
        .expect("complete envelope should validate");

        assert!(envelope.checklist.thema);
        assert_eq!(envelope.checklist.material, None);
    }

    #[test]
    fn accepts_reported_material_key() {
        let envelope = validate_envelope_json(
            r#"{"reply":"Ok","checklist":{"thema":true,"zielgruppe":true,"rolleKi":true,
                "ausgabeformat":true,"lerneffekt":true,"material":true}}"#,
        )
        .expect("material is an allowed key");
        assert_eq!(envelope.checklist.material, Some(true));
    }

    #[test]
    fn rejects_non_json_text() {
        let err = validate_envelope_json("Welche Klasse unterrichtest du?")
            .expect_err("plain text is not an envelope");
        assert!(matches!(err, EnvelopeError::InvalidJson(_)), "got {err:?}");
    }

    #[test]
    fn rejects_missing_checklist_key() {
        let err = validate_envelope_value(&json!({
            "reply": "Welche Rolle soll die KI haben?",
            "checklist": {
                "thema": true,
                "zielgruppe": true,
                "ausgabeformat": false,
                "lerneffekt": false
            }
        }))
        .expect_err("rolleKi is required");
        assert!(
            matches!(err, EnvelopeError::SchemaViolation { .. }),
            "got {err:?}"
        );
    }

    #[test]
    fn rejects_non_boolean_flags() {
        let err = validate_envelope_value(&json!({
            "reply": "Weiter?",
            "checklist": {
                "thema": "yes",
                "zielgruppe": true,
                "rolleKi": true,
                "ausgabeformat": true,
                "lerneffekt": true
            }
        }))
        .expect_err("flags must be booleans");
        assert!(
            matches!(err, EnvelopeError::SchemaViolation { .. }),
            "got {err:?}"
        );
    }

    #[test]
    fn rejects_missing_reply() {
        let err = validate_envelope_value(&json!({
            "checklist": {
                "thema": true,
                "zielgruppe": true,
                "rolleKi": true,
                "ausgabeformat": true,
                "lerneffekt": true
            }
        }))
        .expect_err("reply is required");
        assert!(
            matches!(err, EnvelopeError::SchemaViolation { .. }),
            "got {err:?}"
        );
    }
}
