use schemars::{JsonSchema, schema_for};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{ChecklistKey, ChecklistUpdate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmOperation {
    DialogTurn,
    InstructionSynthesis,
}

impl LlmOperation {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DialogTurn => "dialog_turn",
            Self::InstructionSynthesis => "instruction_synthesis",
        }
    }
}

/// The two-field object every dialog turn resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DialogEnvelope {
    pub reply: String,
    pub checklist: EnvelopeChecklist,
}

/// Checklist as reported by the model. The five planning keys are required;
/// `material` is only present when the model reports it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeChecklist {
    pub thema: bool,
    pub zielgruppe: bool,
    pub rolle_ki: bool,
    pub ausgabeformat: bool,
    pub lerneffekt: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<bool>,
}

impl EnvelopeChecklist {
    pub fn to_update(&self) -> ChecklistUpdate {
        let mut update = ChecklistUpdate::default()
            .with(ChecklistKey::Thema, self.thema)
            .with(ChecklistKey::Zielgruppe, self.zielgruppe)
            .with(ChecklistKey::RolleKi, self.rolle_ki)
            .with(ChecklistKey::Ausgabeformat, self.ausgabeformat)
            .with(ChecklistKey::Lerneffekt, self.lerneffekt);
        if let Some(material) = self.material {
            update = update.with(ChecklistKey::Material, material);
        }
        update
    }

    pub fn true_count(&self) -> usize {
        [
            self.thema,
            self.zielgruppe,
            self.rolle_ki,
            self.ausgabeformat,
            self.lerneffekt,
            self.material.unwrap_or(false),
        ]
        .into_iter()
        .filter(|checked| *checked)
        .count()
    }
}

pub fn envelope_schema() -> Value {
    serde_json::to_value(schema_for!(DialogEnvelope))
        .expect("dialog envelope schema should be serializable")
}
