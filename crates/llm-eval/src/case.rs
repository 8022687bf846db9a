use serde::Deserialize;
use shared::models::Turn;

#[derive(Debug, Clone, Deserialize)]
pub struct EvalCaseFixture {
    pub case_id: String,
    pub description: String,
    pub kind: EvalCaseKind,
    #[serde(default)]
    pub include_in_live_smoke: bool,
    pub turns: Vec<Turn>,
    /// Raw assistant content the canned gateway hands back in mocked mode.
    /// `null` simulates a provider that sent no content.
    #[serde(default)]
    pub mocked_model_output: Option<String>,
    #[serde(default)]
    pub expectations: EvalExpectations,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EvalCaseKind {
    Dialog,
    Instruction,
}

impl EvalCaseKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dialog => "dialog",
            Self::Instruction => "instruction",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EvalExpectations {
    #[serde(default)]
    pub envelope_source: Option<ExpectedEnvelopeSource>,
    /// Checklist wire names that must be reported as `true`.
    #[serde(default)]
    pub checklist_true: Vec<String>,
    /// Checklist wire names that must be reported as `false`.
    #[serde(default)]
    pub checklist_false: Vec<String>,
    #[serde(default)]
    pub quality: QualityExpectations,
    /// Issue codes the quality checks are expected to raise. Anything else
    /// raised is a failure.
    #[serde(default)]
    pub expected_issues: Vec<String>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExpectedEnvelopeSource {
    ModelOutput,
    Fallback,
}

impl ExpectedEnvelopeSource {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ModelOutput => "model_output",
            Self::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Default)]
pub struct QualityExpectations {
    #[serde(default)]
    pub single_question: bool,
    #[serde(default)]
    pub no_meta_commentary: bool,
    #[serde(default)]
    pub non_empty: bool,
}
