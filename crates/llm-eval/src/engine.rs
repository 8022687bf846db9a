use shared::llm::{
    DialogTurnOutcome, EnvelopeSource, LlmGateway, LlmGatewayFuture, LlmGatewayRequest,
    LlmGatewayResponse, OpenAiConfigError, OpenAiGateway, OpenAiGatewayConfig, run_dialog_turn,
    synthesize_instruction,
};
use shared::models::{ChecklistKey, ChecklistUpdate};
use thiserror::Error;
use tracing::debug;

use crate::case::{EvalCaseFixture, EvalCaseKind, EvalExpectations};
use crate::cli::{CliOptions, EvalMode};
use crate::fixture_io::{FixtureIoError, load_cases};
use crate::quality::{QualityIssue, evaluate_dialog_reply, evaluate_instruction};

const MOCKED_MODEL: &str = "mocked-model";

#[derive(Debug)]
pub struct EvalSummary {
    mode: EvalMode,
    results: Vec<CaseResult>,
}

impl EvalSummary {
    pub fn has_failures(&self) -> bool {
        self.results
            .iter()
            .any(|result| !result.failures.is_empty())
    }

    pub fn print(&self) {
        println!("LLM Eval Harness ({})", self.mode.as_str());

        let mut passed = 0usize;
        for result in &self.results {
            if result.failures.is_empty() {
                passed += 1;
                println!(
                    "[PASS] {} ({}): {}",
                    result.case_id,
                    result.kind.as_str(),
                    result.description
                );
            } else {
                println!(
                    "[FAIL] {} ({}): {}",
                    result.case_id,
                    result.kind.as_str(),
                    result.description
                );
                for failure in &result.failures {
                    println!("  - {failure}");
                }
            }

            for note in &result.notes {
                println!("  * {note}");
            }
        }

        let total = self.results.len();
        let failed = total.saturating_sub(passed);
        println!(
            "Summary: {} total, {} passed, {} failed",
            total, passed, failed
        );
    }
}

#[derive(Debug)]
struct CaseResult {
    case_id: String,
    description: String,
    kind: EvalCaseKind,
    failures: Vec<String>,
    notes: Vec<String>,
}

#[derive(Debug, Error)]
pub enum EvalError {
    #[error(transparent)]
    Fixtures(#[from] FixtureIoError),
    #[error("failed to initialize OpenAI in live mode: {0}")]
    OpenAiConfig(#[from] OpenAiConfigError),
    #[error("live mode requires at least one fixture with include_in_live_smoke=true")]
    NoLiveCases,
    #[error("no fixture matches case id {0}")]
    UnknownCase(String),
}

/// Hands back a fixed assistant content so fixtures run through the real
/// dialog and synthesis logic without a provider.
struct CannedGateway {
    content: Option<String>,
}

impl LlmGateway for CannedGateway {
    fn generate<'a>(&'a self, _request: LlmGatewayRequest) -> LlmGatewayFuture<'a> {
        Box::pin(async move {
            Ok(LlmGatewayResponse {
                model: MOCKED_MODEL.to_string(),
                provider_request_id: None,
                content: self.content.clone(),
                usage: None,
            })
        })
    }
}

pub async fn run_eval(options: &CliOptions) -> Result<EvalSummary, EvalError> {
    let cases = select_cases(load_cases()?, options)?;

    let live_gateway = if options.mode == EvalMode::Live {
        Some(OpenAiGateway::new(OpenAiGatewayConfig::from_env()?)?)
    } else {
        None
    };

    let mut results = Vec::with_capacity(cases.len());
    for case in &cases {
        let result = match live_gateway.as_ref() {
            Some(gateway) => run_case(case, gateway, options.mode).await,
            None => {
                let canned = CannedGateway {
                    content: case.mocked_model_output.clone(),
                };
                run_case(case, &canned, options.mode).await
            }
        };
        results.push(result);
    }

    Ok(EvalSummary {
        mode: options.mode,
        results,
    })
}

fn select_cases(
    mut cases: Vec<EvalCaseFixture>,
    options: &CliOptions,
) -> Result<Vec<EvalCaseFixture>, EvalError> {
    cases.sort_by(|left, right| left.case_id.cmp(&right.case_id));

    if let Some(case_id) = options.case_filter.as_deref() {
        cases.retain(|case| case.case_id == case_id);
        if cases.is_empty() {
            return Err(EvalError::UnknownCase(case_id.to_string()));
        }
    }

    if options.mode == EvalMode::Live {
        cases.retain(|case| case.include_in_live_smoke);
        if cases.is_empty() {
            return Err(EvalError::NoLiveCases);
        }
    }

    Ok(cases)
}

async fn run_case(
    case: &EvalCaseFixture,
    gateway: &dyn LlmGateway,
    mode: EvalMode,
) -> CaseResult {
    let mut failures = Vec::new();
    let mut notes = Vec::new();
    debug!(case_id = %case.case_id, kind = case.kind.as_str(), "running eval case");

    let issues = match case.kind {
        EvalCaseKind::Dialog => match run_dialog_turn(gateway, case.turns.clone()).await {
            Ok(outcome) => {
                check_dialog_outcome(&outcome, &case.expectations, mode, &mut failures);
                notes.push(format!("reply: {}", outcome.envelope.reply));
                evaluate_dialog_reply(&outcome.envelope.reply, &case.expectations.quality)
            }
            Err(err) => {
                failures.push(format!("dialog_turn: {err}"));
                Vec::new()
            }
        },
        EvalCaseKind::Instruction => match synthesize_instruction(gateway, &case.turns).await {
            Ok(text) => {
                notes.push(format!("instruction length: {} chars", text.chars().count()));
                evaluate_instruction(&text, &case.expectations.quality)
            }
            Err(err) => {
                failures.push(format!("instruction_synthesis: {err}"));
                Vec::new()
            }
        },
    };

    compare_issues(&issues, &case.expectations.expected_issues, &mut failures);

    CaseResult {
        case_id: case.case_id.clone(),
        description: case.description.clone(),
        kind: case.kind,
        failures,
        notes,
    }
}

fn check_dialog_outcome(
    outcome: &DialogTurnOutcome,
    expectations: &EvalExpectations,
    mode: EvalMode,
    failures: &mut Vec<String>,
) {
    let actual_source = outcome.source.as_str();
    match expectations.envelope_source {
        Some(expected) if expected.as_str() != actual_source => failures.push(format!(
            "envelope_source: expected={}, actual={actual_source}",
            expected.as_str()
        )),
        None if mode == EvalMode::Live && outcome.source != EnvelopeSource::ModelOutput => {
            failures.push(format!(
                "envelope_source: live smoke requires model_output, got {actual_source}"
            ));
        }
        _ => {}
    }

    let reported = outcome.envelope.checklist.to_update();
    check_keys(&reported, &expectations.checklist_true, true, failures);
    check_keys(&reported, &expectations.checklist_false, false, failures);
}

fn check_keys(
    reported: &ChecklistUpdate,
    wire_names: &[String],
    expected: bool,
    failures: &mut Vec<String>,
) {
    for wire_name in wire_names {
        let Some(key) = ChecklistKey::from_wire_name(wire_name) else {
            failures.push(format!("checklist: unknown key {wire_name} in fixture"));
            continue;
        };
        let actual = reported.get(key).unwrap_or(false);
        if actual != expected {
            failures.push(format!(
                "checklist.{wire_name} ({}): expected={expected}, actual={actual}",
                key.label()
            ));
        }
    }
}

fn compare_issues(actual: &[QualityIssue], expected_codes: &[String], failures: &mut Vec<String>) {
    for issue in actual {
        if !expected_codes.iter().any(|code| code.as_str() == issue.code) {
            failures.push(format!("quality.{}: {}", issue.code, issue.detail));
        }
    }
    for code in expected_codes {
        if !actual.iter().any(|issue| issue.code == code.as_str()) {
            failures.push(format!("quality.{code}: expected issue was not raised"));
        }
    }
}
