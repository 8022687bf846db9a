use crate::case::QualityExpectations;

const META_COMMENTARY_PREFIXES: [&str; 12] = [
    "hier ist",
    "hier sind",
    "gerne",
    "natürlich",
    "selbstverständlich",
    "ich hoffe",
    "viel erfolg",
    "here is",
    "here's",
    "sure",
    "certainly",
    "i hope",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityIssue {
    pub code: &'static str,
    pub detail: String,
}

pub fn evaluate_dialog_reply(reply: &str, expectations: &QualityExpectations) -> Vec<QualityIssue> {
    let mut issues = Vec::new();
    if expectations.non_empty {
        require_non_empty(reply, &mut issues);
    }

    let questions = question_count(reply);
    if expectations.single_question && questions > 1 {
        issues.push(QualityIssue {
            code: "multiple_questions",
            detail: format!("reply asks {questions} questions"),
        });
    }

    issues
}

pub fn evaluate_instruction(text: &str, expectations: &QualityExpectations) -> Vec<QualityIssue> {
    let mut issues = Vec::new();
    if expectations.non_empty {
        require_non_empty(text, &mut issues);
    }

    if expectations.no_meta_commentary {
        for line in meta_commentary_lines(text) {
            issues.push(QualityIssue {
                code: "meta_commentary",
                detail: format!("framing line: {line:?}"),
            });
        }
    }

    issues
}

pub fn question_count(text: &str) -> usize {
    text.chars().filter(|ch| *ch == '?').count()
}

/// Returns the opening or closing line when it reads like the model talking
/// about the instruction instead of being part of it.
pub fn meta_commentary_lines(text: &str) -> Vec<&str> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let mut framing = Vec::new();
    let edges = [lines.first(), lines.last()];
    for line in edges.into_iter().flatten() {
        if is_meta_commentary(line) && !framing.contains(line) {
            framing.push(*line);
        }
    }
    framing
}

fn is_meta_commentary(line: &str) -> bool {
    let lowered = line.to_lowercase();
    META_COMMENTARY_PREFIXES
        .iter()
        .any(|prefix| lowered.starts_with(prefix))
}

fn require_non_empty(text: &str, issues: &mut Vec<QualityIssue>) {
    if text.trim().is_empty() {
        issues.push(QualityIssue {
            code: "empty_text",
            detail: "must be non-empty".to_string(),
        });
    }
}
