use serde::{Deserialize, Serialize};

use crate::llm::contracts::DialogEnvelope;
use crate::models::{Checklist, ChecklistUpdate, Role, Turn};

pub const GREETING: &str = "Hallo! Beschreibe, was die KI in deinem Unterricht tun soll, oder fülle die Felder oben aus, um den Prozess zu beschleunigen.";
pub const GENERATION_THRESHOLD: usize = 4;
/// Greeting plus at most one user turn.
const LATE_CONTEXT_MAX_TURNS: usize = 2;

const CONTEXT_HEADER: &str = "Hier sind einige strukturierte Informationen zum Unterrichtskontext:";

/// Optional lesson context entered up front.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredContext {
    #[serde(default)]
    pub klassenstufe: Option<String>,
    #[serde(default)]
    pub fach: Option<String>,
    #[serde(default)]
    pub lernziel: Option<String>,
    #[serde(default)]
    pub dauer: Option<String>,
}

impl StructuredContext {
    fn labelled_fields(&self) -> [(&'static str, Option<&str>); 4] {
        [
            ("Klassenstufe", present(&self.klassenstufe)),
            ("Fach", present(&self.fach)),
            ("Lernziel", present(&self.lernziel)),
            ("Dauer der Aktivität", present(&self.dauer)),
        ]
    }

    pub fn is_empty(&self) -> bool {
        self.labelled_fields()
            .iter()
            .all(|(_, value)| value.is_none())
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Renders the context as one synthetic user turn, or nothing when every
/// field is blank.
pub fn context_turn(context: &StructuredContext) -> Option<Turn> {
    if context.is_empty() {
        return None;
    }

    let mut content = format!("{CONTEXT_HEADER}\n");
    for (label, value) in context.labelled_fields() {
        if let Some(value) = value {
            content.push_str(&format!("- {label}: {value}\n"));
        }
    }

    Some(Turn::user(content))
}

/// Composer prefix for text extracted from an uploaded document.
pub fn prepend_document_text(file_name: &str, extracted_text: &str, composer: &str) -> String {
    format!(
        "INHALT AUS PDF \"{file_name}\":\n\n{}\n\n---\n\n{composer}",
        extracted_text.trim()
    )
}

/// Client-held state of one planning conversation.
///
/// Turns are append-only. The structured context reaches the history at most
/// once, directly before the first user turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationStore {
    turns: Vec<Turn>,
    checklist: Checklist,
    context: StructuredContext,
    context_injected: bool,
    generation_result: Option<String>,
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationStore {
    pub fn new() -> Self {
        Self {
            turns: vec![Turn::assistant(GREETING)],
            checklist: Checklist::default(),
            context: StructuredContext::default(),
            context_injected: false,
            generation_result: None,
        }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn checklist(&self) -> &Checklist {
        &self.checklist
    }

    pub fn context(&self) -> &StructuredContext {
        &self.context
    }

    pub fn context_injected(&self) -> bool {
        self.context_injected
    }

    pub fn generation_result(&self) -> Option<&str> {
        self.generation_result.as_deref()
    }

    pub fn set_context(&mut self, context: StructuredContext) {
        self.context = context;
    }

    pub fn append_turn(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn merge_checklist(&mut self, update: &ChecklistUpdate) {
        self.checklist.merge(update);
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Appends a user turn, preceded by the context turn on the first user
    /// submission. Returns the history to send, or `None` when there is
    /// neither text nor an image.
    pub fn begin_user_turn(&mut self, content: &str, image: Option<String>) -> Option<&[Turn]> {
        if content.trim().is_empty() && image.is_none() {
            return None;
        }

        if !self.has_user_turn()
            && !self.context_injected
            && let Some(turn) = context_turn(&self.context)
        {
            self.turns.push(turn);
            self.context_injected = true;
        }

        self.turns.push(Turn {
            role: Role::User,
            content: content.to_string(),
            image_base64: image,
        });

        Some(&self.turns)
    }

    pub fn apply_dialog_envelope(&mut self, envelope: &DialogEnvelope) {
        self.turns.push(Turn::assistant(envelope.reply.clone()));
        self.checklist.merge(&envelope.checklist.to_update());
    }

    /// History for instruction synthesis. Context that never made it into
    /// the conversation is placed right after the greeting, but only while
    /// no reply has been received yet. The stored turns are left untouched.
    pub fn history_for_synthesis(&self) -> Vec<Turn> {
        let mut history = self.turns.clone();
        if !self.context_injected
            && history.len() <= LATE_CONTEXT_MAX_TURNS
            && let Some(turn) = context_turn(&self.context)
        {
            let index = history.len().min(1);
            history.insert(index, turn);
        }
        history
    }

    pub fn checked_count(&self) -> usize {
        self.checklist.checked_count()
    }

    pub fn generation_enabled(&self) -> bool {
        self.checked_count() >= GENERATION_THRESHOLD
    }

    /// Stores a synthesis result. Empty text is not a usable result and
    /// clears any previous one.
    pub fn set_generation_result(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.generation_result = if text.trim().is_empty() {
            None
        } else {
            Some(text)
        };
    }

    pub fn edit_generation_result(&mut self, text: impl Into<String>) {
        self.generation_result = Some(text.into());
    }

    fn has_user_turn(&self) -> bool {
        self.turns.iter().any(|turn| turn.role == Role::User)
    }
}
