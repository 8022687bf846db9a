use serde::{Deserialize, Serialize};

use crate::llm::contracts::DialogEnvelope;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One message of the planning conversation.
///
/// `image_base64` carries at most one inline image as a `data:` URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Turn {
    pub role: Role,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            image_base64: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            image_base64: None,
        }
    }

    pub fn with_image(mut self, data_uri: impl Into<String>) -> Self {
        self.image_base64 = Some(data_uri.into());
        self
    }

    pub(crate) fn without_image(&self) -> Self {
        Self {
            role: self.role,
            content: self.content.clone(),
            image_base64: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChecklistKey {
    Thema,
    Zielgruppe,
    RolleKi,
    Ausgabeformat,
    Lerneffekt,
    Material,
}

impl ChecklistKey {
    pub const ALL: [Self; 6] = [
        Self::Thema,
        Self::Zielgruppe,
        Self::RolleKi,
        Self::Ausgabeformat,
        Self::Lerneffekt,
        Self::Material,
    ];

    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::Thema => "thema",
            Self::Zielgruppe => "zielgruppe",
            Self::RolleKi => "rolleKi",
            Self::Ausgabeformat => "ausgabeformat",
            Self::Lerneffekt => "lerneffekt",
            Self::Material => "material",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Thema => "Thema / Aufgabe",
            Self::Zielgruppe => "Zielgruppe (Klasse)",
            Self::RolleKi => "Rolle der KI",
            Self::Ausgabeformat => "Ausgabeformat",
            Self::Lerneffekt => "Gewünschter Lerneffekt",
            Self::Material => "Unterrichtsmaterialien",
        }
    }

    pub fn from_wire_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.wire_name() == name)
    }
}

/// Planning criteria tracked across the conversation. Always holds every key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checklist {
    pub thema: bool,
    pub zielgruppe: bool,
    pub rolle_ki: bool,
    pub ausgabeformat: bool,
    pub lerneffekt: bool,
    pub material: bool,
}

impl Checklist {
    pub const fn get(&self, key: ChecklistKey) -> bool {
        match key {
            ChecklistKey::Thema => self.thema,
            ChecklistKey::Zielgruppe => self.zielgruppe,
            ChecklistKey::RolleKi => self.rolle_ki,
            ChecklistKey::Ausgabeformat => self.ausgabeformat,
            ChecklistKey::Lerneffekt => self.lerneffekt,
            ChecklistKey::Material => self.material,
        }
    }

    pub fn set(&mut self, key: ChecklistKey, value: bool) {
        let slot = match key {
            ChecklistKey::Thema => &mut self.thema,
            ChecklistKey::Zielgruppe => &mut self.zielgruppe,
            ChecklistKey::RolleKi => &mut self.rolle_ki,
            ChecklistKey::Ausgabeformat => &mut self.ausgabeformat,
            ChecklistKey::Lerneffekt => &mut self.lerneffekt,
            ChecklistKey::Material => &mut self.material,
        };
        *slot = value;
    }

    /// Shallow overwrite: keys present in `update` replace the current value,
    /// absent keys keep theirs. A `true` can be overwritten with `false`.
    pub fn merge(&mut self, update: &ChecklistUpdate) {
        for key in ChecklistKey::ALL {
            if let Some(value) = update.get(key) {
                self.set(key, value);
            }
        }
    }

    pub fn checked_count(&self) -> usize {
        ChecklistKey::ALL
            .into_iter()
            .filter(|key| self.get(*key))
            .count()
    }
}

/// Partial checklist as reported by one dialog response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thema: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zielgruppe: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rolle_ki: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ausgabeformat: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lerneffekt: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<bool>,
}

impl ChecklistUpdate {
    pub const fn get(&self, key: ChecklistKey) -> Option<bool> {
        match key {
            ChecklistKey::Thema => self.thema,
            ChecklistKey::Zielgruppe => self.zielgruppe,
            ChecklistKey::RolleKi => self.rolle_ki,
            ChecklistKey::Ausgabeformat => self.ausgabeformat,
            ChecklistKey::Lerneffekt => self.lerneffekt,
            ChecklistKey::Material => self.material,
        }
    }

    pub fn with(mut self, key: ChecklistKey, value: bool) -> Self {
        let slot = match key {
            ChecklistKey::Thema => &mut self.thema,
            ChecklistKey::Zielgruppe => &mut self.zielgruppe,
            ChecklistKey::RolleKi => &mut self.rolle_ki,
            ChecklistKey::Ausgabeformat => &mut self.ausgabeformat,
            ChecklistKey::Lerneffekt => &mut self.lerneffekt,
            ChecklistKey::Material => &mut self.material,
        };
        *slot = Some(value);
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DialogTurnRequest {
    #[serde(default)]
    pub messages: Option<Vec<Turn>>,
}

pub type DialogTurnResponse = DialogEnvelope;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateInstructionRequest {
    #[serde(default)]
    pub chat: Option<Vec<Turn>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateInstructionResponse {
    pub result: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub llm_configured: bool,
}
